//! JSON Lines trace files

use super::events::TraceEvent;
use crate::error::{Error, Result};
use std::io::BufRead;
use std::path::Path;

/// Parse a trace: one event per line, `#` comments and blank lines skipped
pub fn parse_events(text: &str) -> Result<Vec<TraceEvent>> {
    let mut events = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if let Some(event) = parse_line(index + 1, line)? {
            events.push(event);
        }
    }
    Ok(events)
}

/// Read events from any buffered reader
pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<TraceEvent>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(event) = parse_line(index + 1, &line)? {
            events.push(event);
        }
    }
    Ok(events)
}

pub fn read_trace_file(path: &Path) -> Result<Vec<TraceEvent>> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))?;
    read_events(std::io::BufReader::new(file))
}

fn parse_line(line_number: usize, line: &str) -> Result<Option<TraceEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| Error::parse(line_number, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::BindingHandle;

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let text = "# header\n\n{\"event\":\"value_lookup\",\"binding\":1}\n";
        let events = parse_events(text).unwrap();
        assert_eq!(
            events,
            vec![TraceEvent::ValueLookup {
                binding: BindingHandle(1)
            }]
        );
    }

    #[test]
    fn test_malformed_line_reports_its_number() {
        let text = "{\"event\":\"value_lookup\",\"binding\":1}\n{\"event\":\"nope\"}\n";
        match parse_events(text) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
