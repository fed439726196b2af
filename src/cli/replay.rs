use crate::analysis::AnalysisSwitch;
use crate::cli::utils::write_output;
use crate::error::{Error, Result};
use crate::report::TraceReport;
use crate::tracer::{read_trace_file, Tracer, ViolationPolicy};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Report rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Text,
}

impl std::str::FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "text" => Ok(OutputFormat::Text),
            other => Err(Error::config(format!("unknown output format '{}'", other))),
        }
    }
}

/// Arguments for the replay command
#[derive(Debug, Clone)]
pub struct ReplayArgs {
    pub traces: Vec<PathBuf>,
    pub config: Option<PathBuf>,
    pub overrides: Vec<String>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub strict: bool,
}

/// Replay one trace file through a fresh tracer
pub fn replay_file(path: &Path, switch: AnalysisSwitch, policy: ViolationPolicy) -> Result<TraceReport> {
    let events = read_trace_file(path)?;
    log::info!("Replaying {} events from {}", events.len(), path.display());

    let mut tracer = Tracer::new(switch)
        .with_policy(policy)
        .with_source(path.display().to_string());
    tracer.replay(events)?;
    Ok(tracer.finish())
}

/// Run the replay subcommand
pub fn replay(args: &ReplayArgs) -> Result<()> {
    if args.traces.is_empty() {
        return Err(Error::config("no trace files given"));
    }

    let switch = AnalysisSwitch::from_sources(args.config.as_deref(), &args.overrides)?;
    let policy = if args.strict {
        ViolationPolicy::Abort
    } else {
        ViolationPolicy::DropEvent
    };

    // traces are independent sessions
    let reports = args
        .traces
        .par_iter()
        .map(|path| replay_file(path, switch, policy))
        .collect::<Result<Vec<_>>>()?;

    let rendered = match args.format {
        OutputFormat::Json if reports.len() == 1 => reports[0].to_json()?,
        OutputFormat::Json => serde_json::to_string_pretty(&reports)
            .map_err(|e| Error::internal(e.to_string()))?,
        OutputFormat::Text => reports
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
    };

    write_output(&rendered, args.output.as_deref())
}
