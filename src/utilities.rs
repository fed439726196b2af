//! Small helpers shared by the tracer and the reports

use base64::Engine;
use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};
use std::time::Instant;

static ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

/// Monotonic timestamp in nanoseconds since the first call in this process
pub fn timestamp() -> u64 {
    ORIGIN.elapsed().as_nanos() as u64
}

/// Content hash of source text, usable as a file name (`/` is replaced by `#`)
///
/// SHA-256 based, so these hashes never match MD5 expression hashes recorded by
/// other promise tracers.
pub fn compute_hash(data: &str) -> String {
    let digest = Sha256::digest(data.as_bytes());
    base64::engine::general_purpose::STANDARD
        .encode(digest)
        .replace('/', "#")
}

/// Flatten multi-line text into a single line
pub fn escape_whitespace(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' | '\t' => escaped.push_str("    "),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn seconds_to_string(seconds: f64) -> String {
    if seconds < 1e-3 {
        format!("{:.1}us", seconds * 1e6)
    } else if seconds < 1.0 {
        format!("{:.3}ms", seconds * 1e3)
    } else {
        format!("{:.3}s", seconds)
    }
}
