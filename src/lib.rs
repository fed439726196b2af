//! promise-tracer-rs: usage and escape analysis of bindings in lazily-evaluated programs
//!
//! This library classifies every observed binding ("denoted value"), promise or plain value,
//! by how a traced execution uses it: forced, read or assigned, passed as an argument, used
//! after it escaped the calls it was passed to, and involved in side effects or scope
//! mutation.

pub mod analysis;
pub mod cli;
pub mod denoted_value;
pub mod error;
pub mod ids;
pub mod report;
pub mod sexp;
pub mod tracer;
pub mod utilities;

pub use error::{Error, Result};

// Re-export commonly used types
pub use analysis::{AnalysisCategory, AnalysisSwitch};
pub use denoted_value::{Argument, DenotedValue, Effect, EscapePhase, Usage};
pub use ids::{BindingHandle, CallId, DenotedValueId, EnvironmentId, FunctionId};
pub use report::{DenotedValueReport, TraceReport};
pub use sexp::{classify, RawValue, SexpType};
pub use tracer::{TraceEvent, Tracer, ViolationPolicy};
