//! Analysis configuration

pub mod switch;

pub use switch::{AnalysisCategory, AnalysisSwitch, SwitchValue};
