//! Analysis switches
//!
//! Which categories of events the tracer routes into the denoted value model. The model
//! itself never reads these.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// One toggleable analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisCategory {
    Metadata,
    ObjectCountSize,
    Function,
    PromiseType,
    PromiseSlotMutation,
    PromiseEvaluation,
    Strictness,
    SideEffect,
}

impl AnalysisCategory {
    pub const ALL: [AnalysisCategory; 8] = [
        AnalysisCategory::Metadata,
        AnalysisCategory::ObjectCountSize,
        AnalysisCategory::Function,
        AnalysisCategory::PromiseType,
        AnalysisCategory::PromiseSlotMutation,
        AnalysisCategory::PromiseEvaluation,
        AnalysisCategory::Strictness,
        AnalysisCategory::SideEffect,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnalysisCategory::Metadata => "metadata",
            AnalysisCategory::ObjectCountSize => "object_count_size",
            AnalysisCategory::Function => "function",
            AnalysisCategory::PromiseType => "promise_type",
            AnalysisCategory::PromiseSlotMutation => "promise_slot_mutation",
            AnalysisCategory::PromiseEvaluation => "promise_evaluation",
            AnalysisCategory::Strictness => "strictness",
            AnalysisCategory::SideEffect => "side_effect",
        }
    }

    /// Name of the variable that controls this analysis, e.g. `enable_side_effect_analysis`
    pub fn variable_name(self) -> String {
        format!("enable_{}_analysis", self.name())
    }
}

/// Boolean toggles, all enabled unless configured otherwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSwitch {
    pub metadata: bool,
    pub object_count_size: bool,
    pub function: bool,
    pub promise_type: bool,
    pub promise_slot_mutation: bool,
    pub promise_evaluation: bool,
    /// Not consulted by the tracer; carried in the report for its consumers
    pub strictness: bool,
    pub side_effect: bool,
}

impl Default for AnalysisSwitch {
    fn default() -> Self {
        Self {
            metadata: true,
            object_count_size: true,
            function: true,
            promise_type: true,
            promise_slot_mutation: true,
            promise_evaluation: true,
            strictness: true,
            side_effect: true,
        }
    }
}

/// A configuration value before coercion to a boolean
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SwitchValue {
    /// Coerce to a boolean. Only recognised truthy values are true.
    pub fn to_bool(&self) -> bool {
        match self {
            SwitchValue::Bool(b) => *b,
            SwitchValue::Number(n) => *n != 0.0 && !n.is_nan(),
            SwitchValue::Text(s) => matches!(s.trim(), "TRUE" | "true" | "True" | "T" | "1"),
        }
    }

    fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::Bool(b) => Some(SwitchValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(SwitchValue::Number),
            serde_json::Value::String(s) => Some(SwitchValue::Text(s.clone())),
            // arrays and objects behave like a non-TRUE value
            other => Some(SwitchValue::Text(other.to_string())),
        }
    }
}

impl AnalysisSwitch {
    /// Build the switch from a variable lookup keyed by `enable_<name>_analysis`.
    /// Unset variables leave the analysis enabled.
    pub fn from_variables<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<SwitchValue>,
    {
        let mut switch = AnalysisSwitch::default();
        for category in AnalysisCategory::ALL {
            if let Some(value) = lookup(&category.variable_name()) {
                switch.set(category, value.to_bool());
            }
        }
        switch
    }

    /// Layered sources: `overrides` beat the JSON config file, which beats the
    /// `ENABLE_<NAME>_ANALYSIS` environment variables
    pub fn from_sources(config: Option<&Path>, overrides: &[String]) -> Result<Self> {
        Self::layered(|name| std::env::var(name).ok(), config, overrides)
    }

    fn layered<E>(environment: E, config: Option<&Path>, overrides: &[String]) -> Result<Self>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut variables: HashMap<String, SwitchValue> = HashMap::new();

        for category in AnalysisCategory::ALL {
            let name = category.variable_name();
            if let Some(value) = environment(&name.to_uppercase()) {
                log::debug!("{} set from environment", name);
                variables.insert(name, SwitchValue::Text(value));
            }
        }

        if let Some(path) = config {
            let text = std::fs::read_to_string(path).map_err(|e| {
                Error::config(format!("cannot read {}: {}", path.display(), e))
            })?;
            let parsed = parse_config(&text)?;
            log::debug!("{} switch variables read from {}", parsed.len(), path.display());
            variables.extend(parsed);
        }

        for assignment in overrides {
            let (name, value) = parse_assignment(assignment)?;
            log::debug!("{} overridden on the command line", name);
            variables.insert(name, value);
        }

        Ok(Self::from_variables(|name| variables.get(name).cloned()))
    }

    pub fn is_enabled(&self, category: AnalysisCategory) -> bool {
        match category {
            AnalysisCategory::Metadata => self.metadata,
            AnalysisCategory::ObjectCountSize => self.object_count_size,
            AnalysisCategory::Function => self.function,
            AnalysisCategory::PromiseType => self.promise_type,
            AnalysisCategory::PromiseSlotMutation => self.promise_slot_mutation,
            AnalysisCategory::PromiseEvaluation => self.promise_evaluation,
            AnalysisCategory::Strictness => self.strictness,
            AnalysisCategory::SideEffect => self.side_effect,
        }
    }

    pub fn set(&mut self, category: AnalysisCategory, enabled: bool) {
        let slot = match category {
            AnalysisCategory::Metadata => &mut self.metadata,
            AnalysisCategory::ObjectCountSize => &mut self.object_count_size,
            AnalysisCategory::Function => &mut self.function,
            AnalysisCategory::PromiseType => &mut self.promise_type,
            AnalysisCategory::PromiseSlotMutation => &mut self.promise_slot_mutation,
            AnalysisCategory::PromiseEvaluation => &mut self.promise_evaluation,
            AnalysisCategory::Strictness => &mut self.strictness,
            AnalysisCategory::SideEffect => &mut self.side_effect,
        };
        *slot = enabled;
    }
}

/// Parse a flat JSON object of `enable_<name>_analysis` variables
fn parse_config(text: &str) -> Result<HashMap<String, SwitchValue>> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| Error::config(format!("invalid switch configuration: {}", e)))?;
    let object = value
        .as_object()
        .ok_or_else(|| Error::config("switch configuration must be a JSON object"))?;

    Ok(object
        .iter()
        .filter_map(|(name, value)| SwitchValue::from_json(value).map(|v| (name.clone(), v)))
        .collect())
}

/// Parse `name=value`
fn parse_assignment(assignment: &str) -> Result<(String, SwitchValue)> {
    match assignment.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((
            name.trim().to_string(),
            SwitchValue::Text(value.trim().to_string()),
        )),
        _ => Err(Error::config(format!(
            "expected name=value, got '{}'",
            assignment
        ))),
    }
}

impl fmt::Display for AnalysisSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for category in AnalysisCategory::ALL {
            let state = if self.is_enabled(category) {
                "enabled"
            } else {
                "disabled"
            };
            writeln!(f, "{}: {}", category.name(), state)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_variables_default_to_enabled() {
        let switch = AnalysisSwitch::from_variables(|_| None);
        assert_eq!(switch, AnalysisSwitch::default());
        assert!(AnalysisCategory::ALL.iter().all(|c| switch.is_enabled(*c)));
    }

    #[test]
    fn test_variables_are_coerced() {
        let switch = AnalysisSwitch::from_variables(|name| match name {
            "enable_side_effect_analysis" => Some(SwitchValue::Text("FALSE".to_string())),
            "enable_metadata_analysis" => Some(SwitchValue::Number(0.0)),
            "enable_strictness_analysis" => Some(SwitchValue::Text("T".to_string())),
            "enable_function_analysis" => Some(SwitchValue::Text("maybe".to_string())),
            _ => None,
        });
        assert!(!switch.side_effect);
        assert!(!switch.metadata);
        assert!(switch.strictness);
        assert!(!switch.function);
        assert!(switch.promise_evaluation);
    }

    #[test]
    fn test_overrides_beat_config_which_beats_environment() {
        use std::io::Write;

        let environment = |name: &str| match name {
            "ENABLE_SIDE_EFFECT_ANALYSIS" => Some("FALSE".to_string()),
            "ENABLE_METADATA_ANALYSIS" => Some("FALSE".to_string()),
            "ENABLE_FUNCTION_ANALYSIS" => Some("FALSE".to_string()),
            _ => None,
        };
        let mut config = tempfile::NamedTempFile::new().unwrap();
        config
            .write_all(br#"{"enable_metadata_analysis": true, "enable_function_analysis": true}"#)
            .unwrap();

        let switch = AnalysisSwitch::layered(environment, None, &[]).unwrap();
        assert!(!switch.side_effect);
        assert!(!switch.metadata);
        assert!(!switch.function);

        let switch = AnalysisSwitch::layered(environment, Some(config.path()), &[]).unwrap();
        assert!(!switch.side_effect);
        assert!(switch.metadata);
        assert!(switch.function);

        let overrides = vec!["enable_function_analysis=FALSE".to_string()];
        let switch =
            AnalysisSwitch::layered(environment, Some(config.path()), &overrides).unwrap();
        assert!(!switch.side_effect);
        assert!(switch.metadata);
        assert!(!switch.function);
    }

    #[test]
    fn test_config_file_values() {
        let parsed = parse_config(
            r#"{"enable_promise_type_analysis": false, "enable_function_analysis": null, "enable_strictness_analysis": 1}"#,
        )
        .unwrap();
        assert_eq!(
            parsed.get("enable_promise_type_analysis"),
            Some(&SwitchValue::Bool(false))
        );
        assert!(!parsed.contains_key("enable_function_analysis"));
        assert!(parsed["enable_strictness_analysis"].to_bool());

        assert!(parse_config("[1, 2]").is_err());
    }

    #[test]
    fn test_assignment_parsing() {
        let (name, value) = parse_assignment("enable_metadata_analysis = FALSE").unwrap();
        assert_eq!(name, "enable_metadata_analysis");
        assert!(!value.to_bool());
        assert!(parse_assignment("no-equals-sign").is_err());
        assert!(parse_assignment("=TRUE").is_err());
    }

    #[test]
    fn test_serde_defaults_missing_fields_to_enabled() {
        let switch: AnalysisSwitch = serde_json::from_str(r#"{"side_effect": false}"#).unwrap();
        assert!(!switch.side_effect);
        assert!(switch.metadata);
    }

    #[test]
    fn test_display_lists_every_toggle() {
        let mut switch = AnalysisSwitch::default();
        switch.set(AnalysisCategory::PromiseSlotMutation, false);
        let text = switch.to_string();
        assert_eq!(text.lines().count(), 8);
        assert!(text.contains("promise_slot_mutation: disabled"));
        assert!(text.contains("side_effect: enabled"));
    }
}
