//! Outbound snapshots of finalized denoted values

use crate::analysis::AnalysisSwitch;
use crate::denoted_value::{DenotedValue, Effect, EvaluationDepth, PreviousCall, Usage};
use crate::ids::{DenotedValueId, EnvironmentId, FunctionId};
use crate::sexp::SexpType;
use crate::utilities::seconds_to_string;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One usage category split around the escape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageCount {
    pub total: u32,
    pub before_escape: u32,
    pub after_escape: u32,
}

/// Direct and transitive state of one effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectState {
    pub direct: bool,
    pub transitive: bool,
}

/// Everything the reporting side can read from a denoted value
#[derive(Debug, Clone, Serialize)]
pub struct DenotedValueReport {
    pub id: DenotedValueId,
    pub kind: SexpType,
    pub expression_kind: SexpType,
    pub value_kind: SexpType,
    pub environment: Option<EnvironmentId>,
    pub local: bool,
    pub active: bool,
    pub argument: bool,
    pub was_argument: bool,
    pub free: bool,
    pub forced: bool,
    pub default: bool,
    pub escaped: bool,
    pub usage: BTreeMap<&'static str, UsageCount>,
    pub effects: BTreeMap<&'static str, EffectState>,
    pub scope: Option<FunctionId>,
    pub class_name: Option<String>,
    pub dispatchee: bool,
    pub non_local_return: bool,
    pub creation_timestamp: Option<u64>,
    pub execution_time: f64,
    pub evaluation_depth: Option<EvaluationDepth>,
    pub previous_call: Option<PreviousCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_type: Option<String>,
}

impl DenotedValueReport {
    pub fn from_denoted_value(value: &DenotedValue) -> Self {
        let usage = Usage::ALL
            .iter()
            .map(|&u| {
                (
                    u.name(),
                    UsageCount {
                        total: value.count(u),
                        before_escape: value.count_before_escape(u),
                        after_escape: value.count_after_escape(u),
                    },
                )
            })
            .collect();

        let effects = Effect::ALL
            .iter()
            .map(|&e| {
                (
                    e.name(),
                    EffectState {
                        direct: value.is_direct(e),
                        transitive: value.is_transitive(e),
                    },
                )
            })
            .collect();

        Self {
            id: value.id(),
            kind: value.kind(),
            expression_kind: value.expression_kind(),
            value_kind: value.value_kind(),
            environment: value.environment(),
            local: value.is_local(),
            active: value.is_active(),
            argument: value.is_argument(),
            was_argument: value.was_argument(),
            free: value.is_free(),
            forced: value.is_forced(),
            default: value.is_default(),
            escaped: value.has_escaped(),
            usage,
            effects,
            scope: value.scope().cloned(),
            class_name: value.class_name().map(str::to_string),
            dispatchee: value.is_dispatchee(),
            non_local_return: value.does_non_local_return(),
            creation_timestamp: value.creation_timestamp(),
            execution_time: value.execution_time(),
            evaluation_depth: value.evaluation_depth(),
            previous_call: value.previous_call().cloned(),
            expression_hash: None,
            full_type: None,
        }
    }

    pub fn usage(&self, usage: Usage) -> UsageCount {
        self.usage[usage.name()]
    }

    pub fn effect(&self, effect: Effect) -> EffectState {
        self.effects[effect.name()]
    }
}

/// Event accounting for one replayed trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraceStatistics {
    pub events: usize,
    pub gated_events: usize,
    pub dropped_events: usize,
    pub calls: usize,
    pub escaped: usize,
}

/// Final result of one tracing session
#[derive(Debug, Clone, Serialize)]
pub struct TraceReport {
    pub generated_at: DateTime<Utc>,
    pub source: Option<String>,
    pub analysis_switch: AnalysisSwitch,
    pub statistics: TraceStatistics,
    /// Creation counts per type, only collected with the object count analysis
    pub kind_counts: BTreeMap<String, usize>,
    pub denoted_values: Vec<DenotedValueReport>,
}

impl TraceReport {
    pub fn to_json(&self) -> crate::Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| crate::Error::internal(e.to_string()))
    }

    pub fn find(&self, id: DenotedValueId) -> Option<&DenotedValueReport> {
        self.denoted_values.iter().find(|r| r.id == id)
    }
}

impl fmt::Display for TraceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "trace: {}",
            self.source.as_deref().unwrap_or("<stdin>")
        )?;
        writeln!(
            f,
            "events: {} (gated {}, dropped {}), calls: {}, denoted values: {} ({} escaped)",
            self.statistics.events,
            self.statistics.gated_events,
            self.statistics.dropped_events,
            self.statistics.calls,
            self.denoted_values.len(),
            self.statistics.escaped
        )?;
        for (kind, count) in &self.kind_counts {
            writeln!(f, "  {:<16} {}", kind, count)?;
        }
        writeln!(
            f,
            "{:<8} {:<12} {:>6} {:>6} {:>6} {:>6} {:>7} {:>10}",
            "id", "kind", "force", "lookup", "assign", "escape", "arg", "time"
        )?;
        for value in &self.denoted_values {
            let force = value.usage(Usage::Force);
            let lookup = value.usage(Usage::ValueLookup);
            let assign = value.usage(Usage::ValueAssign);
            writeln!(
                f,
                "{:<8} {:<12} {:>6} {:>6} {:>6} {:>6} {:>7} {:>10}",
                value.id.0,
                value.kind.name(),
                force.total,
                lookup.total,
                assign.total,
                if value.escaped { "yes" } else { "no" },
                if value.was_argument { "was" } else { "never" },
                seconds_to_string(value.execution_time)
            )?;
        }
        Ok(())
    }
}
