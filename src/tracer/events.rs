//! Interpreter events as the instrumentation reports them

use crate::analysis::AnalysisCategory;
use crate::denoted_value::{Effect, Usage};
use crate::ids::{BindingHandle, EnvironmentId, FunctionId};
use crate::sexp::RawValue;
use serde::{Deserialize, Serialize};

/// One actual argument of a call entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallArgument {
    pub binding: BindingHandle,
    pub formal_position: usize,
    pub actual_position: usize,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// A promise or a relevant value came into existence
    Create {
        binding: BindingHandle,
        value: RawValue,
        #[serde(default)]
        local: bool,
    },
    /// The host reclaimed the binding
    Retire { binding: BindingHandle },
    CallEntry {
        function_id: FunctionId,
        #[serde(default)]
        function_name: Option<String>,
        #[serde(default)]
        arguments: Vec<CallArgument>,
    },
    CallExit {
        return_value: RawValue,
        #[serde(default)]
        jumped: bool,
    },
    ForceEntry { binding: BindingHandle },
    ForceExit {
        binding: BindingHandle,
        value: RawValue,
        #[serde(default)]
        elapsed: f64,
        #[serde(default)]
        jumped: bool,
    },
    ValueLookup { binding: BindingHandle },
    ValueAssign { binding: BindingHandle },
    ExpressionLookup { binding: BindingHandle },
    ExpressionAssign { binding: BindingHandle },
    EnvironmentLookup { binding: BindingHandle },
    EnvironmentAssign { binding: BindingHandle },
    SideEffect {
        binding: BindingHandle,
        effect: Effect,
        #[serde(default)]
        transitive: bool,
    },
    DispatchEntry {
        binding: BindingHandle,
        class_name: String,
    },
    DispatchExit { binding: BindingHandle },
    EnvironmentTeardown { environment: EnvironmentId },
}

impl TraceEvent {
    /// Analysis that must be enabled for the event to reach the model.
    /// Structural events return `None` and are always routed.
    pub fn category(&self) -> Option<AnalysisCategory> {
        match self {
            TraceEvent::ForceEntry { .. } | TraceEvent::ForceExit { .. } => {
                Some(AnalysisCategory::PromiseEvaluation)
            }
            TraceEvent::ValueLookup { .. }
            | TraceEvent::ValueAssign { .. }
            | TraceEvent::ExpressionLookup { .. }
            | TraceEvent::ExpressionAssign { .. }
            | TraceEvent::EnvironmentLookup { .. }
            | TraceEvent::EnvironmentAssign { .. } => Some(AnalysisCategory::PromiseSlotMutation),
            TraceEvent::SideEffect { .. } => Some(AnalysisCategory::SideEffect),
            TraceEvent::DispatchEntry { .. } | TraceEvent::DispatchExit { .. } => {
                Some(AnalysisCategory::Function)
            }
            TraceEvent::Create { .. }
            | TraceEvent::Retire { .. }
            | TraceEvent::CallEntry { .. }
            | TraceEvent::CallExit { .. }
            | TraceEvent::EnvironmentTeardown { .. } => None,
        }
    }

    /// Counter touched by a slot event
    pub fn slot_usage(&self) -> Option<(BindingHandle, Usage)> {
        match *self {
            TraceEvent::ValueLookup { binding } => Some((binding, Usage::ValueLookup)),
            TraceEvent::ValueAssign { binding } => Some((binding, Usage::ValueAssign)),
            TraceEvent::ExpressionLookup { binding } => Some((binding, Usage::ExpressionLookup)),
            TraceEvent::ExpressionAssign { binding } => Some((binding, Usage::ExpressionAssign)),
            TraceEvent::EnvironmentLookup { binding } => {
                Some((binding, Usage::EnvironmentLookup))
            }
            TraceEvent::EnvironmentAssign { binding } => {
                Some((binding, Usage::EnvironmentAssign))
            }
            _ => None,
        }
    }
}
