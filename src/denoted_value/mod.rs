//! Denoted values
//!
//! A [`DenotedValue`] is the analysis record of one observed binding, promise or plain value.
//! The tracer forwards interpreter events to it; it never calls back into the tracer.
//!
//! The interesting part is the argument stack and the escape guard: a value that was passed
//! to a call and is used after all such calls have returned has *escaped*, and its usage
//! counters are split into what happened before and after that moment. See [`usage`].

pub mod argument;
pub mod flags;
pub mod usage;

pub use argument::{Argument, ArgumentStack};
pub use flags::{ClassificationFlags, Effect};
pub use usage::{EscapePhase, Usage, UsageCounters};

use crate::error::{Error, Result};
use crate::ids::{CallId, DenotedValueId, EnvironmentId, FunctionId};
use crate::sexp::{classify, RawValue, SexpType};
use serde::Serialize;

/// Nesting depth at which a promise was forced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EvaluationDepth {
    /// Calls on the stack when the force started
    pub call_depth: usize,
    /// Promises already being forced when the force started
    pub promise_depth: usize,
    /// Of those, the ones whose force started in the current call
    pub nested_promise_depth: usize,
}

/// Snapshot of the last call the denoted value stopped being an argument of
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviousCall {
    pub call_id: CallId,
    pub function_id: FunctionId,
    pub formal_parameter_position: usize,
    pub actual_argument_position: usize,
    pub return_value_type: SexpType,
}

/// Analysis record of one observed binding
#[derive(Debug, Clone)]
pub struct DenotedValue {
    id: DenotedValueId,
    kind: SexpType,
    expression_kind: SexpType,
    value_kind: SexpType,
    environment: Option<EnvironmentId>,
    local: bool,
    active: bool,
    arguments: ArgumentStack,
    was_argument: bool,
    scope: Option<FunctionId>,
    class_name: Option<String>,
    dispatchee: bool,
    non_local_return: bool,
    flags: ClassificationFlags,
    creation_timestamp: Option<u64>,
    execution_time: f64,
    evaluation_depth: Option<EvaluationDepth>,
    previous_call: Option<PreviousCall>,
    counters: UsageCounters,
}

impl DenotedValue {
    /// Create the record for a freshly observed binding.
    ///
    /// For a promise the expression type, the current value type and the environment are
    /// captured here and only here.
    pub fn new(id: DenotedValueId, object: &RawValue, local: bool) -> Self {
        let mut value = Self::empty(id, classify(object), local);
        if let RawValue::Promise(promise) = object {
            value.expression_kind = classify(&promise.expression);
            value.value_kind = classify(&promise.value);
            value.environment = Some(promise.environment);
        }
        log::debug!(
            "Created denoted value {} of type {} (local: {})",
            id,
            value.kind,
            local
        );
        value
    }

    fn empty(id: DenotedValueId, kind: SexpType, local: bool) -> Self {
        Self {
            id,
            kind,
            expression_kind: SexpType::Unassigned,
            value_kind: SexpType::Unassigned,
            environment: None,
            local,
            active: false,
            arguments: ArgumentStack::new(),
            was_argument: false,
            scope: None,
            class_name: None,
            dispatchee: false,
            non_local_return: false,
            flags: ClassificationFlags::default(),
            creation_timestamp: None,
            execution_time: 0.0,
            evaluation_depth: None,
            previous_call: None,
            counters: UsageCounters::new(),
        }
    }

    pub fn id(&self) -> DenotedValueId {
        self.id
    }

    pub fn kind(&self) -> SexpType {
        self.kind
    }

    pub fn is_promise(&self) -> bool {
        self.kind == SexpType::Promise
    }

    pub fn expression_kind(&self) -> SexpType {
        self.expression_kind
    }

    pub fn set_expression_kind(&mut self, kind: SexpType) {
        self.expression_kind = kind;
    }

    pub fn value_kind(&self) -> SexpType {
        self.value_kind
    }

    pub fn set_value_kind(&mut self, kind: SexpType) {
        self.value_kind = kind;
    }

    /// Environment the promise evaluates in. Only meaningful while the host keeps that
    /// environment alive; [`DenotedValue::clear_environment`] drops it on teardown.
    pub fn environment(&self) -> Option<EnvironmentId> {
        self.environment
    }

    pub fn set_environment(&mut self, environment: EnvironmentId) {
        self.environment = Some(environment);
    }

    pub fn clear_environment(&mut self) {
        self.environment = None;
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self) {
        self.active = true;
    }

    pub fn set_inactive(&mut self) {
        self.active = false;
    }

    // Argument lifecycle

    pub fn is_argument(&self) -> bool {
        self.arguments.has_arguments()
    }

    /// Sticky: stays true after the argument stack is unwound
    pub fn was_argument(&self) -> bool {
        self.was_argument
    }

    pub fn is_free(&self) -> bool {
        !(self.is_argument() || self.was_argument())
    }

    pub fn argument_stack(&self) -> &ArgumentStack {
        &self.arguments
    }

    /// Record that this value is passed to `call`. Nested pushes are popped in LIFO order.
    pub fn make_argument(
        &mut self,
        call: CallId,
        formal_parameter_position: usize,
        actual_argument_position: usize,
        is_default: bool,
    ) {
        log::debug!(
            "{} becomes argument of {} (formal {}, actual {}, default: {})",
            self.id,
            call,
            formal_parameter_position,
            actual_argument_position,
            is_default
        );
        self.arguments.push(Argument::new(
            call,
            formal_parameter_position,
            actual_argument_position,
            is_default,
        ));
        self.was_argument = true;
    }

    /// Pop the innermost argument and remember it as the previous call.
    ///
    /// Popping the sentinel means the event stream lost track of the call structure; it is
    /// logged and reported as [`Error::ArgumentStackUnderflow`].
    pub fn free_argument(
        &mut self,
        call_id: CallId,
        function_id: FunctionId,
        return_value_type: SexpType,
    ) -> Result<Argument> {
        let argument = match self.arguments.pop() {
            Some(argument) => argument,
            None => {
                log::error!("Argument stack underflow on {}", self.id);
                return Err(Error::ArgumentStackUnderflow { id: self.id });
            }
        };
        if argument.call() != call_id {
            log::warn!(
                "{} freed from {} but innermost argument belongs to {}",
                self.id,
                call_id,
                argument.call()
            );
        }
        log::debug!("{} released by {} ({})", self.id, call_id, function_id);
        self.previous_call = Some(PreviousCall {
            call_id,
            function_id,
            formal_parameter_position: argument.formal_parameter_position(),
            actual_argument_position: argument.actual_argument_position(),
            return_value_type,
        });
        Ok(argument)
    }

    fn current_argument(&self) -> Result<&Argument> {
        self.arguments
            .top()
            .ok_or(Error::NotAnArgument { id: self.id })
    }

    /// Call of the innermost argument binding
    pub fn call(&self) -> Result<CallId> {
        self.current_argument().map(Argument::call)
    }

    pub fn formal_parameter_position(&self) -> Result<usize> {
        self.current_argument()
            .map(Argument::formal_parameter_position)
    }

    pub fn actual_argument_position(&self) -> Result<usize> {
        self.current_argument()
            .map(Argument::actual_argument_position)
    }

    /// Whether the innermost argument binding came from a default expression
    pub fn is_default(&self) -> bool {
        self.arguments.top().map_or(false, Argument::is_default)
    }

    pub fn previous_call(&self) -> Option<&PreviousCall> {
        self.previous_call.as_ref()
    }

    pub fn previous_call_id(&self) -> Option<CallId> {
        self.previous_call.as_ref().map(|p| p.call_id)
    }

    pub fn previous_function_id(&self) -> Option<&FunctionId> {
        self.previous_call.as_ref().map(|p| &p.function_id)
    }

    pub fn previous_formal_parameter_position(&self) -> Option<usize> {
        self.previous_call
            .as_ref()
            .map(|p| p.formal_parameter_position)
    }

    pub fn previous_actual_argument_position(&self) -> Option<usize> {
        self.previous_call
            .as_ref()
            .map(|p| p.actual_argument_position)
    }

    pub fn previous_call_return_value_type(&self) -> Option<SexpType> {
        self.previous_call.as_ref().map(|p| p.return_value_type)
    }

    // Scope and dispatch

    pub fn scope(&self) -> Option<&FunctionId> {
        self.scope.as_ref()
    }

    pub fn set_scope(&mut self, scope: FunctionId) {
        self.scope = Some(scope);
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn set_class_name(&mut self, class_name: impl Into<String>) {
        self.class_name = Some(class_name.into());
    }

    pub fn is_dispatchee(&self) -> bool {
        self.dispatchee
    }

    pub fn set_dispatchee(&mut self) {
        self.dispatchee = true;
    }

    pub fn unset_dispatchee(&mut self) {
        self.dispatchee = false;
    }

    pub fn set_non_local_return(&mut self) {
        self.non_local_return = true;
    }

    pub fn does_non_local_return(&self) -> bool {
        self.non_local_return
    }

    // Classification flags

    pub fn flags(&self) -> ClassificationFlags {
        self.flags
    }

    pub fn set_direct(&mut self, effect: Effect) {
        self.flags.set_direct(effect);
    }

    pub fn set_transitive(&mut self, effect: Effect) {
        self.flags.set_transitive(effect);
    }

    pub fn is_direct(&self, effect: Effect) -> bool {
        self.flags.is_direct(effect)
    }

    pub fn is_transitive(&self, effect: Effect) -> bool {
        self.flags.is_transitive(effect)
    }

    // Timing

    /// Set once by the tracer; later calls are ignored
    pub fn set_creation_timestamp(&mut self, timestamp: u64) {
        if self.creation_timestamp.is_none() {
            self.creation_timestamp = Some(timestamp);
        }
    }

    pub fn creation_timestamp(&self) -> Option<u64> {
        self.creation_timestamp
    }

    pub fn execution_time(&self) -> f64 {
        self.execution_time
    }

    /// Accumulate evaluation time; negative amounts are ignored
    pub fn add_execution_time(&mut self, execution_time: f64) {
        if execution_time > 0.0 {
            self.execution_time += execution_time;
        }
    }

    pub fn set_evaluation_depth(&mut self, depth: EvaluationDepth) {
        self.evaluation_depth = Some(depth);
    }

    pub fn evaluation_depth(&self) -> Option<EvaluationDepth> {
        self.evaluation_depth
    }

    // Usage counters

    /// Escape guard plus increment, shared by every usage operation
    pub fn record_usage(&mut self, usage: Usage) {
        let released_argument = !self.is_argument() && self.was_argument();
        if self.counters.record(usage, released_argument) {
            log::debug!("{} escaped on {}", self.id, usage);
        }
        log::trace!("{} {} -> {}", self.id, usage, self.counters.count(usage));
    }

    pub fn counters(&self) -> &UsageCounters {
        &self.counters
    }

    pub fn count(&self, usage: Usage) -> u32 {
        self.counters.count(usage)
    }

    pub fn count_before_escape(&self, usage: Usage) -> u32 {
        self.counters.before_escape(usage)
    }

    pub fn count_after_escape(&self, usage: Usage) -> u32 {
        self.counters.after_escape(usage)
    }

    pub fn has_escaped(&self) -> bool {
        self.counters.has_escaped()
    }

    pub fn is_forced(&self) -> bool {
        self.force_count() > 0
    }
}

macro_rules! usage_operations {
    ($($usage:ident => $record:ident, $count:ident, $before:ident, $after:ident;)*) => {
        impl DenotedValue {
            $(
                pub fn $record(&mut self) {
                    self.record_usage(Usage::$usage);
                }

                pub fn $count(&self) -> u32 {
                    self.count(Usage::$usage)
                }

                pub fn $before(&self) -> u32 {
                    self.count_before_escape(Usage::$usage)
                }

                pub fn $after(&self) -> u32 {
                    self.count_after_escape(Usage::$usage)
                }
            )*
        }
    };
}

usage_operations! {
    Force => force, force_count,
        force_count_before_escape, force_count_after_escape;
    ValueLookup => lookup_value, value_lookup_count,
        value_lookup_count_before_escape, value_lookup_count_after_escape;
    ValueAssign => assign_value, value_assign_count,
        value_assign_count_before_escape, value_assign_count_after_escape;
    ExpressionLookup => lookup_expression, expression_lookup_count,
        expression_lookup_count_before_escape, expression_lookup_count_after_escape;
    ExpressionAssign => assign_expression, expression_assign_count,
        expression_assign_count_before_escape, expression_assign_count_after_escape;
    EnvironmentLookup => lookup_environment, environment_lookup_count,
        environment_lookup_count_before_escape, environment_lookup_count_after_escape;
    EnvironmentAssign => assign_environment, environment_assign_count,
        environment_assign_count_before_escape, environment_assign_count_after_escape;
}

macro_rules! effect_flags {
    ($($effect:ident => $set_direct:ident, $is_direct:ident, $set_transitive:ident, $is_transitive:ident;)*) => {
        impl DenotedValue {
            $(
                pub fn $set_direct(&mut self) {
                    self.set_direct(Effect::$effect);
                }

                pub fn $is_direct(&self) -> bool {
                    self.is_direct(Effect::$effect)
                }

                pub fn $set_transitive(&mut self) {
                    self.set_transitive(Effect::$effect);
                }

                pub fn $is_transitive(&self) -> bool {
                    self.is_transitive(Effect::$effect)
                }
            )*
        }
    };
}

effect_flags! {
    SideEffectObserver => set_direct_side_effect_observer, is_direct_side_effect_observer,
        set_transitive_side_effect_observer, is_transitive_side_effect_observer;
    SideEffectCreator => set_direct_side_effect_creator, is_direct_side_effect_creator,
        set_transitive_side_effect_creator, is_transitive_side_effect_creator;
    LexicalScopeMutator => set_direct_lexical_scope_mutator, is_direct_lexical_scope_mutator,
        set_transitive_lexical_scope_mutator, is_transitive_lexical_scope_mutator;
    NonLexicalScopeMutator => set_direct_non_lexical_scope_mutator, is_direct_non_lexical_scope_mutator,
        set_transitive_non_lexical_scope_mutator, is_transitive_non_lexical_scope_mutator;
}
