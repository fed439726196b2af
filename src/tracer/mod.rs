//! Event dispatch into the denoted value model
//!
//! The [`Tracer`] owns everything the model deliberately does not: identifier allocation,
//! the binding table, live call records, the forcing stack and the analysis switch. It
//! consumes [`TraceEvent`]s in host order and produces a [`TraceReport`].

pub mod call;
pub mod events;
pub mod input;

pub use call::{Call, CallRegistry};
pub use events::{CallArgument, TraceEvent};
pub use input::{parse_events, read_events, read_trace_file};

use crate::analysis::{AnalysisCategory, AnalysisSwitch};
use crate::denoted_value::{DenotedValue, Effect, EvaluationDepth};
use crate::error::{Error, Result};
use crate::ids::{BindingHandle, CallId, DenotedValueId, EnvironmentId, FunctionId};
use crate::report::{DenotedValueReport, TraceReport, TraceStatistics};
use crate::sexp::{classify, full_type, full_type_to_string, RawValue, SexpType};
use crate::utilities::{compute_hash, timestamp};
use std::collections::{BTreeMap, HashMap};

/// What to do when an event breaks a precondition of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViolationPolicy {
    /// Stop the session and return the error
    Abort,
    /// Log, count and skip the offending event
    #[default]
    DropEvent,
}

/// A promise whose force has started but not finished
#[derive(Debug, Clone, Copy)]
struct Forcing {
    id: DenotedValueId,
    call_depth: usize,
}

/// Tracer-side data attached to a report when the value retires
#[derive(Debug, Default)]
struct Metadata {
    expression_hash: Option<String>,
    full_type: Option<String>,
}

pub struct Tracer {
    switch: AnalysisSwitch,
    policy: ViolationPolicy,
    source: Option<String>,
    next_denoted_value_id: u64,
    bindings: HashMap<BindingHandle, DenotedValueId>,
    denoted_values: HashMap<DenotedValueId, DenotedValue>,
    metadata: HashMap<DenotedValueId, Metadata>,
    calls: CallRegistry,
    call_stack: Vec<CallId>,
    forcing: Vec<Forcing>,
    kind_counts: BTreeMap<String, usize>,
    retired: Vec<DenotedValueReport>,
    statistics: TraceStatistics,
}

impl Tracer {
    pub fn new(switch: AnalysisSwitch) -> Self {
        Self {
            switch,
            policy: ViolationPolicy::default(),
            source: None,
            next_denoted_value_id: 0,
            bindings: HashMap::new(),
            denoted_values: HashMap::new(),
            metadata: HashMap::new(),
            calls: CallRegistry::new(),
            call_stack: Vec::new(),
            forcing: Vec::new(),
            kind_counts: BTreeMap::new(),
            retired: Vec::new(),
            statistics: TraceStatistics::default(),
        }
    }

    pub fn with_policy(mut self, policy: ViolationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn switch(&self) -> &AnalysisSwitch {
        &self.switch
    }

    /// Live denoted value bound to `binding`
    pub fn denoted_value(&self, binding: BindingHandle) -> Option<&DenotedValue> {
        self.bindings
            .get(&binding)
            .and_then(|id| self.denoted_values.get(id))
    }

    pub fn denoted_value_by_id(&self, id: DenotedValueId) -> Option<&DenotedValue> {
        self.denoted_values.get(&id)
    }

    pub fn calls(&self) -> &CallRegistry {
        &self.calls
    }

    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn retired(&self) -> &[DenotedValueReport] {
        &self.retired
    }

    pub fn statistics(&self) -> TraceStatistics {
        self.statistics
    }

    /// Feed every event in order
    pub fn replay<I>(&mut self, events: I) -> Result<()>
    where
        I: IntoIterator<Item = TraceEvent>,
    {
        for event in events {
            self.handle(event)?;
        }
        Ok(())
    }

    /// Route one event, applying the analysis switch and the violation policy
    pub fn handle(&mut self, event: TraceEvent) -> Result<()> {
        self.statistics.events += 1;

        if let Some(category) = event.category() {
            if !self.switch.is_enabled(category) {
                log::trace!("Skipping {:?}: {} analysis disabled", event, category.name());
                self.statistics.gated_events += 1;
                return Ok(());
            }
        }

        match self.dispatch(event) {
            Ok(()) => Ok(()),
            Err(error) if self.policy == ViolationPolicy::DropEvent => {
                log::warn!("Dropping event: {}", error);
                self.statistics.dropped_events += 1;
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    fn dispatch(&mut self, event: TraceEvent) -> Result<()> {
        if let Some((binding, usage)) = event.slot_usage() {
            self.lookup_mut(binding)?.record_usage(usage);
            return Ok(());
        }

        match event {
            TraceEvent::Create {
                binding,
                value,
                local,
            } => {
                self.create(binding, &value, local);
                Ok(())
            }
            TraceEvent::Retire { binding } => self.retire(binding).map(|_| ()),
            TraceEvent::CallEntry {
                function_id,
                function_name,
                arguments,
            } => self.call_entry(function_id, function_name, &arguments),
            TraceEvent::CallExit {
                return_value,
                jumped,
            } => self.call_exit(&return_value, jumped),
            TraceEvent::ForceEntry { binding } => self.force_entry(binding),
            TraceEvent::ForceExit {
                binding,
                value,
                elapsed,
                jumped,
            } => self.force_exit(binding, &value, elapsed, jumped),
            TraceEvent::SideEffect {
                binding,
                effect,
                transitive,
            } => self.side_effect(binding, effect, transitive),
            TraceEvent::DispatchEntry {
                binding,
                class_name,
            } => {
                let value = self.lookup_mut(binding)?;
                value.set_dispatchee();
                value.set_class_name(class_name);
                Ok(())
            }
            TraceEvent::DispatchExit { binding } => {
                self.lookup_mut(binding)?.unset_dispatchee();
                Ok(())
            }
            TraceEvent::EnvironmentTeardown { environment } => {
                self.environment_teardown(environment);
                Ok(())
            }
            // slot events were handled above
            _ => Ok(()),
        }
    }

    fn lookup_id(&self, binding: BindingHandle) -> Result<DenotedValueId> {
        self.bindings
            .get(&binding)
            .copied()
            .ok_or_else(|| {
                log::error!("Event for unknown binding {}", binding);
                Error::UnknownBinding { handle: binding }
            })
    }

    fn lookup_mut(&mut self, binding: BindingHandle) -> Result<&mut DenotedValue> {
        let id = self.lookup_id(binding)?;
        self.denoted_values
            .get_mut(&id)
            .ok_or_else(|| Error::internal(format!("binding {} maps to missing {}", binding, id)))
    }

    /// Create the denoted value for a new binding and return its id
    pub fn create(&mut self, binding: BindingHandle, object: &RawValue, local: bool) -> DenotedValueId {
        if let Some(previous) = self.bindings.remove(&binding) {
            log::debug!("Binding {} reused by the host; retiring previous value", binding);
            self.retire_id(previous);
        }

        self.next_denoted_value_id += 1;
        let id = DenotedValueId(self.next_denoted_value_id);
        let mut value = DenotedValue::new(id, object, local);
        value.set_creation_timestamp(timestamp());

        if local {
            if let Some(call) = self.call_stack.last().and_then(|c| self.calls.resolve(*c)) {
                value.set_scope(call.function_id.clone());
            }
        }

        let mut metadata = Metadata::default();
        if self.switch.is_enabled(AnalysisCategory::Metadata) {
            metadata.expression_hash = object
                .as_promise()
                .and_then(|p| p.source.as_deref())
                .map(compute_hash);
        }
        if self.switch.is_enabled(AnalysisCategory::PromiseType) {
            metadata.full_type = Some(full_type_to_string(&full_type(object)));
        }
        if self.switch.is_enabled(AnalysisCategory::ObjectCountSize) {
            *self
                .kind_counts
                .entry(value.kind().name().to_string())
                .or_insert(0) += 1;
        }

        self.bindings.insert(binding, id);
        self.denoted_values.insert(id, value);
        self.metadata.insert(id, metadata);
        id
    }

    /// Remove a binding and emit its report
    pub fn retire(&mut self, binding: BindingHandle) -> Result<DenotedValueId> {
        let id = self
            .bindings
            .remove(&binding)
            .ok_or(Error::UnknownBinding { handle: binding })?;
        self.retire_id(id);
        Ok(id)
    }

    fn retire_id(&mut self, id: DenotedValueId) {
        let value = match self.denoted_values.remove(&id) {
            Some(value) => value,
            None => return,
        };
        let metadata = self.metadata.remove(&id).unwrap_or_default();
        let mut report = DenotedValueReport::from_denoted_value(&value);
        report.expression_hash = metadata.expression_hash;
        report.full_type = metadata.full_type;
        if report.escaped {
            self.statistics.escaped += 1;
        }
        log::debug!("Retired {} (escaped: {})", id, report.escaped);
        self.retired.push(report);
    }

    fn call_entry(
        &mut self,
        function_id: FunctionId,
        function_name: Option<String>,
        arguments: &[events::CallArgument],
    ) -> Result<()> {
        // resolve every argument before mutating so an aborted event leaves no partial state
        let mut resolved = Vec::with_capacity(arguments.len());
        for argument in arguments {
            match self.lookup_id(argument.binding) {
                Ok(id) => resolved.push((argument, id)),
                Err(error) if self.policy == ViolationPolicy::Abort => return Err(error),
                Err(error) => {
                    // the call itself is still opened so its exit pops the right frame
                    log::warn!("Dropping argument of {}: {}", function_id, error);
                    self.statistics.dropped_events += 1;
                }
            }
        }

        let ids = resolved.iter().map(|(_, id)| *id).collect();
        let call = self.calls.open(function_id, function_name, ids);
        self.call_stack.push(call);
        self.statistics.calls += 1;

        for (argument, id) in resolved {
            if let Some(value) = self.denoted_values.get_mut(&id) {
                value.make_argument(
                    call,
                    argument.formal_position,
                    argument.actual_position,
                    argument.is_default,
                );
            }
        }
        Ok(())
    }

    fn call_exit(&mut self, return_value: &RawValue, jumped: bool) -> Result<()> {
        let call_id = self.call_stack.pop().ok_or_else(|| {
            log::error!("Call exit with an empty call stack");
            Error::CallStackUnderflow
        })?;
        let call = self
            .calls
            .close(call_id)
            .ok_or_else(|| Error::internal(format!("{} missing from registry", call_id)))?;

        let return_kind = if jumped {
            SexpType::Jump
        } else {
            classify(return_value)
        };

        // free in reverse so nested uses of the same value unwind LIFO
        for id in call.arguments.iter().rev() {
            // arguments may have been retired while the call ran
            if let Some(value) = self.denoted_values.get_mut(id) {
                value.free_argument(call_id, call.function_id.clone(), return_kind)?;
            }
        }
        Ok(())
    }

    fn force_entry(&mut self, binding: BindingHandle) -> Result<()> {
        let id = self.lookup_id(binding)?;
        let call_depth = self.call_stack.len();
        let depth = EvaluationDepth {
            call_depth,
            promise_depth: self.forcing.len(),
            nested_promise_depth: self
                .forcing
                .iter()
                .filter(|f| f.call_depth == call_depth)
                .count(),
        };

        let value = self.lookup_mut(binding)?;
        value.force();
        value.set_active();
        value.set_evaluation_depth(depth);
        self.forcing.push(Forcing { id, call_depth });
        Ok(())
    }

    fn force_exit(
        &mut self,
        binding: BindingHandle,
        result: &RawValue,
        elapsed: f64,
        jumped: bool,
    ) -> Result<()> {
        let id = self.lookup_id(binding)?;
        let expected = self.forcing.last().map(|f| f.id);
        if expected != Some(id) {
            log::error!("Force exit of {} while innermost force is {:?}", id, expected);
            return Err(Error::ForceStackMismatch { expected, found: id });
        }
        self.forcing.pop();

        let value = self.lookup_mut(binding)?;
        value.set_inactive();
        value.add_execution_time(elapsed);
        if jumped {
            value.set_value_kind(SexpType::Jump);
            value.set_non_local_return();
        } else {
            value.set_value_kind(classify(result));
        }
        Ok(())
    }

    /// A direct effect marks the binding direct and transitive, and every promise being
    /// forced around it transitive.
    fn side_effect(&mut self, binding: BindingHandle, effect: Effect, transitive: bool) -> Result<()> {
        let id = self.lookup_id(binding)?;
        let value = self.lookup_mut(binding)?;
        value.set_transitive(effect);
        if transitive {
            return Ok(());
        }
        value.set_direct(effect);

        for forcing in &self.forcing {
            if forcing.id == id {
                continue;
            }
            if let Some(outer) = self.denoted_values.get_mut(&forcing.id) {
                outer.set_transitive(effect);
            }
        }
        Ok(())
    }

    fn environment_teardown(&mut self, environment: EnvironmentId) {
        for value in self.denoted_values.values_mut() {
            if value.environment() == Some(environment) {
                value.clear_environment();
            }
        }
    }

    /// Retire everything still alive and produce the report
    pub fn finish(mut self) -> TraceReport {
        if !self.call_stack.is_empty() {
            log::warn!("Trace ended with {} open calls", self.call_stack.len());
        }
        let mut remaining: Vec<_> = self.denoted_values.keys().copied().collect();
        remaining.sort();
        self.bindings.clear();
        for id in remaining {
            self.retire_id(id);
        }

        TraceReport {
            generated_at: chrono::Utc::now(),
            source: self.source,
            analysis_switch: self.switch,
            statistics: self.statistics,
            kind_counts: self.kind_counts,
            denoted_values: self.retired,
        }
    }
}
