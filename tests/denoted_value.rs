use promise_tracer_rs::denoted_value::{DenotedValue, Usage};
use promise_tracer_rs::sexp::{RawPromise, RawValue, SexpType};
use promise_tracer_rs::{CallId, DenotedValueId, EnvironmentId, Error, FunctionId};

fn promise(id: u64) -> DenotedValue {
    let raw = RawValue::Promise(Box::new(RawPromise {
        expression: RawValue::object(SexpType::Language),
        value: RawValue::Unassigned,
        environment: EnvironmentId(0xbeef),
        source: None,
    }));
    DenotedValue::new(DenotedValueId(id), &raw, true)
}

fn plain(id: u64) -> DenotedValue {
    DenotedValue::new(DenotedValueId(id), &RawValue::object(SexpType::Integer), false)
}

fn free(value: &mut DenotedValue, call: u64) {
    value
        .free_argument(CallId(call), FunctionId::new("f"), SexpType::Null)
        .expect("argument stack should not underflow");
}

fn assert_split_identity(value: &DenotedValue) {
    for usage in Usage::ALL {
        assert_eq!(
            value.count(usage),
            value.count_before_escape(usage) + value.count_after_escape(usage),
            "split identity broken for {}",
            usage
        );
    }
}

#[test]
fn test_nested_arguments_unwind_lifo() {
    for depth in 1..=5u64 {
        let mut value = promise(depth);
        for call in 1..=depth {
            value.make_argument(CallId(call), call as usize, call as usize + 1, false);
            assert!(value.is_argument());
            assert_eq!(value.argument_stack().len(), call as usize + 1);
            assert_eq!(value.call(), Ok(CallId(call)));
        }
        for call in (1..=depth).rev() {
            assert!(value.is_argument());
            assert_eq!(value.formal_parameter_position(), Ok(call as usize));
            free(&mut value, call);
        }
        assert!(!value.is_argument());
        assert!(value.was_argument());
        assert!(!value.is_free());
        assert_eq!(value.argument_stack().len(), 1);
    }

    let untouched = promise(99);
    assert!(!untouched.is_argument());
    assert!(!untouched.was_argument());
    assert!(untouched.is_free());
}

#[test]
fn test_freeing_the_sentinel_is_a_precondition_violation() {
    let mut value = promise(1);
    let result = value.free_argument(CallId(1), FunctionId::new("f"), SexpType::Null);
    assert_eq!(
        result,
        Err(Error::ArgumentStackUnderflow {
            id: DenotedValueId(1)
        })
    );
    assert!(result.unwrap_err().is_precondition_violation());

    value.make_argument(CallId(1), 0, 0, false);
    free(&mut value, 1);
    assert!(value
        .free_argument(CallId(1), FunctionId::new("f"), SexpType::Null)
        .is_err());
}

#[test]
fn test_split_identity_holds_throughout() {
    let mut value = promise(1);
    let operations: [fn(&mut DenotedValue); 7] = [
        DenotedValue::force,
        DenotedValue::lookup_value,
        DenotedValue::assign_value,
        DenotedValue::lookup_expression,
        DenotedValue::assign_expression,
        DenotedValue::lookup_environment,
        DenotedValue::assign_environment,
    ];

    value.make_argument(CallId(1), 0, 0, false);
    for operation in &operations {
        operation(&mut value);
        assert_split_identity(&value);
    }
    free(&mut value, 1);
    for operation in operations.iter().rev() {
        operation(&mut value);
        operation(&mut value);
        assert_split_identity(&value);
    }

    assert!(value.has_escaped());
    for usage in Usage::ALL {
        assert_eq!(value.count_before_escape(usage), 1);
        assert_eq!(value.count_after_escape(usage), 2);
        assert_eq!(value.count(usage), 3);
    }
}

#[test]
fn test_escape_is_monotonic() {
    let mut value = promise(1);
    value.make_argument(CallId(1), 0, 0, false);
    free(&mut value, 1);
    value.force();
    assert!(value.has_escaped());

    value.make_argument(CallId(2), 0, 0, false);
    value.lookup_value();
    assert!(value.has_escaped());
    free(&mut value, 2);
    value.lookup_value();
    assert!(value.has_escaped());

    // re-entering a call does not rebucket anything
    assert_eq!(value.force_count_before_escape(), 0);
    assert_eq!(value.force_count_after_escape(), 1);
    assert_eq!(value.value_lookup_count_before_escape(), 0);
    assert_eq!(value.value_lookup_count_after_escape(), 2);
}

#[test]
fn test_escape_trigger_moves_prior_counts() {
    let mut value = promise(1);
    value.lookup_expression();
    value.make_argument(CallId(1), 0, 0, false);
    value.force();
    value.lookup_value();
    free(&mut value, 1);
    assert!(!value.has_escaped(), "escape is only detected on the next use");

    value.force();
    assert!(value.has_escaped());
    assert_eq!(value.force_count_before_escape(), 1);
    assert_eq!(value.force_count_after_escape(), 1);
    assert_eq!(value.value_lookup_count_before_escape(), 1);
    assert_eq!(value.value_lookup_count_after_escape(), 0);
    assert_eq!(value.expression_lookup_count_before_escape(), 1);
    assert_eq!(value.expression_lookup_count_after_escape(), 0);
}

#[test]
fn test_value_that_was_never_an_argument_never_escapes() {
    let mut value = plain(1);
    for _ in 0..3 {
        value.lookup_value();
        value.assign_value();
    }
    value.force();
    assert!(!value.has_escaped());
    assert_eq!(value.value_lookup_count_before_escape(), 0);
    assert_eq!(value.value_lookup_count_after_escape(), 3);
    assert_eq!(value.value_assign_count(), 3);
    assert_eq!(value.force_count_after_escape(), 1);
    assert!(value.is_forced());
}

#[test]
fn test_use_while_still_an_argument_does_not_escape() {
    let mut value = promise(1);
    value.make_argument(CallId(1), 0, 0, false);
    value.make_argument(CallId(2), 1, 1, false);
    free(&mut value, 2);
    value.force();
    assert!(!value.has_escaped());
    free(&mut value, 1);
    value.force();
    assert!(value.has_escaped());
    assert_eq!(value.force_count_before_escape(), 1);
    assert_eq!(value.force_count_after_escape(), 1);
}

#[test]
fn test_flag_setters_are_idempotent() {
    let mut once = promise(1);
    let mut twice = promise(1);

    once.set_dispatchee();
    twice.set_dispatchee();
    twice.set_dispatchee();
    assert_eq!(once.is_dispatchee(), twice.is_dispatchee());

    once.set_direct_lexical_scope_mutator();
    twice.set_direct_lexical_scope_mutator();
    twice.set_direct_lexical_scope_mutator();
    assert_eq!(once.flags(), twice.flags());

    once.set_active();
    twice.set_active();
    twice.set_active();
    assert_eq!(once.is_active(), twice.is_active());

    twice.unset_dispatchee();
    twice.unset_dispatchee();
    assert!(!twice.is_dispatchee());
    twice.set_inactive();
    assert!(!twice.is_active());
}

#[test]
fn test_lookup_after_release_escapes() {
    let mut value = promise(1);
    assert!(value.is_promise());
    assert!(value.is_local());

    value.make_argument(CallId(7), 0, 0, false);
    value.force();
    assert_eq!(value.force_count(), 1);
    assert_eq!(value.force_count_before_escape(), 0);

    value
        .free_argument(CallId(7), FunctionId::new("callA"), SexpType::Double)
        .unwrap();
    value.lookup_value();

    assert!(value.has_escaped());
    assert_eq!(value.value_lookup_count_before_escape(), 0);
    assert_eq!(value.value_lookup_count_after_escape(), 1);
    assert_eq!(value.force_count_before_escape(), 1);
    assert_eq!(value.force_count_after_escape(), 0);
}

#[test]
fn test_direct_flag_does_not_imply_transitive() {
    let mut value = promise(1);
    value.set_direct_side_effect_creator();
    assert!(value.is_direct_side_effect_creator());
    assert!(!value.is_transitive_side_effect_creator());

    value.set_transitive_non_lexical_scope_mutator();
    assert!(value.is_transitive_non_lexical_scope_mutator());
    assert!(!value.is_direct_non_lexical_scope_mutator());
    assert!(!value.is_direct_side_effect_observer());
    assert!(!value.is_transitive_side_effect_observer());
}

#[test]
fn test_previous_call_snapshot() {
    let mut value = promise(1);
    assert_eq!(value.previous_call_id(), None);

    value.make_argument(CallId(3), 2, 4, true);
    assert!(value.is_default());
    assert_eq!(value.actual_argument_position(), Ok(4));
    value
        .free_argument(CallId(3), FunctionId::new("fn-3"), SexpType::List)
        .unwrap();

    assert!(!value.is_default());
    assert_eq!(value.previous_call_id(), Some(CallId(3)));
    assert_eq!(value.previous_function_id(), Some(&FunctionId::new("fn-3")));
    assert_eq!(value.previous_formal_parameter_position(), Some(2));
    assert_eq!(value.previous_actual_argument_position(), Some(4));
    assert_eq!(value.previous_call_return_value_type(), Some(SexpType::List));
    assert_eq!(
        value.actual_argument_position(),
        Err(Error::NotAnArgument {
            id: DenotedValueId(1)
        })
    );
}

#[test]
fn test_scope_class_and_environment() {
    let mut value = promise(1);
    value.set_scope(FunctionId::new("outer"));
    value.set_class_name("data.frame");
    value.set_non_local_return();
    value.set_evaluation_depth(Default::default());
    assert_eq!(value.scope(), Some(&FunctionId::new("outer")));
    assert_eq!(value.class_name(), Some("data.frame"));
    assert!(value.does_non_local_return());
    assert!(value.evaluation_depth().is_some());

    assert_eq!(value.environment(), Some(EnvironmentId(0xbeef)));
    value.clear_environment();
    assert_eq!(value.environment(), None);
}
