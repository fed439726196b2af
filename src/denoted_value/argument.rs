//! Argument bindings of a denoted value

use crate::ids::CallId;
use serde::Serialize;

/// One argument-binding relationship: the denoted value was supplied to `call`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Argument {
    call: CallId,
    formal_parameter_position: usize,
    actual_argument_position: usize,
    is_default: bool,
}

impl Argument {
    pub fn new(
        call: CallId,
        formal_parameter_position: usize,
        actual_argument_position: usize,
        is_default: bool,
    ) -> Self {
        Self {
            call,
            formal_parameter_position,
            actual_argument_position,
            is_default,
        }
    }

    pub fn call(&self) -> CallId {
        self.call
    }

    pub fn formal_parameter_position(&self) -> usize {
        self.formal_parameter_position
    }

    pub fn actual_argument_position(&self) -> usize {
        self.actual_argument_position
    }

    /// Whether the value arrived through the formal's default expression
    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

/// LIFO stack of the calls a denoted value is currently an argument of.
///
/// The bottom "not an argument" entry is implicit: an empty `frames` vector is the
/// sentinel-only stack, so [`ArgumentStack::len`] is never below one.
#[derive(Debug, Clone, Default)]
pub struct ArgumentStack {
    frames: Vec<Argument>,
}

impl ArgumentStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries including the sentinel
    pub fn len(&self) -> usize {
        self.frames.len() + 1
    }

    /// Never true; the sentinel is always present
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn has_arguments(&self) -> bool {
        !self.frames.is_empty()
    }

    pub fn push(&mut self, argument: Argument) {
        self.frames.push(argument);
    }

    /// Pop the innermost argument. Returns `None` when only the sentinel is left.
    pub fn pop(&mut self) -> Option<Argument> {
        self.frames.pop()
    }

    /// The innermost argument, `None` at the sentinel
    pub fn top(&self) -> Option<&Argument> {
        self.frames.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Argument> {
        self.frames.iter()
    }
}
