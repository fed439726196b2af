//! Call records, resolved by id

use crate::ids::{CallId, DenotedValueId, FunctionId};
use std::collections::HashMap;

/// One live call activation
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub id: CallId,
    pub function_id: FunctionId,
    pub function_name: Option<String>,
    /// Denoted values supplied as arguments, in actual position order
    pub arguments: Vec<DenotedValueId>,
}

/// Live calls by id. Denoted values only store [`CallId`]s; records disappear at call exit,
/// after which an id no longer resolves.
#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: HashMap<CallId, Call>,
    next_id: u64,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new call under a fresh id
    pub fn open(
        &mut self,
        function_id: FunctionId,
        function_name: Option<String>,
        arguments: Vec<DenotedValueId>,
    ) -> CallId {
        self.next_id += 1;
        let id = CallId(self.next_id);
        self.calls.insert(
            id,
            Call {
                id,
                function_id,
                function_name,
                arguments,
            },
        );
        id
    }

    pub fn close(&mut self, id: CallId) -> Option<Call> {
        self.calls.remove(&id)
    }

    pub fn resolve(&self, id: CallId) -> Option<&Call> {
        self.calls.get(&id)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Number of calls ever opened
    pub fn opened(&self) -> usize {
        self.next_id as usize
    }
}
