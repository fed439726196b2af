//! Side-effect and scope-mutation classification flags

use serde::{Deserialize, Serialize};
use std::fmt;

/// Property a denoted value can be observed to have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    SideEffectObserver,
    SideEffectCreator,
    LexicalScopeMutator,
    NonLexicalScopeMutator,
}

impl Effect {
    pub const ALL: [Effect; 4] = [
        Effect::SideEffectObserver,
        Effect::SideEffectCreator,
        Effect::LexicalScopeMutator,
        Effect::NonLexicalScopeMutator,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }

    pub fn name(self) -> &'static str {
        match self {
            Effect::SideEffectObserver => "side_effect_observer",
            Effect::SideEffectCreator => "side_effect_creator",
            Effect::LexicalScopeMutator => "lexical_scope_mutator",
            Effect::NonLexicalScopeMutator => "non_lexical_scope_mutator",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Monotone direct and transitive flags.
///
/// Nothing here keeps transitive a superset of direct; whoever propagates effects
/// along call chains is responsible for setting both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationFlags {
    direct: u8,
    transitive: u8,
}

impl ClassificationFlags {
    pub fn set_direct(&mut self, effect: Effect) {
        self.direct |= effect.bit();
    }

    pub fn set_transitive(&mut self, effect: Effect) {
        self.transitive |= effect.bit();
    }

    pub fn is_direct(&self, effect: Effect) -> bool {
        self.direct & effect.bit() != 0
    }

    pub fn is_transitive(&self, effect: Effect) -> bool {
        self.transitive & effect.bit() != 0
    }
}
