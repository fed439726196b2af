//! Usage counters and the escape state machine
//!
//! Every usage category keeps two halves. Until the denoted value escapes, all counts land
//! in the live half. The escape transition happens once: the live half is moved into the
//! before-escape half and reset, so everything counted afterwards is post-escape.
//!
//! Counters are `u32` and saturate at `u32::MAX`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of observation that increments a usage counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Usage {
    Force,
    ValueLookup,
    ValueAssign,
    ExpressionLookup,
    ExpressionAssign,
    EnvironmentLookup,
    EnvironmentAssign,
}

impl Usage {
    pub const ALL: [Usage; 7] = [
        Usage::Force,
        Usage::ValueLookup,
        Usage::ValueAssign,
        Usage::ExpressionLookup,
        Usage::ExpressionAssign,
        Usage::EnvironmentLookup,
        Usage::EnvironmentAssign,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Usage::Force => "force",
            Usage::ValueLookup => "value_lookup",
            Usage::ValueAssign => "value_assign",
            Usage::ExpressionLookup => "expression_lookup",
            Usage::ExpressionAssign => "expression_assign",
            Usage::EnvironmentLookup => "environment_lookup",
            Usage::EnvironmentAssign => "environment_assign",
        }
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Two-state escape machine with a single one-way transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscapePhase {
    /// Still owned by the call context it was created or passed in
    #[default]
    Contained,
    /// Used after every call it was an argument of has returned
    Escaped,
}

impl EscapePhase {
    /// Next phase given whether the value is currently free of any call but was an
    /// argument before. `Escaped` is absorbing.
    pub fn transition(self, released_argument: bool) -> EscapePhase {
        match self {
            EscapePhase::Escaped => EscapePhase::Escaped,
            EscapePhase::Contained if released_argument => EscapePhase::Escaped,
            EscapePhase::Contained => EscapePhase::Contained,
        }
    }

    pub fn has_escaped(self) -> bool {
        self == EscapePhase::Escaped
    }
}

/// Per-category counters split around the escape transition
#[derive(Debug, Clone, Default)]
pub struct UsageCounters {
    phase: EscapePhase,
    before_escape: [u32; 7],
    after_escape: [u32; 7],
}

impl UsageCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the escape guard, then count one `usage`.
    ///
    /// Returns true when this observation triggered the escape transition.
    pub fn record(&mut self, usage: Usage, released_argument: bool) -> bool {
        let escaped_now = self.advance(released_argument);
        let slot = &mut self.after_escape[usage.index()];
        *slot = slot.saturating_add(1);
        escaped_now
    }

    /// Apply the phase transition; moves live counts into the before-escape half exactly once.
    fn advance(&mut self, released_argument: bool) -> bool {
        let next = self.phase.transition(released_argument);
        let escaped_now = self.phase == EscapePhase::Contained && next == EscapePhase::Escaped;
        if escaped_now {
            self.before_escape = self.after_escape;
            self.after_escape = [0; 7];
        }
        self.phase = next;
        escaped_now
    }

    pub fn phase(&self) -> EscapePhase {
        self.phase
    }

    pub fn has_escaped(&self) -> bool {
        self.phase.has_escaped()
    }

    pub fn count(&self, usage: Usage) -> u32 {
        self.before_escape(usage)
            .saturating_add(self.after_escape(usage))
    }

    pub fn before_escape(&self, usage: Usage) -> u32 {
        self.before_escape[usage.index()]
    }

    /// The live half. For a value that never escapes this holds every count.
    pub fn after_escape(&self, usage: Usage) -> u32 {
        self.after_escape[usage.index()]
    }
}
