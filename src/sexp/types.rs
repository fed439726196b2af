//! Type tags for host runtime values
//!
//! The host taxonomy uses small integer codes; the tracer adds a few synthetic tags for
//! states that have no runtime object of their own (an unbound variable, a missing
//! argument, a slot that was never filled in, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type tag of a host value, or a synthetic tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SexpType {
    Null,
    Symbol,
    Pairlist,
    Closure,
    Environment,
    Promise,
    Language,
    Special,
    Builtin,
    Char,
    Logical,
    Integer,
    Double,
    Complex,
    String,
    Dot,
    Any,
    List,
    Expression,
    Bytecode,
    ExternalPointer,
    WeakReference,
    Raw,
    S4,
    New,
    Free,
    Function,
    /// Catch-all used by host tools for "any other type"
    Omega,
    /// Active binding
    Active,
    /// Variable without a binding
    Unbound,
    /// Slot or field that has not been filled in yet
    Unassigned,
    /// Missing argument
    Missing,
    /// Non-local control transfer instead of a value
    Jump,
    /// Host code with no known meaning
    Unknown,
}

impl SexpType {
    pub const OMEGA_CODE: u32 = 54;
    pub const ACTIVE_CODE: u32 = 69;
    pub const UNBOUND_CODE: u32 = 71;
    pub const UNASSIGNED_CODE: u32 = 72;
    pub const MISSING_CODE: u32 = 73;
    pub const JUMP_CODE: u32 = 74;
    pub const UNKNOWN_CODE: u32 = 255;

    /// Map a host type code to its tag. Unrecognised codes map to [`SexpType::Unknown`].
    pub fn from_code(code: u32) -> Self {
        use SexpType::*;
        match code {
            0 => Null,
            1 => Symbol,
            2 => Pairlist,
            3 => Closure,
            4 => Environment,
            5 => Promise,
            6 => Language,
            7 => Special,
            8 => Builtin,
            9 => Char,
            10 => Logical,
            13 => Integer,
            14 => Double,
            15 => Complex,
            16 => String,
            17 => Dot,
            18 => Any,
            19 => List,
            20 => Expression,
            21 => Bytecode,
            22 => ExternalPointer,
            23 => WeakReference,
            24 => Raw,
            25 => S4,
            30 => New,
            31 => Free,
            99 => Function,
            Self::OMEGA_CODE => Omega,
            Self::ACTIVE_CODE => Active,
            Self::UNBOUND_CODE => Unbound,
            Self::UNASSIGNED_CODE => Unassigned,
            Self::MISSING_CODE => Missing,
            Self::JUMP_CODE => Jump,
            _ => Unknown,
        }
    }

    /// Numeric code of this tag
    pub fn code(self) -> u32 {
        use SexpType::*;
        match self {
            Null => 0,
            Symbol => 1,
            Pairlist => 2,
            Closure => 3,
            Environment => 4,
            Promise => 5,
            Language => 6,
            Special => 7,
            Builtin => 8,
            Char => 9,
            Logical => 10,
            Integer => 13,
            Double => 14,
            Complex => 15,
            String => 16,
            Dot => 17,
            Any => 18,
            List => 19,
            Expression => 20,
            Bytecode => 21,
            ExternalPointer => 22,
            WeakReference => 23,
            Raw => 24,
            S4 => 25,
            New => 30,
            Free => 31,
            Function => 99,
            Omega => Self::OMEGA_CODE,
            Active => Self::ACTIVE_CODE,
            Unbound => Self::UNBOUND_CODE,
            Unassigned => Self::UNASSIGNED_CODE,
            Missing => Self::MISSING_CODE,
            Jump => Self::JUMP_CODE,
            Unknown => Self::UNKNOWN_CODE,
        }
    }

    /// Whether the tag is one of the tracer's synthetic tags rather than a host type
    pub fn is_synthetic(self) -> bool {
        matches!(
            self,
            SexpType::Omega
                | SexpType::Active
                | SexpType::Unbound
                | SexpType::Unassigned
                | SexpType::Missing
                | SexpType::Jump
                | SexpType::Unknown
        )
    }

    /// Human readable name
    pub fn name(self) -> &'static str {
        use SexpType::*;
        match self {
            Null => "Null",
            Symbol => "Symbol",
            Pairlist => "Pairlist",
            Closure => "Closure",
            Environment => "Environment",
            Promise => "Promise",
            Language => "Language",
            Special => "Special",
            Builtin => "Builtin",
            Char => "Character",
            Logical => "Logical",
            Integer => "Integer",
            Double => "Double",
            Complex => "Complex",
            String => "String",
            Dot => "Dot",
            Any => "Any",
            List => "List",
            Expression => "Expression",
            Bytecode => "Bytecode",
            ExternalPointer => "ExternalPointer",
            WeakReference => "WeakReference",
            Raw => "Raw",
            S4 => "S4",
            New => "New",
            Free => "Free",
            Function => "Function",
            Omega => "Omega",
            Active => "Active",
            Unbound => "Unbound",
            Unassigned => "Unassigned",
            Missing => "Missing",
            Jump => "Jump",
            Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SexpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_for_known_tags() {
        for code in (0..=31).chain([99, 54, 69, 71, 72, 73, 74]) {
            let tag = SexpType::from_code(code);
            if tag != SexpType::Unknown {
                assert_eq!(tag.code(), code);
            }
        }
    }

    #[test]
    fn test_unrecognised_codes_are_unknown() {
        assert_eq!(SexpType::from_code(11), SexpType::Unknown);
        assert_eq!(SexpType::from_code(12), SexpType::Unknown);
        assert_eq!(SexpType::from_code(1000), SexpType::Unknown);
        assert!(SexpType::Unknown.is_synthetic());
        assert!(!SexpType::Promise.is_synthetic());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(SexpType::Char.to_string(), "Character");
        assert_eq!(SexpType::Double.to_string(), "Double");
        assert_eq!(SexpType::Unassigned.to_string(), "Unassigned");
    }
}
