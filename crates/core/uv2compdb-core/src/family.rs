//! Supported compiler families.
//!
//! Everything that differs between toolchains hangs off [`Family`]: the
//! project-schema dialect, whether a `.dep` record is produced, the
//! argument policy, and how built-in macros are discovered.

use std::fmt;

use uvproj::Dialect;

use crate::policy::{self, ArgRule};

/// How a family's predefined macros are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroQuery {
    /// Synthesised from a fixed table; no process is started.
    Static,
    /// The compiler is run with these flags appended to the file's
    /// arguments and its `#define` listing is parsed.
    Invoke(&'static [&'static str]),
}

/// A supported toolchain family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Keil C51 for 8051 devices.
    C51,
    /// ARM Compiler 5 (`armcc`).
    ArmCc,
    /// ARM Compiler 6 (`armclang`).
    ArmClang,
}

impl Family {
    /// Maps `ToolsetNumber ++ uAC6` to a family.
    #[must_use]
    pub fn from_toolset_key(key: &str) -> Option<Self> {
        match key {
            "0x00" => Some(Self::C51),
            "0x40" => Some(Self::ArmCc),
            "0x41" => Some(Self::ArmClang),
            _ => None,
        }
    }

    /// Classifies a compiler executable name, case-insensitively.
    #[must_use]
    pub fn from_compiler_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if name.contains("c51") {
            Some(Self::C51)
        } else if name.contains("armclang") {
            Some(Self::ArmClang)
        } else if name.contains("armcc") {
            Some(Self::ArmCc)
        } else {
            None
        }
    }

    /// Schema section holding this family's flag fragments.
    #[must_use]
    pub fn dialect(self) -> Dialect {
        match self {
            Self::C51 => Dialect::C51,
            Self::ArmCc | Self::ArmClang => Dialect::Arm,
        }
    }

    /// Whether builds leave a `.dep` record with the real arguments.
    #[must_use]
    pub fn has_dependency_record(self) -> bool {
        matches!(self, Self::ArmCc | Self::ArmClang)
    }

    /// Executable name looked up on the search path.
    #[must_use]
    pub fn nominal_compiler(self) -> &'static str {
        match self {
            Self::C51 => "c51",
            Self::ArmCc => "armcc",
            Self::ArmClang => "armclang",
        }
    }

    /// Assembler executable name.
    #[must_use]
    pub fn nominal_assembler(self) -> &'static str {
        match self {
            Self::C51 => "a51",
            Self::ArmCc | Self::ArmClang => "armasm",
        }
    }

    /// Tokens to strip from the emitted command.
    #[must_use]
    pub fn unknown_args(self) -> &'static [ArgRule] {
        match self {
            Self::ArmCc => policy::ARMCC_UNKNOWN_ARGS,
            Self::C51 | Self::ArmClang => &[],
        }
    }

    /// How predefined macros are discovered.
    #[must_use]
    pub fn macro_query(self) -> MacroQuery {
        match self {
            Self::C51 => MacroQuery::Static,
            Self::ArmCc => MacroQuery::Invoke(&["--list_macros"]),
            Self::ArmClang => {
                MacroQuery::Invoke(&["--target=arm-arm-none-eabi", "-dM", "-E", "-"])
            }
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nominal_compiler())
    }
}
