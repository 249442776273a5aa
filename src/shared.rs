//! NB. This file is shared between library and proc-macro crates.
use std::fmt;

/// The three per-field annotation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Annotation {
    /// `argtag("<kind>,<param>...")`, describing how the field maps to tokens.
    Primary,
    /// `argtag_help("...")`, the help line of the field.
    Help,
    /// `argtag_default("...")`, the default value literal.
    Default,
}

impl Annotation {
    pub const ALL: [Self; 3] = [Self::Primary, Self::Help, Self::Default];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Primary => "argtag",
            Self::Help => "argtag_help",
            Self::Default => "argtag_default",
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
