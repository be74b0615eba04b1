//! Strand orientation for genomic features.

use std::fmt;

use serde::Serialize;

/// Strand orientation of a genomic feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Strand {
    #[default]
    Forward,
    Reverse,
}

impl Strand {
    /// Strand of a GenBank location: `complement(...)` is reverse; everything else is forward.
    #[must_use]
    pub fn from_complement(complement: bool) -> Self {
        if complement {
            Self::Reverse
        } else {
            Self::Forward
        }
    }

    #[must_use]
    pub fn is_reverse(self) -> bool {
        self == Self::Reverse
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "+"),
            Self::Reverse => write!(f, "-"),
        }
    }
}
