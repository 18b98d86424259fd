//! Sharing Decisions
//!
//! The binary ground-truth label and the three-valued estimate produced by models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a content item is shared across a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharingDecision {
    Deny,
    Permit,
}

impl SharingDecision {
    /// Number of distinct decision values; the side length of a confusion matrix.
    pub const COUNT: usize = 2;

    /// Numeric encoding: DENY = 0, PERMIT = 1.
    pub fn index(self) -> usize {
        match self {
            SharingDecision::Deny => 0,
            SharingDecision::Permit => 1,
        }
    }

    /// Decodes the numeric encoding. Anything other than 0 or 1 is unknown.
    pub fn from_index(value: i64) -> Option<Self> {
        match value {
            0 => Some(SharingDecision::Deny),
            1 => Some(SharingDecision::Permit),
            _ => None,
        }
    }

    /// Decision value used as a learning signal.
    pub fn as_f64(self) -> f64 {
        self.index() as f64
    }

    pub fn opposite(self) -> Self {
        match self {
            SharingDecision::Deny => SharingDecision::Permit,
            SharingDecision::Permit => SharingDecision::Deny,
        }
    }
}

impl fmt::Display for SharingDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharingDecision::Deny => write!(f, "DENY"),
            SharingDecision::Permit => write!(f, "PERMIT"),
        }
    }
}

/// An estimated decision. Models may decline to call it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Deny,
    Permit,
    /// Confidence fell inside the band around the model's average
    Undecidable,
}

impl Decision {
    /// The binary decision, if one was made.
    pub fn decided(self) -> Option<SharingDecision> {
        match self {
            Decision::Deny => Some(SharingDecision::Deny),
            Decision::Permit => Some(SharingDecision::Permit),
            Decision::Undecidable => None,
        }
    }

    pub fn is_undecidable(self) -> bool {
        matches!(self, Decision::Undecidable)
    }
}

impl From<SharingDecision> for Decision {
    fn from(decision: SharingDecision) -> Self {
        match decision {
            SharingDecision::Deny => Decision::Deny,
            SharingDecision::Permit => Decision::Permit,
        }
    }
}

impl PartialEq<SharingDecision> for Decision {
    fn eq(&self, other: &SharingDecision) -> bool {
        self.decided() == Some(*other)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Deny => write!(f, "DENY"),
            Decision::Permit => write!(f, "PERMIT"),
            Decision::Undecidable => write!(f, "UNDECIDABLE"),
        }
    }
}
