//! Vote identifiers.
//!
//! A vote id names one electable thing: a witness candidacy, a committee
//! candidacy, a worker proposal (its "for" vote), or a SON candidacy. The
//! textual form is `kind:instance`, e.g. `1:47` for witness candidate 47.
//! Instances are allocated globally in creation order across all kinds, so
//! the tally buffer can be one dense array indexed by instance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The electable role a vote id refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VoteKind {
    Committee = 0,
    Witness = 1,
    Worker = 2,
    Son = 3,
}

impl VoteKind {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Committee),
            1 => Some(Self::Witness),
            2 => Some(Self::Worker),
            3 => Some(Self::Son),
            _ => None,
        }
    }
}

/// A single vote identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VoteId {
    pub kind: VoteKind,
    pub instance: u32,
}

impl VoteId {
    pub fn new(kind: VoteKind, instance: u32) -> Self {
        Self { kind, instance }
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind as u8, self.instance)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseVoteIdError {
    #[error("vote id must have the form kind:instance")]
    MissingSeparator,
    #[error("unknown vote kind {0}")]
    UnknownKind(u8),
    #[error("invalid number in vote id: {0}")]
    InvalidNumber(String),
}

impl FromStr for VoteId {
    type Err = ParseVoteIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, instance) = s
            .split_once(':')
            .ok_or(ParseVoteIdError::MissingSeparator)?;
        let kind: u8 = kind
            .parse()
            .map_err(|_| ParseVoteIdError::InvalidNumber(kind.to_string()))?;
        let instance: u32 = instance
            .parse()
            .map_err(|_| ParseVoteIdError::InvalidNumber(instance.to_string()))?;
        let kind = VoteKind::from_u8(kind).ok_or(ParseVoteIdError::UnknownKind(kind))?;
        Ok(Self { kind, instance })
    }
}
