// src/node/role.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which prefilled dataset a node serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    One,
    Two,
    Three,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::One => "one",
            Role::Two => "two",
            Role::Three => "three",
        }
    }

    /// Entries a node of this role is seeded with at startup.
    pub fn prefill(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Role::One => &[("a", "a value"), ("b", "b value"), ("c", "c value")],
            Role::Two => &[("a", "a value"), ("b", "b value")],
            Role::Three => &[("a", "a value")],
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::One
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Link from a node to the node it falls back on.
///
/// On the command line this is either the literal token `none` or a
/// decimal port on the loopback interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "PredecessorRepr", into = "PredecessorRepr")]
pub enum Predecessor {
    #[default]
    None,
    Port(u16),
}

pub const NO_PREDECESSOR: &str = "none";

impl Predecessor {
    pub fn port(&self) -> Option<u16> {
        match self {
            Predecessor::None => None,
            Predecessor::Port(port) => Some(*port),
        }
    }
}

impl fmt::Display for Predecessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predecessor::None => f.write_str(NO_PREDECESSOR),
            Predecessor::Port(port) => write!(f, "{}", port),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("predecessor must be `none` or a port number, got `{0}`")]
pub struct ParsePredecessorError(String);

impl FromStr for Predecessor {
    type Err = ParsePredecessorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == NO_PREDECESSOR {
            return Ok(Predecessor::None);
        }
        s.parse::<u16>()
            .ok()
            .filter(|port| *port != 0)
            .map(Predecessor::Port)
            .ok_or_else(|| ParsePredecessorError(s.to_string()))
    }
}

// YAML/JSON accept either `none` or a bare number.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PredecessorRepr {
    Port(u16),
    Token(String),
}

impl TryFrom<PredecessorRepr> for Predecessor {
    type Error = ParsePredecessorError;

    fn try_from(repr: PredecessorRepr) -> Result<Self, Self::Error> {
        match repr {
            PredecessorRepr::Port(port) => Predecessor::from_str(&port.to_string()),
            PredecessorRepr::Token(token) => Predecessor::from_str(&token),
        }
    }
}

impl From<Predecessor> for PredecessorRepr {
    fn from(p: Predecessor) -> Self {
        match p {
            Predecessor::None => PredecessorRepr::Token(NO_PREDECESSOR.to_string()),
            Predecessor::Port(port) => PredecessorRepr::Port(port),
        }
    }
}
