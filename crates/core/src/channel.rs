//! Release Channels
//!
//! The runtime is published on a fixed set of release tracks. The order of
//! [`Channel::ALL`] is the preference order used when searching for a
//! version without an explicit channel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Channel errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("Unknown channel '{0}' (expected stable, beta or canary)")]
    Unknown(String),
}

/// Release channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Stable,
    Beta,
    Canary,
}

impl Channel {
    /// All channels, most preferred first
    pub const ALL: [Channel; 3] = [Channel::Stable, Channel::Beta, Channel::Canary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Stable => "stable",
            Channel::Beta => "beta",
            Channel::Canary => "canary",
        }
    }

    /// Next channel in preference order, `None` after the last one
    pub fn next(&self) -> Option<Channel> {
        match self {
            Channel::Stable => Some(Channel::Beta),
            Channel::Beta => Some(Channel::Canary),
            Channel::Canary => None,
        }
    }
}

impl FromStr for Channel {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(Channel::Stable),
            "beta" => Ok(Channel::Beta),
            "canary" => Ok(Channel::Canary),
            other => Err(ChannelError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
