//! Config locations and their loading policies
//!
//! Locations are totally ordered from lowest to highest precedence. A value
//! set at a higher location shadows the same key at every lower location.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Internal,
    Default,
    Builtin,
    Global,
    User,
    Project,
    Env,
    Cli,
}

/// Per-location policy flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationOptions {
    pub description: &'static str,
    /// Deprecated keys are accepted silently instead of warning.
    pub allow_deprecated: bool,
    /// Invalid items are a hard error instead of a dropped warning.
    pub throw: bool,
    /// Unknown keys are dropped. When false, an unknown key is an error.
    pub remove_unknown: bool,
    /// Run the legacy auth shape checks in `validate`.
    pub validate_auth: bool,
    /// Permission mode used when the location's file is written.
    pub mode: u32,
}

impl LocationOptions {
    const BASE: Self = Self {
        description: "",
        allow_deprecated: false,
        throw: false,
        remove_unknown: true,
        validate_auth: false,
        mode: 0o666,
    };
}

impl Location {
    /// All locations, lowest precedence first.
    pub const ALL: [Location; 8] = [
        Location::Internal,
        Location::Default,
        Location::Builtin,
        Location::Global,
        Location::User,
        Location::Project,
        Location::Env,
        Location::Cli,
    ];

    /// Position in the precedence order.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Default => "default",
            Self::Builtin => "builtin",
            Self::Global => "global",
            Self::User => "user",
            Self::Project => "project",
            Self::Env => "env",
            Self::Cli => "cli",
        }
    }

    pub fn options(self) -> LocationOptions {
        match self {
            Self::Internal => LocationOptions {
                description: "internal runtime facts",
                allow_deprecated: true,
                throw: true,
                remove_unknown: false,
                ..LocationOptions::BASE
            },
            Self::Default => LocationOptions {
                description: "default values",
                allow_deprecated: true,
                throw: true,
                remove_unknown: false,
                ..LocationOptions::BASE
            },
            Self::Builtin => LocationOptions {
                description: "builtin config",
                validate_auth: true,
                ..LocationOptions::BASE
            },
            Self::Global => LocationOptions {
                description: "global config",
                validate_auth: true,
                ..LocationOptions::BASE
            },
            Self::User => LocationOptions {
                description: "user config",
                validate_auth: true,
                mode: 0o600,
                ..LocationOptions::BASE
            },
            Self::Project => LocationOptions {
                description: "project config",
                validate_auth: true,
                ..LocationOptions::BASE
            },
            Self::Env => LocationOptions {
                description: "environment",
                ..LocationOptions::BASE
            },
            Self::Cli => LocationOptions {
                description: "command line options",
                throw: true,
                ..LocationOptions::BASE
            },
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| Error::InvalidLocation {
                location: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_is_lowest_to_highest() {
        assert!(Location::Internal < Location::Default);
        assert!(Location::User < Location::Project);
        assert!(Location::Env < Location::Cli);
        for (i, l) in Location::ALL.iter().enumerate() {
            assert_eq!(l.index(), i);
        }
    }

    #[test]
    fn parse_round_trips_names() {
        for l in Location::ALL {
            assert_eq!(l.as_str().parse::<Location>().unwrap(), l);
        }
        assert!("workspace".parse::<Location>().is_err());
    }

    #[test]
    fn user_files_are_private() {
        assert_eq!(Location::User.options().mode, 0o600);
        assert_eq!(Location::Global.options().mode, 0o666);
        assert!(Location::Cli.options().throw);
        assert!(!Location::Default.options().remove_unknown);
    }
}
