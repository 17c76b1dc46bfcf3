use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Who authored or committed a change.
///
/// Rendered as `Name <email>` inside commit bodies. Neither part may contain
/// angle brackets or line breaks, since those would make the rendered line
/// ambiguous.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// Create a validated identity.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, TypeError> {
        let identity = Self {
            name: name.into(),
            email: email.into(),
        };
        identity.validate()?;
        Ok(identity)
    }

    /// Check that both fields can be rendered unambiguously.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.name.trim().is_empty() {
            return Err(TypeError::InvalidIdentity("name is empty".into()));
        }
        for (field, value) in [("name", &self.name), ("email", &self.email)] {
            if value.contains(['<', '>', '\n', '\0']) {
                return Err(TypeError::InvalidIdentity(format!(
                    "{field} contains a reserved character: {value:?}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({self})")
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

impl FromStr for Identity {
    type Err = TypeError;

    /// Parse `Name <email>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rest) = s
            .split_once(" <")
            .ok_or_else(|| TypeError::InvalidIdentity(format!("missing email in {s:?}")))?;
        let email = rest
            .strip_suffix('>')
            .ok_or_else(|| TypeError::InvalidIdentity(format!("unterminated email in {s:?}")))?;
        Self::new(name, email)
    }
}
