//! Principals and the role guard.
//!
//! Authentication itself happens outside this crate; callers hand in an explicit
//! [`Principal`] for every operation. The role is checked once, when a new
//! calculation workflow starts. Nothing below that entry point looks at roles.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role as stored in the user's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Registered but not yet verified
    Invitado,
    /// Verified account, allowed to create calculations
    Verificado,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invitado => write!(f, "Invitado"),
            Self::Verificado => write!(f, "Verificado"),
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Invitado" => Ok(Self::Invitado),
            "Verificado" => Ok(Self::Verificado),
            other => Err(Error::Config {
                message: format!("Unknown role '{other}'"),
            }),
        }
    }
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Opaque user id from the authentication provider
    pub id: String,
    /// Profile role
    pub role: Role,
}

impl Principal {
    /// Creates a principal.
    #[must_use]
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

/// Returns the owner id of an authenticated principal.
///
/// # Errors
/// [`Error::Unauthenticated`] when the id is blank.
pub fn ensure_authenticated(principal: &Principal) -> Result<&str> {
    let id = principal.id.trim();
    if id.is_empty() {
        return Err(Error::Unauthenticated);
    }
    Ok(id)
}

/// Allows only verified principals to start a new calculation.
///
/// # Errors
/// [`Error::Unauthenticated`] for a blank id, [`Error::Forbidden`] for any role
/// other than [`Role::Verificado`].
pub fn ensure_can_calculate(principal: &Principal) -> Result<()> {
    ensure_authenticated(principal)?;
    match principal.role {
        Role::Verificado => Ok(()),
        Role::Invitado => Err(Error::Forbidden {
            role: principal.role.to_string(),
        }),
    }
}
