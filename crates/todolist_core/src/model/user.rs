//! Caller identity and session context.
//!
//! User records are created by the external identity provider. This crate
//! only reads the opaque id it supplies with every request.

use crate::model::todo::TodoValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque, stable user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Parses a provider-issued id, rejecting blank values.
    ///
    /// Non-blank ids are kept byte for byte; `" u-1"` and `"u-1"` are
    /// different users.
    pub fn parse(value: impl Into<String>) -> Result<Self, TodoValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(TodoValidationError::BlankUserId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request-scoped session attached by the identity provider.
///
/// An absent user means the caller is not signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<UserId>,
}

impl Session {
    /// Session for a signed-in caller.
    pub fn authenticated(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
        }
    }

    /// Session with no signed-in caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Builds a session from the raw id a transport layer carries.
    ///
    /// Missing or blank ids produce an anonymous session rather than an
    /// error: the identity provider never issues blank ids.
    pub fn from_raw(user_id: Option<&str>) -> Self {
        match user_id.map(UserId::parse) {
            Some(Ok(user_id)) => Self::authenticated(user_id),
            _ => Self::anonymous(),
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}
