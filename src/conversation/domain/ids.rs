//! Identifier newtypes for sessions, messages, notes, templates and operators.
//!
//! Record identifiers wrap UUIDs so a message id can never be passed where a
//! session id is expected. Operator identities come from the external auth
//! layer and are kept as validated strings.

use super::ConversationDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier of a chat session.
    ///
    /// # Examples
    ///
    /// ```
    /// use switchboard::conversation::domain::SessionId;
    ///
    /// let id = SessionId::new();
    /// assert!(!id.as_ref().is_nil());
    /// ```
    SessionId
);

uuid_identifier!(
    /// Unique identifier of a message within a session log.
    MessageId
);

uuid_identifier!(
    /// Unique identifier of an internal operator note.
    NoteId
);

uuid_identifier!(
    /// Unique identifier of a template definition.
    TemplateId
);

/// Identity of a human operator, as resolved by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OperatorId(String);

impl OperatorId {
    /// Creates a validated operator identity.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationDomainError::InvalidOperatorId`] when the value
    /// is empty or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, ConversationDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(ConversationDomainError::InvalidOperatorId(raw));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the identity as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OperatorId {
    type Error = ConversationDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OperatorId> for String {
    fn from(value: OperatorId) -> Self {
        value.0
    }
}

impl AsRef<str> for OperatorId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
