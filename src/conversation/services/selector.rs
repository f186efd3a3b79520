//! Tracks which session an operator has open.

use crate::conversation::domain::SessionId;
use thiserror::Error;

/// Raised when an action needs a selected session and none is open.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("no session is selected")]
pub struct NoActiveSession;

/// Holds at most one selected session id.
///
/// Selection is not validated against the store; an unknown id simply
/// resolves to an empty log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSelector {
    selected: Option<SessionId>,
}

impl SessionSelector {
    /// Creates a selector with nothing selected.
    #[must_use]
    pub const fn new() -> Self {
        Self { selected: None }
    }

    /// Replaces the selection. `None` closes the open session.
    pub const fn select(&mut self, id: Option<SessionId>) {
        self.selected = id;
    }

    /// Returns the selected id, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<SessionId> {
        self.selected
    }

    /// Returns `true` when `id` is the open session.
    #[must_use]
    pub fn is_selected(&self, id: SessionId) -> bool {
        self.selected == Some(id)
    }

    /// Returns the selected id.
    ///
    /// # Errors
    ///
    /// Returns [`NoActiveSession`] when nothing is selected.
    pub const fn require(&self) -> Result<SessionId, NoActiveSession> {
        match self.selected {
            Some(id) => Ok(id),
            None => Err(NoActiveSession),
        }
    }
}
