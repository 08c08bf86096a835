//! Tag and type editor for a single publication
//!
//! State transitions:
//! ```text
//! Closed → Editing → Saving → Closed
//!             ↑         │
//!             └─(error)─┘
//! ```
//!
//! The working copy is a separate snapshot from the committed values. Saving
//! only sends what actually differs: tags compared as sets, type compared as
//! a string.

use std::collections::BTreeSet;

use rgdir_api::{Publication, PublicationId};

use crate::error::EditorError;

/// Type shown in the editor for publications that have none
pub const DEFAULT_TYPE: &str = "other";

/// Committed values plus the user's working copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSession {
    publication_id: PublicationId,
    committed_tags: Vec<String>,
    committed_type: Option<String>,
    working_tags: Vec<String>,
    working_type: String,
    error: Option<String>,
}

impl EditSession {
    fn open(publication: &Publication) -> Self {
        let committed_type = publication.publication_type.clone();
        Self {
            publication_id: publication.id,
            committed_tags: publication.tags.clone(),
            working_tags: dedup_preserving_order(&publication.tags),
            working_type: committed_type
                .clone()
                .unwrap_or_else(|| DEFAULT_TYPE.to_string()),
            committed_type,
            error: None,
        }
    }

    pub fn publication_id(&self) -> PublicationId {
        self.publication_id
    }

    pub fn committed_tags(&self) -> &[String] {
        &self.committed_tags
    }

    pub fn committed_type(&self) -> Option<&str> {
        self.committed_type.as_deref()
    }

    pub fn working_tags(&self) -> &[String] {
        &self.working_tags
    }

    pub fn working_type(&self) -> &str {
        &self.working_type
    }

    /// Message from the last failed save
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn tags_changed(&self) -> bool {
        as_set(&self.committed_tags) != as_set(&self.working_tags)
    }

    pub fn type_changed(&self) -> bool {
        let committed = self.committed_type.as_deref().unwrap_or(DEFAULT_TYPE);
        committed != self.working_type
    }

    /// Calls a save would make right now
    pub fn plan(&self) -> SavePlan {
        SavePlan {
            publication_id: self.publication_id,
            tags: self.tags_changed().then(|| self.working_tags.clone()),
            publication_type: self.type_changed().then(|| self.working_type.clone()),
        }
    }
}

/// Mutations to dispatch for one save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePlan {
    pub publication_id: PublicationId,
    /// New tag list, when the tag set changed
    pub tags: Option<Vec<String>>,
    /// New type, when it changed
    pub publication_type: Option<String>,
}

impl SavePlan {
    pub fn is_empty(&self) -> bool {
        self.tags.is_none() && self.publication_type.is_none()
    }

    /// Number of update calls this plan makes
    pub fn call_count(&self) -> usize {
        usize::from(self.tags.is_some()) + usize::from(self.publication_type.is_some())
    }
}

/// Editor lifecycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditorState {
    #[default]
    Closed,
    Editing(EditSession),
    Saving(EditSession),
}

/// Editor for one open publication at a time
#[derive(Debug, Clone, Default)]
pub struct PublicationEditor {
    state: EditorState,
}

impl PublicationEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, EditorState::Closed)
    }

    pub fn is_saving(&self) -> bool {
        matches!(self.state, EditorState::Saving(_))
    }

    /// Current session, whether editing or saving
    pub fn session(&self) -> Option<&EditSession> {
        match &self.state {
            EditorState::Closed => None,
            EditorState::Editing(session) | EditorState::Saving(session) => Some(session),
        }
    }

    fn editing(&mut self) -> Result<&mut EditSession, EditorError> {
        match &mut self.state {
            EditorState::Editing(session) => Ok(session),
            EditorState::Saving(_) => Err(EditorError::SaveInProgress),
            EditorState::Closed => Err(EditorError::NotEditing),
        }
    }

    /// Start editing `publication`, replacing any unsaved session
    pub fn open(&mut self, publication: &Publication) -> Result<(), EditorError> {
        if self.is_saving() {
            return Err(EditorError::SaveInProgress);
        }
        self.state = EditorState::Editing(EditSession::open(publication));
        Ok(())
    }

    /// Add a tag from user input. Blank input and duplicates are ignored.
    ///
    /// Returns whether the working set changed.
    pub fn add_tag(&mut self, input: &str) -> Result<bool, EditorError> {
        let session = self.editing()?;
        let tag = input.trim();
        if tag.is_empty() || session.working_tags.iter().any(|t| t == tag) {
            return Ok(false);
        }
        session.working_tags.push(tag.to_string());
        Ok(true)
    }

    /// Returns whether the working set changed
    pub fn remove_tag(&mut self, tag: &str) -> Result<bool, EditorError> {
        let session = self.editing()?;
        let before = session.working_tags.len();
        session.working_tags.retain(|t| t != tag);
        Ok(session.working_tags.len() != before)
    }

    pub fn set_type(&mut self, publication_type: &str) -> Result<(), EditorError> {
        let session = self.editing()?;
        session.working_type = publication_type.trim().to_string();
        Ok(())
    }

    /// Move to `Saving` and return the calls to make
    pub fn begin_save(&mut self) -> Result<SavePlan, EditorError> {
        let session = match std::mem::take(&mut self.state) {
            EditorState::Editing(session) => session,
            other => {
                let err = match other {
                    EditorState::Saving(_) => EditorError::SaveInProgress,
                    _ => EditorError::NotEditing,
                };
                self.state = other;
                return Err(err);
            }
        };
        let plan = session.plan();
        self.state = EditorState::Saving(EditSession {
            error: None,
            ..session
        });
        Ok(plan)
    }

    /// Record a server-confirmed publication during a save, so a retry after a
    /// partial failure only resends what is still different.
    pub fn commit(&mut self, updated: &Publication) {
        if let EditorState::Saving(session) = &mut self.state {
            if session.publication_id == updated.id {
                session.committed_tags = updated.tags.clone();
                session.committed_type = updated.publication_type.clone();
            }
        }
    }

    /// Close on success; on failure return to `Editing` keeping the working
    /// copy and the error message.
    pub fn finish_save(&mut self, outcome: Result<(), String>) -> Result<(), EditorError> {
        let session = match std::mem::take(&mut self.state) {
            EditorState::Saving(session) => session,
            other => {
                self.state = other;
                return Err(EditorError::NotSaving);
            }
        };
        self.state = match outcome {
            Ok(()) => EditorState::Closed,
            Err(message) => EditorState::Editing(EditSession {
                error: Some(message),
                ..session
            }),
        };
        Ok(())
    }

    /// Discard the working copy
    pub fn cancel(&mut self) -> Result<(), EditorError> {
        if self.is_saving() {
            return Err(EditorError::SaveInProgress);
        }
        self.state = EditorState::Closed;
        Ok(())
    }
}

fn as_set(tags: &[String]) -> BTreeSet<&str> {
    tags.iter().map(String::as_str).collect()
}

fn dedup_preserving_order(tags: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tags.iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}
