//! Conference and profile forms with client-side validation
//!
//! A form that fails validation never reaches the network.

use lazy_static::lazy_static;
use regex::Regex;

use rgdir_api::{Member, NewConference, PhotoUpload};

use crate::error::{DirectoryError, Result};

lazy_static! {
    /// Paragraphs holding only a line break, left behind by rich-text editors
    static ref EMPTY_PARAGRAPH: Regex = Regex::new(r"<p><br\s*/?></p>").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"(?s)<.*?>").unwrap();
}

/// Raw input of the "add conference" dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConferenceForm {
    pub name: String,
    /// Year as typed
    pub year: String,
    pub location: String,
    pub description: String,
}

impl ConferenceForm {
    /// Check required fields and build the request body
    pub fn validate(&self) -> Result<NewConference> {
        let name = self.name.trim();
        let year = self.year.trim();
        if name.is_empty() || year.is_empty() {
            return Err(DirectoryError::validation(
                "Name and year are required fields.",
            ));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| DirectoryError::validation(format!("Year must be a number: {}", year)))?;

        Ok(NewConference {
            name: name.to_string(),
            year,
            location: self.location.trim().to_string(),
            description: self.description.trim().to_string(),
        })
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Raw input of the "edit profile" dialog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    /// Rich-text (HTML) description
    pub description: String,
    pub photo: Option<PhotoUpload>,
}

/// Calls to make for a profile save
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePlan {
    /// New description, when it differs from the committed one
    pub description: Option<String>,
    pub photo: Option<PhotoUpload>,
}

impl ProfilePlan {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.photo.is_none()
    }
}

impl ProfileForm {
    /// Form pre-filled with the member's current description
    pub fn for_member(member: &Member) -> Self {
        Self {
            description: member.description.clone().unwrap_or_default(),
            photo: None,
        }
    }

    /// Description with empty paragraphs removed
    pub fn cleaned_description(&self) -> String {
        EMPTY_PARAGRAPH.replace_all(&self.description, "").into_owned()
    }

    /// Validate against the committed description and work out what to send.
    ///
    /// Fails when there is neither visible description text nor a photo.
    pub fn plan(&self, committed_description: Option<&str>) -> Result<ProfilePlan> {
        let description = self.cleaned_description();
        if !has_visible_text(&description) && self.photo.is_none() {
            return Err(DirectoryError::validation(
                "Please write a description or select a photo.",
            ));
        }

        let changed = description != committed_description.unwrap_or_default();
        Ok(ProfilePlan {
            description: changed.then_some(description),
            photo: self.photo.clone(),
        })
    }
}

/// Text content of an HTML fragment, whitespace collapsed
pub fn plain_text(html: &str) -> String {
    HTML_TAG.replace_all(html, " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether HTML contains any text once tags are removed
pub fn has_visible_text(html: &str) -> bool {
    !plain_text(html).is_empty()
}
