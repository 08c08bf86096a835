//! Wire models for the directory API
//!
//! Field names follow the backend's camelCase JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Member identifier
pub type MemberId = i64;

/// Publication identifier
pub type PublicationId = i64;

/// A research-group member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// Rich-text (HTML) profile description
    #[serde(default)]
    pub description: Option<String>,
    /// Relative reference under the uploads base, if a photo was uploaded
    #[serde(default)]
    pub photo_path: Option<String>,
    #[serde(default)]
    pub cited_by_count: i64,
    #[serde(default)]
    pub works_count: i64,
}

/// A publication owned by a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub id: PublicationId,
    pub title: String,
    #[serde(default)]
    pub identifier_url: Option<String>,
    #[serde(default)]
    pub cited_by_count: i64,
    /// Free-text author list
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub publication_year: Option<i32>,
    #[serde(rename = "type", default)]
    pub publication_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source_name: Option<String>,
}

/// A conference attended by a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conference {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /members/{id}/conferences`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConference {
    pub name: String,
    pub year: i32,
    pub location: String,
    pub description: String,
}

/// Body of `PUT /members/{id}`; absent fields are left unchanged server-side
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
}

impl MemberUpdate {
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            photo_path: None,
        }
    }
}

/// A window over a server-side collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl Page<Publication> {
    /// Replace the publication with the same id, leaving pagination metadata alone.
    ///
    /// Returns whether an element was replaced.
    pub fn replace_item(&mut self, updated: &Publication) -> bool {
        match self.content.iter_mut().find(|p| p.id == updated.id) {
            Some(slot) => {
                *slot = updated.clone();
                true
            }
            None => false,
        }
    }

    pub fn find(&self, id: PublicationId) -> Option<&Publication> {
        self.content.iter().find(|p| p.id == id)
    }
}

/// Type and tag vocabulary currently in use for a member's publications
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationMetadata {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One bar of the yearly works chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCount {
    /// Year as sent by the backend (a string on the wire)
    pub year: String,
    pub count: u64,
}

/// Sort chart data ascending by numeric year; unparseable years go last.
pub fn sort_year_counts(counts: &mut [YearCount]) {
    counts.sort_by_key(|c| c.year.trim().parse::<i64>().unwrap_or(i64::MAX));
}

/// Photo file for `POST /members/{id}/upload-photo`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    /// Build an upload, guessing the MIME type from the file extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = content_type_for(&file_name).to_string();
        Self {
            file_name,
            content_type,
            bytes,
        }
    }
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// External provider used to import a new member
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    #[default]
    OpenAlex,
    SerpApi,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::OpenAlex => "openalex",
            ProviderType::SerpApi => "serpapi",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openalex" => Ok(ProviderType::OpenAlex),
            "serpapi" => Ok(ProviderType::SerpApi),
            _ => Err(ParseEnumError {
                kind: "provider type",
                value: s.to_string(),
            }),
        }
    }
}

/// Sort modes accepted by the publications endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicationSort {
    /// Year, newest first
    #[default]
    #[serde(rename = "publicationYear")]
    YearDesc,
    /// Year, oldest first
    #[serde(rename = "publicationYearAsc")]
    YearAsc,
    /// Citations, highest first
    #[serde(rename = "citedByCount")]
    CitationsDesc,
    /// Citations, lowest first
    #[serde(rename = "citedByCountAsc")]
    CitationsAsc,
    /// Backend default ordering
    #[serde(rename = "id")]
    Id,
}

impl PublicationSort {
    pub const ALL: [PublicationSort; 5] = [
        PublicationSort::YearDesc,
        PublicationSort::YearAsc,
        PublicationSort::CitationsDesc,
        PublicationSort::CitationsAsc,
        PublicationSort::Id,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationSort::YearDesc => "publicationYear",
            PublicationSort::YearAsc => "publicationYearAsc",
            PublicationSort::CitationsDesc => "citedByCount",
            PublicationSort::CitationsAsc => "citedByCountAsc",
            PublicationSort::Id => "id",
        }
    }

    /// Year sorts fetch the whole list and render it grouped by year
    pub fn is_year_based(&self) -> bool {
        matches!(self, PublicationSort::YearDesc | PublicationSort::YearAsc)
    }

    /// Oldest or lowest first
    pub fn is_ascending(&self) -> bool {
        matches!(self, PublicationSort::YearAsc | PublicationSort::CitationsAsc)
    }

    /// Human-readable label for pickers
    pub fn label(&self) -> &'static str {
        match self {
            PublicationSort::YearDesc => "Year (Newest First)",
            PublicationSort::YearAsc => "Year (Oldest First)",
            PublicationSort::CitationsDesc => "Citations (Highest First)",
            PublicationSort::CitationsAsc => "Citations (Lowest First)",
            PublicationSort::Id => "Default (ID)",
        }
    }
}

impl fmt::Display for PublicationSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublicationSort {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicationSort::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s.trim())
            .ok_or_else(|| ParseEnumError {
                kind: "publication sort",
                value: s.to_string(),
            })
    }
}

/// Unknown wire value for one of the enums above
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}
