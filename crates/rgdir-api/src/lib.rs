//! rgdir-api - typed client for the research-group directory API
//!
//! - **Models**: members, publications, conferences, pages, metadata
//! - **Client**: one async call per backend endpoint, no retries
//! - **Config**: base URL, uploads URL, timeout; TOML/JSON/env loading
//!
//! The [`DirectoryApi`] trait is the seam the core crate programs against;
//! [`ApiClient`] implements it over HTTP.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod traits;

pub use client::{check_response, ApiClient};
pub use config::{ClientConfig, ConfigError};
pub use error::{ApiError, Result};
pub use models::{
    sort_year_counts, Conference, Member, MemberId, MemberUpdate, NewConference, Page,
    ParseEnumError, PhotoUpload, ProviderType, Publication, PublicationId, PublicationMetadata,
    PublicationSort, YearCount,
};
pub use traits::{DirectoryApi, MemberListQuery, PublicationQuery};
