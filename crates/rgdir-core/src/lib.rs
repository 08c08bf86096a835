//! rgdir-core - front-end state for the research-group directory
//!
//! - **Cache**: keyed query results with request deduplication and
//!   prefix invalidation
//! - **Listing**: sort, filters, page size, and the query they produce
//! - **View**: year-grouped accordion or flat paginated list
//! - **Editors**: publication tag/type editor, conference and profile forms
//! - **Directory**: cached reads and mutations that keep the cache in step
//!   with the backend
//!
//! ```ignore
//! use rgdir_api::{ApiClient, ClientConfig};
//! use rgdir_core::{CacheConfig, Directory, ListingState};
//!
//! let api = ApiClient::new(&ClientConfig::default())?;
//! let directory = Directory::new(api, CacheConfig::default());
//! let detail = directory.load_detail(4, &ListingState::new(), None).await;
//! ```

pub mod cache;
pub mod config;
pub mod directory;
pub mod editor;
pub mod error;
pub mod forms;
pub mod grouping;
pub mod keys;
pub mod listing;
pub mod view;

pub use cache::{CacheEvent, FetchOptions, QueryCache};
pub use config::{CacheConfig, ConfigLoadError, DirectoryConfig};
pub use directory::{Directory, DirectoryCache, MemberDetail, QueryData};
pub use editor::{EditSession, EditorState, PublicationEditor, SavePlan, DEFAULT_TYPE};
pub use error::{DirectoryError, EditorError, Result};
pub use forms::{has_visible_text, plain_text, ConferenceForm, ProfileForm, ProfilePlan};
pub use grouping::{group_by_year, year_label, YearGroups, YearOrder, UNKNOWN_YEAR};
pub use keys::QueryKey;
pub use listing::{ListingState, DEFAULT_PAGE_SIZE, PAGE_SIZE_CHOICES, UNBOUNDED_PAGE_SIZE};
pub use view::PublicationView;
