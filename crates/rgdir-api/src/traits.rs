//! The directory API as seen by callers
//!
//! [`crate::ApiClient`] is the HTTP implementation. Anything else that can
//! answer these calls (an in-memory fake, a recording proxy) can stand in.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Conference, Member, MemberId, MemberUpdate, NewConference, Page, PhotoUpload, ProviderType,
    Publication, PublicationId, PublicationMetadata, PublicationSort, YearCount,
};

/// Parameters of `GET /members/{id}/publications`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PublicationQuery {
    pub member_id: MemberId,
    /// 0-based page index
    pub page: u32,
    pub size: u32,
    pub sort: PublicationSort,
    /// Type filter, sorted and deduplicated
    pub types: Vec<String>,
    /// Tag filter, sorted and deduplicated
    pub tags: Vec<String>,
}

impl PublicationQuery {
    pub fn new(member_id: MemberId) -> Self {
        Self {
            member_id,
            page: 0,
            size: 10,
            sort: PublicationSort::Id,
            types: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Query-string pairs, with one `types`/`tags` pair per filter value
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
            ("sort", self.sort.as_str().to_string()),
        ];
        pairs.extend(self.types.iter().map(|t| ("types", t.clone())));
        pairs.extend(self.tags.iter().map(|t| ("tags", t.clone())));
        pairs
    }
}

/// Parameters of `GET /members`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberListQuery {
    pub page: u32,
    pub size: u32,
    pub sort: String,
}

impl Default for MemberListQuery {
    fn default() -> Self {
        Self {
            page: 0,
            size: 10,
            sort: "id".to_string(),
        }
    }
}

/// Every call the front-end makes against the backend
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn list_members(&self, query: &MemberListQuery) -> Result<Page<Member>>;

    /// Import a member from an external provider
    async fn fetch_new_member(&self, source_id: &str, provider: ProviderType) -> Result<Member>;

    async fn get_member(&self, id: MemberId) -> Result<Member>;

    async fn update_member(&self, id: MemberId, update: &MemberUpdate) -> Result<Member>;

    async fn upload_member_photo(&self, id: MemberId, photo: &PhotoUpload) -> Result<Member>;

    async fn list_publications(&self, query: &PublicationQuery) -> Result<Page<Publication>>;

    async fn publication_metadata(&self, member_id: MemberId) -> Result<PublicationMetadata>;

    /// Work-type vocabulary offered by the provider
    async fn work_types(&self) -> Result<Vec<String>>;

    async fn update_publication_type(
        &self,
        id: PublicationId,
        publication_type: &str,
    ) -> Result<Publication>;

    async fn update_publication_tags(&self, id: PublicationId, tags: &[String])
        -> Result<Publication>;

    async fn counts_by_year(&self, member_id: MemberId) -> Result<Vec<YearCount>>;

    async fn list_conferences(&self, member_id: MemberId) -> Result<Vec<Conference>>;

    async fn add_conference(
        &self,
        member_id: MemberId,
        conference: &NewConference,
    ) -> Result<Conference>;
}
