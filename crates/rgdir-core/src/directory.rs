//! Cached reads, mutations with cache reconciliation, and the detail loader
//!
//! Reconciliation after a mutation follows one of two strategies:
//!
//! - **Targeted patch** (tag edit, type edit): the returned publication
//!   replaces its copy inside the active publications page. A type edit also
//!   invalidates the member's publication metadata.
//! - **Invalidate and refetch** (conference, profile text, photo, member
//!   import): the response is ignored and the affected query family is
//!   marked stale.

use std::sync::Arc;

use rgdir_api::{
    ApiError, Conference, DirectoryApi, Member, MemberId, MemberListQuery, MemberUpdate, Page,
    ProviderType, Publication, PublicationId, PublicationMetadata, PublicationQuery, YearCount,
    sort_year_counts,
};

use crate::cache::{FetchOptions, QueryCache};
use crate::config::CacheConfig;
use crate::editor::{PublicationEditor, SavePlan};
use crate::error::{DirectoryError, Result};
use crate::forms::{ConferenceForm, ProfileForm, ProfilePlan};
use crate::keys::QueryKey;
use crate::listing::ListingState;
use crate::view::PublicationView;

/// Any value the directory caches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryData {
    Member(Member),
    Members(Page<Member>),
    Publications(Page<Publication>),
    Metadata(PublicationMetadata),
    WorkTypes(Vec<String>),
    YearCounts(Vec<YearCount>),
    Conferences(Vec<Conference>),
}

/// Cache of directory queries
pub type DirectoryCache = QueryCache<QueryData, ApiError>;

/// Everything the member detail screen shows. Each region fails on its own.
#[derive(Debug, Clone)]
pub struct MemberDetail {
    pub member: Result<Member>,
    pub publications: Result<Page<Publication>>,
    /// Derived from `publications` when it loaded
    pub view: Option<PublicationView>,
    pub metadata: Result<PublicationMetadata>,
    pub work_types: Result<Vec<String>>,
    pub conferences: Result<Vec<Conference>>,
    /// Only requested once the member loaded; `None` otherwise
    pub counts_by_year: Option<Result<Vec<YearCount>>>,
}

/// Front-end state shared by every view: the API handle and the query cache
pub struct Directory<A> {
    api: Arc<A>,
    cache: DirectoryCache,
    config: CacheConfig,
}

impl<A> Clone for Directory<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cache: self.cache.clone(),
            config: self.config.clone(),
        }
    }
}

impl<A: DirectoryApi + 'static> Directory<A> {
    pub fn new(api: A, config: CacheConfig) -> Self {
        Self::with_api(Arc::new(api), config)
    }

    pub fn with_api(api: Arc<A>, config: CacheConfig) -> Self {
        let cache = QueryCache::new(config.default_stale_after());
        Self { api, cache, config }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }

    /// Drop all cached data
    pub fn shutdown(&self) {
        self.cache.clear();
    }

    async fn query<T, F, Fut>(
        &self,
        key: QueryKey,
        options: Option<FetchOptions>,
        load: F,
        extract: fn(QueryData) -> Option<T>,
        expected: &'static str,
    ) -> Result<T>
    where
        F: FnOnce(Arc<A>) -> Fut,
        Fut: std::future::Future<Output = rgdir_api::Result<QueryData>> + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let loader = move || load(api);
        let data = match options {
            Some(options) => self.cache.fetch_with(key.clone(), options, loader).await?,
            None => self.cache.fetch(key.clone(), loader).await?,
        };
        extract(data).ok_or_else(|| DirectoryError::CacheMismatch {
            key: key.to_string(),
            expected,
        })
    }

    // ===== Reads =====

    pub async fn members(&self, query: &MemberListQuery) -> Result<Page<Member>> {
        let owned = query.clone();
        self.query(
            QueryKey::members(query),
            None,
            move |api| async move { api.list_members(&owned).await.map(QueryData::Members) },
            |d| match d {
                QueryData::Members(page) => Some(page),
                _ => None,
            },
            "a member page",
        )
        .await
    }

    pub async fn member(&self, id: MemberId) -> Result<Member> {
        self.query(
            QueryKey::member(id),
            None,
            move |api| async move { api.get_member(id).await.map(QueryData::Member) },
            |d| match d {
                QueryData::Member(member) => Some(member),
                _ => None,
            },
            "a member",
        )
        .await
    }

    pub async fn publications(&self, query: &PublicationQuery) -> Result<Page<Publication>> {
        let owned = query.clone();
        self.query(
            QueryKey::publications(query),
            None,
            move |api| async move {
                api.list_publications(&owned)
                    .await
                    .map(QueryData::Publications)
            },
            |d| match d {
                QueryData::Publications(page) => Some(page),
                _ => None,
            },
            "a publication page",
        )
        .await
    }

    pub async fn publication_metadata(&self, member_id: MemberId) -> Result<PublicationMetadata> {
        self.query(
            QueryKey::publication_metadata(member_id),
            None,
            move |api| async move {
                api.publication_metadata(member_id)
                    .await
                    .map(QueryData::Metadata)
            },
            |d| match d {
                QueryData::Metadata(metadata) => Some(metadata),
                _ => None,
            },
            "publication metadata",
        )
        .await
    }

    pub async fn work_types(&self) -> Result<Vec<String>> {
        self.query(
            QueryKey::work_types(),
            Some(FetchOptions::stale_after(self.config.work_types_stale_after())),
            |api| async move { api.work_types().await.map(QueryData::WorkTypes) },
            |d| match d {
                QueryData::WorkTypes(types) => Some(types),
                _ => None,
            },
            "work types",
        )
        .await
    }

    /// Works per year, oldest first
    pub async fn counts_by_year(&self, member_id: MemberId) -> Result<Vec<YearCount>> {
        self.query(
            QueryKey::counts_by_year(member_id),
            Some(FetchOptions::stale_after(
                self.config.counts_by_year_stale_after(),
            )),
            move |api| async move {
                let mut counts = api.counts_by_year(member_id).await?;
                sort_year_counts(&mut counts);
                Ok::<_, ApiError>(QueryData::YearCounts(counts))
            },
            |d| match d {
                QueryData::YearCounts(counts) => Some(counts),
                _ => None,
            },
            "yearly counts",
        )
        .await
    }

    pub async fn conferences(&self, member_id: MemberId) -> Result<Vec<Conference>> {
        self.query(
            QueryKey::conferences(member_id),
            None,
            move |api| async move {
                api.list_conferences(member_id)
                    .await
                    .map(QueryData::Conferences)
            },
            |d| match d {
                QueryData::Conferences(conferences) => Some(conferences),
                _ => None,
            },
            "conferences",
        )
        .await
    }

    /// Load the member detail screen.
    ///
    /// Member, publications, metadata, work types, and conferences are
    /// requested concurrently. Yearly counts wait for the member to load
    /// successfully.
    pub async fn load_detail(
        &self,
        member_id: MemberId,
        listing: &ListingState,
        previously_open: Option<&str>,
    ) -> MemberDetail {
        let query = listing.query(member_id);

        let member_then_chart = async {
            let member = self.member(member_id).await;
            let counts = match member {
                Ok(_) => Some(self.counts_by_year(member_id).await),
                Err(_) => None,
            };
            (member, counts)
        };

        let ((member, counts_by_year), publications, metadata, work_types, conferences) = tokio::join!(
            member_then_chart,
            self.publications(&query),
            self.publication_metadata(member_id),
            self.work_types(),
            self.conferences(member_id),
        );

        let view = publications.as_ref().ok().map(|page| {
            PublicationView::derive(page, listing.sort(), listing.page(), previously_open)
        });

        MemberDetail {
            member,
            publications,
            view,
            metadata,
            work_types,
            conferences,
            counts_by_year,
        }
    }

    // ===== Mutations =====

    /// Replace the updated publication inside the active page, if cached
    fn patch_publication(&self, active: &PublicationQuery, updated: &Publication) -> bool {
        self.cache
            .patch(&QueryKey::publications(active), |data| match data {
                QueryData::Publications(page) => {
                    let mut page = page.clone();
                    page.replace_item(updated);
                    QueryData::Publications(page)
                }
                other => other.clone(),
            })
    }

    /// Replace a publication's tags and patch the active page
    pub async fn update_publication_tags(
        &self,
        publication_id: PublicationId,
        tags: &[String],
        active: &PublicationQuery,
    ) -> Result<Publication> {
        let updated = self
            .api
            .update_publication_tags(publication_id, tags)
            .await?;
        let patched = self.patch_publication(active, &updated);
        tracing::info!(publication_id, ?tags, patched, "updated publication tags");
        Ok(updated)
    }

    /// Replace a publication's type, patch the active page, and mark the
    /// member's metadata stale
    pub async fn update_publication_type(
        &self,
        publication_id: PublicationId,
        publication_type: &str,
        active: &PublicationQuery,
    ) -> Result<Publication> {
        let updated = self
            .api
            .update_publication_type(publication_id, publication_type)
            .await?;
        let patched = self.patch_publication(active, &updated);
        self.cache
            .invalidate(&QueryKey::publication_metadata(active.member_id));
        tracing::info!(publication_id, publication_type, patched, "updated publication type");
        Ok(updated)
    }

    /// Save the editor's working copy.
    ///
    /// Sends a tag update and a type update concurrently, each only when its
    /// value changed. On success the editor closes; on failure it goes back to
    /// editing with the working copy intact and the first error is returned.
    pub async fn save_publication_edits(
        &self,
        editor: &mut PublicationEditor,
        active: &PublicationQuery,
    ) -> Result<SavePlan> {
        let plan = editor.begin_save()?;
        if plan.is_empty() {
            tracing::debug!(publication_id = plan.publication_id, "nothing to save");
        }

        let tags = async {
            match &plan.tags {
                Some(tags) => Some(
                    self.update_publication_tags(plan.publication_id, tags, active)
                        .await,
                ),
                None => None,
            }
        };
        let kind = async {
            match &plan.publication_type {
                Some(kind) => Some(
                    self.update_publication_type(plan.publication_id, kind, active)
                        .await,
                ),
                None => None,
            }
        };
        let (tags, kind) = tokio::join!(tags, kind);

        let mut messages = Vec::new();
        let mut first_error = None;
        for (label, outcome) in [("Tag update error", tags), ("Type update error", kind)] {
            match outcome {
                Some(Ok(updated)) => editor.commit(&updated),
                Some(Err(err)) => {
                    tracing::warn!(publication_id = plan.publication_id, error = %err, "{}", label);
                    messages.push(format!("{}: {}", label, err));
                    first_error.get_or_insert(err);
                }
                None => {}
            }
        }

        match first_error {
            None => {
                editor.finish_save(Ok(()))?;
                Ok(plan)
            }
            Some(err) => {
                editor.finish_save(Err(messages.join("; ")))?;
                Err(err)
            }
        }
    }

    /// Validate and add a conference, then mark the member's conferences stale.
    /// The form is cleared on success and left as typed on failure.
    pub async fn add_conference(
        &self,
        member_id: MemberId,
        form: &mut ConferenceForm,
    ) -> Result<Conference> {
        let body = form.validate()?;
        let created = self.api.add_conference(member_id, &body).await?;
        self.cache.invalidate(&QueryKey::conferences(member_id));
        tracing::info!(member_id, conference = %created.name, "added conference");
        form.reset();
        Ok(created)
    }

    /// Save profile text and/or photo concurrently, marking the member stale
    /// after each successful call.
    ///
    /// `member` takes each part the backend accepted, and an uploaded photo
    /// leaves the form, so saving again after a partial failure only resends
    /// what failed. The form is cleared only if both succeed.
    pub async fn save_profile(
        &self,
        member: &mut Member,
        form: &mut ProfileForm,
    ) -> Result<ProfilePlan> {
        let plan = form.plan(member.description.as_deref())?;
        let member_id = member.id;

        let description = async {
            match &plan.description {
                Some(text) => {
                    let result = self
                        .api
                        .update_member(member_id, &MemberUpdate::description(text.clone()))
                        .await;
                    if result.is_ok() {
                        self.cache.invalidate(&QueryKey::member(member_id));
                    }
                    Some(result)
                }
                None => None,
            }
        };
        let photo = async {
            match &plan.photo {
                Some(photo) => {
                    let result = self.api.upload_member_photo(member_id, photo).await;
                    if result.is_ok() {
                        self.cache.invalidate(&QueryKey::member(member_id));
                    }
                    Some(result)
                }
                None => None,
            }
        };
        let (description, photo) = tokio::join!(description, photo);

        let mut first_error = None;
        match description {
            Some(Ok(updated)) => member.description = updated.description,
            Some(Err(err)) => {
                tracing::warn!(member_id, error = %err, "Update member error");
                first_error.get_or_insert(err);
            }
            None => {}
        }
        match photo {
            Some(Ok(updated)) => {
                member.photo_path = updated.photo_path;
                form.photo = None;
            }
            Some(Err(err)) => {
                tracing::warn!(member_id, error = %err, "Upload photo error");
                first_error.get_or_insert(err);
            }
            None => {}
        }

        match first_error {
            None => {
                tracing::info!(member_id, "saved profile");
                *form = ProfileForm::default();
                Ok(plan)
            }
            Some(err) => Err(err.into()),
        }
    }

    /// Import a member from a provider; the members list is refetched on next read
    pub async fn fetch_new_member(&self, source_id: &str, provider: ProviderType) -> Result<Member> {
        let source_id = source_id.trim();
        if source_id.is_empty() {
            return Err(DirectoryError::validation("Source ID is required."));
        }
        let member = self.api.fetch_new_member(source_id, provider).await?;
        self.cache.invalidate(&QueryKey::members_family());
        tracing::info!(member_id = member.id, %provider, "imported member");
        Ok(member)
    }
}
