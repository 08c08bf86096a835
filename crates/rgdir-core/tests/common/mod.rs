//! In-memory backend for directory tests

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use rgdir_api::{
    ApiError, Conference, DirectoryApi, Member, MemberId, MemberListQuery, MemberUpdate,
    NewConference, Page, PhotoUpload, ProviderType, Publication, PublicationId,
    PublicationMetadata, PublicationQuery, Result, YearCount,
};

pub const MEMBER_ID: MemberId = 4;

/// Backend double that records every call and can be told to fail
#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, ApiError>>,
    members: Mutex<Vec<Member>>,
    publications: Mutex<Vec<Publication>>,
    conferences: Mutex<Vec<Conference>>,
}

#[allow(dead_code)]
impl FakeApi {
    pub fn new() -> Self {
        let api = Self::default();
        api.members.lock().unwrap().push(member(MEMBER_ID, "Ada Lovelace"));
        api
    }

    pub fn with_publications(self, publications: Vec<Publication>) -> Self {
        *self.publications.lock().unwrap() = publications;
        self
    }

    /// Make every later call to `endpoint` fail with `error`
    pub fn fail(&self, endpoint: &'static str, error: ApiError) {
        self.failures.lock().unwrap().insert(endpoint, error);
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.failures.lock().unwrap().remove(endpoint);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose log line starts with `endpoint`
    pub fn count(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split(' ').next() == Some(endpoint))
            .count()
    }

    fn record(&self, endpoint: &'static str, detail: String) -> Result<()> {
        let line = if detail.is_empty() {
            endpoint.to_string()
        } else {
            format!("{} {}", endpoint, detail)
        };
        self.calls.lock().unwrap().push(line);
        match self.failures.lock().unwrap().get(endpoint) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn update_publication(
        &self,
        id: PublicationId,
        change: impl FnOnce(&mut Publication),
    ) -> Result<Publication> {
        let mut publications = self.publications.lock().unwrap();
        let publication = publications
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(not_found)?;
        change(publication);
        Ok(publication.clone())
    }
}

#[async_trait]
impl DirectoryApi for FakeApi {
    async fn list_members(&self, query: &MemberListQuery) -> Result<Page<Member>> {
        self.record("list_members", format!("page={}", query.page))?;
        tokio::task::yield_now().await;
        let content = self.members.lock().unwrap().clone();
        Ok(Page {
            total_elements: content.len() as u64,
            total_pages: 1,
            content,
        })
    }

    async fn fetch_new_member(&self, source_id: &str, provider: ProviderType) -> Result<Member> {
        self.record("fetch_new_member", format!("{} {}", source_id, provider))?;
        let mut members = self.members.lock().unwrap();
        let created = member(members.len() as i64 + 100, source_id);
        members.push(created.clone());
        Ok(created)
    }

    async fn get_member(&self, id: MemberId) -> Result<Member> {
        self.record("get_member", id.to_string())?;
        tokio::task::yield_now().await;
        self.members
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn update_member(&self, id: MemberId, update: &MemberUpdate) -> Result<Member> {
        self.record("update_member", id.to_string())?;
        let mut members = self.members.lock().unwrap();
        let member = members.iter_mut().find(|m| m.id == id).ok_or_else(not_found)?;
        if let Some(description) = &update.description {
            member.description = Some(description.clone());
        }
        Ok(member.clone())
    }

    async fn upload_member_photo(&self, id: MemberId, photo: &PhotoUpload) -> Result<Member> {
        self.record("upload_member_photo", photo.file_name.clone())?;
        let mut members = self.members.lock().unwrap();
        let member = members.iter_mut().find(|m| m.id == id).ok_or_else(not_found)?;
        member.photo_path = Some(photo.file_name.clone());
        Ok(member.clone())
    }

    async fn list_publications(&self, query: &PublicationQuery) -> Result<Page<Publication>> {
        self.record(
            "list_publications",
            format!("page={} size={} sort={}", query.page, query.size, query.sort),
        )?;
        tokio::task::yield_now().await;
        let content = self.publications.lock().unwrap().clone();
        Ok(Page {
            total_elements: content.len() as u64,
            total_pages: 1,
            content,
        })
    }

    async fn publication_metadata(&self, member_id: MemberId) -> Result<PublicationMetadata> {
        self.record("publication_metadata", member_id.to_string())?;
        let publications = self.publications.lock().unwrap();
        let types: BTreeSet<String> = publications
            .iter()
            .filter_map(|p| p.publication_type.clone())
            .collect();
        let tags: BTreeSet<String> = publications.iter().flat_map(|p| p.tags.clone()).collect();
        Ok(PublicationMetadata {
            types: types.into_iter().collect(),
            tags: tags.into_iter().collect(),
        })
    }

    async fn work_types(&self) -> Result<Vec<String>> {
        self.record("work_types", String::new())?;
        Ok(vec![
            "article".to_string(),
            "book".to_string(),
            "other".to_string(),
        ])
    }

    async fn update_publication_type(
        &self,
        id: PublicationId,
        publication_type: &str,
    ) -> Result<Publication> {
        self.record("update_publication_type", format!("{} {}", id, publication_type))?;
        tokio::task::yield_now().await;
        self.update_publication(id, |p| {
            p.publication_type = Some(publication_type.to_string())
        })
    }

    async fn update_publication_tags(
        &self,
        id: PublicationId,
        tags: &[String],
    ) -> Result<Publication> {
        self.record("update_publication_tags", format!("{} {:?}", id, tags))?;
        tokio::task::yield_now().await;
        self.update_publication(id, |p| p.tags = tags.to_vec())
    }

    async fn counts_by_year(&self, member_id: MemberId) -> Result<Vec<YearCount>> {
        self.record("counts_by_year", member_id.to_string())?;
        Ok(vec![
            year_count("2022", 3),
            year_count("2019", 1),
            year_count("2021", 2),
        ])
    }

    async fn list_conferences(&self, member_id: MemberId) -> Result<Vec<Conference>> {
        self.record("list_conferences", member_id.to_string())?;
        Ok(self.conferences.lock().unwrap().clone())
    }

    async fn add_conference(
        &self,
        member_id: MemberId,
        conference: &NewConference,
    ) -> Result<Conference> {
        self.record("add_conference", format!("{} {}", member_id, conference.name))?;
        let mut conferences = self.conferences.lock().unwrap();
        let created = Conference {
            id: conferences.len() as i64 + 1,
            name: conference.name.clone(),
            year: Some(conference.year),
            location: Some(conference.location.clone()),
            description: Some(conference.description.clone()),
        };
        conferences.push(created.clone());
        Ok(created)
    }
}

fn not_found() -> ApiError {
    ApiError::Status {
        status: 404,
        message: "Not Found".to_string(),
    }
}

fn year_count(year: &str, count: u64) -> YearCount {
    YearCount {
        year: year.to_string(),
        count,
    }
}

pub fn member(id: MemberId, name: &str) -> Member {
    Member {
        id,
        name: name.to_string(),
        description: Some("<p>Mathematician</p>".to_string()),
        photo_path: None,
        cited_by_count: 120,
        works_count: 3,
    }
}

pub fn publication(id: PublicationId, year: Option<i32>, kind: &str, tags: &[&str]) -> Publication {
    Publication {
        id,
        title: format!("Paper {}", id),
        identifier_url: None,
        cited_by_count: id * 10,
        authors: Some("A. Lovelace".to_string()),
        publication_year: year,
        publication_type: Some(kind.to_string()),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        source_name: None,
    }
}

#[allow(dead_code)]
pub fn server_error(message: &str) -> ApiError {
    ApiError::Status {
        status: 500,
        message: message.to_string(),
    }
}
