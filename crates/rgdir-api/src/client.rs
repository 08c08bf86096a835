//! HTTP implementation of [`DirectoryApi`] using reqwest

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::models::{
    Conference, Member, MemberId, MemberUpdate, NewConference, Page, PhotoUpload, ProviderType,
    Publication, PublicationId, PublicationMetadata, YearCount,
};
use crate::traits::{DirectoryApi, MemberListQuery, PublicationQuery};

/// Client for the directory API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Build a client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        // Fail early on an unusable base rather than on the first request
        Url::parse(&config.base_url).map_err(|_| ApiError::InvalidUrl {
            url: config.base_url.clone(),
        })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client against `base_url` with default settings otherwise
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::new(&ClientConfig::default().with_base_url(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|_| ApiError::InvalidUrl { url: raw })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        tracing::debug!(%method, path, "api request");
        Ok(self.client.request(method, self.url(path)?))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.request(Method::GET, path)?.send().await?;
        decode(resp).await
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let resp = self.request(method, path)?.json(body).send().await?;
        decode(resp).await
    }
}

/// Check status, then decode the JSON body.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let resp = check_response(resp).await?;
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Map a non-2xx response to [`ApiError::Status`].
///
/// The message is taken from the backend's JSON error body (`message` field)
/// when there is one, the raw body text otherwise, and the status reason when
/// the body is empty.
pub async fn check_response(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown status").to_string());

    tracing::warn!(status = status.as_u16(), %message, "api call failed");
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return Some(message.to_string());
        }
    }
    Some(trimmed.to_string())
}

#[async_trait]
impl DirectoryApi for ApiClient {
    async fn list_members(&self, query: &MemberListQuery) -> Result<Page<Member>> {
        let resp = self
            .request(Method::GET, "members")?
            .query(&[
                ("page", query.page.to_string()),
                ("size", query.size.to_string()),
                ("sort", query.sort.clone()),
            ])
            .send()
            .await?;
        decode(resp).await
    }

    async fn fetch_new_member(&self, source_id: &str, provider: ProviderType) -> Result<Member> {
        let resp = self
            .request(Method::POST, "members/fetch")?
            .query(&[("sourceId", source_id), ("providerType", provider.as_str())])
            .json(&serde_json::json!({}))
            .send()
            .await?;
        decode(resp).await
    }

    async fn get_member(&self, id: MemberId) -> Result<Member> {
        self.get_json(&format!("members/{}", id)).await
    }

    async fn update_member(&self, id: MemberId, update: &MemberUpdate) -> Result<Member> {
        self.send_json(Method::PUT, &format!("members/{}", id), update)
            .await
    }

    async fn upload_member_photo(&self, id: MemberId, photo: &PhotoUpload) -> Result<Member> {
        let part = reqwest::multipart::Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone())
            .mime_str(&photo.content_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .request(Method::POST, &format!("members/{}/upload-photo", id))?
            .multipart(form)
            .send()
            .await?;
        decode(resp).await
    }

    async fn list_publications(&self, query: &PublicationQuery) -> Result<Page<Publication>> {
        let resp = self
            .request(
                Method::GET,
                &format!("members/{}/publications", query.member_id),
            )?
            .query(&query.query_pairs())
            .send()
            .await?;
        decode(resp).await
    }

    async fn publication_metadata(&self, member_id: MemberId) -> Result<PublicationMetadata> {
        self.get_json(&format!("members/{}/publication-metadata", member_id))
            .await
    }

    async fn work_types(&self) -> Result<Vec<String>> {
        self.get_json("openalex/work-types").await
    }

    async fn update_publication_type(
        &self,
        id: PublicationId,
        publication_type: &str,
    ) -> Result<Publication> {
        self.send_json(
            Method::PUT,
            &format!("publications/{}/type", id),
            &serde_json::json!({ "type": publication_type }),
        )
        .await
    }

    async fn update_publication_tags(
        &self,
        id: PublicationId,
        tags: &[String],
    ) -> Result<Publication> {
        self.send_json(Method::PUT, &format!("publications/{}/tags", id), tags)
            .await
    }

    async fn counts_by_year(&self, member_id: MemberId) -> Result<Vec<YearCount>> {
        self.get_json(&format!("members/{}/counts-by-year", member_id))
            .await
    }

    async fn list_conferences(&self, member_id: MemberId) -> Result<Vec<Conference>> {
        self.get_json(&format!("members/{}/conferences", member_id))
            .await
    }

    async fn add_conference(
        &self,
        member_id: MemberId,
        conference: &NewConference,
    ) -> Result<Conference> {
        self.send_json(
            Method::POST,
            &format!("members/{}/conferences", member_id),
            conference,
        )
        .await
    }
}
