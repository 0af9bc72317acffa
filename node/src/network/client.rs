use async_trait::async_trait;
use std::collections::HashSet;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use wheretomeetup::error::ApiError;
use wheretomeetup::remote::MeetupApi;
use wheretomeetup::store::Document;
use wheretomeetup::types::{GroupId, MemberId};

/// Upper bound on pages followed for one collection.
const MAX_PAGES: usize = 1000;

/// One page of a Meetup v2 collection.
#[derive(Debug, Deserialize)]
struct Page {
    results: Vec<Document>,
    #[serde(default)]
    meta: PageMeta,
}

#[derive(Debug, Default, Deserialize)]
struct PageMeta {
    #[serde(default)]
    next: String,
}

#[derive(Debug, Clone)]
pub struct MeetupClient {
    base_url: String,
    access_token: Option<String>,
    client: Client,
}

impl MeetupClient {
    pub fn new(url: String, access_token: Option<String>) -> Self {
        Self {
            base_url: url.trim_end_matches('/').to_string(),
            access_token,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ApiError> {
        let resp = self
            .authorized(req)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        resp.json().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Fetches `path` with `query` and follows `meta.next` until it runs out.
    async fn collect_pages(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<Document>, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut page: Page = self.get_json(self.client.get(&url).query(query)).await?;
        let mut results = std::mem::take(&mut page.results);
        let mut pages = 1;

        let mut seen = HashSet::new();

        while !page.meta.next.is_empty() {
            let next = std::mem::take(&mut page.meta.next);
            if !seen.insert(next.clone()) {
                tracing::warn!("GET {} pagination repeated {}, stopping", path, next);
                break;
            }
            if pages >= MAX_PAGES {
                return Err(ApiError::Decode(format!("{} exceeded {} pages", path, MAX_PAGES)));
            }
            page = self.get_json(self.client.get(&next)).await?;
            results.append(&mut page.results);
            pages += 1;
        }

        tracing::debug!("GET {} -> {} results over {} pages", path, results.len(), pages);
        Ok(results)
    }
}

fn join<T: ToString>(items: &[T]) -> String {
    items.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

#[async_trait]
impl MeetupApi for MeetupClient {
    async fn member(&self, member_id: MemberId) -> Result<Document, ApiError> {
        let url = format!("{}/2/member/{}", self.base_url, member_id);
        self.get_json(self.client.get(&url)).await
    }

    async fn groups(&self, member_id: MemberId, fields: &[&str], page: u32) -> Result<Vec<Document>, ApiError> {
        let query = [
            ("member_id", member_id.to_string()),
            ("fields", fields.join(",")),
            ("page", page.to_string()),
        ];
        self.collect_pages("/2/groups", &query).await
    }

    async fn venues(&self, group_ids: &[GroupId], fields: &[&str], page: u32) -> Result<Vec<Document>, ApiError> {
        let query = [
            ("group_id", join(group_ids)),
            ("fields", fields.join(",")),
            ("page", page.to_string()),
        ];
        self.collect_pages("/2/venues", &query).await
    }

    async fn events(
        &self,
        group_ids: &[GroupId],
        status: &[&str],
        fields: &[&str],
        page: u32,
    ) -> Result<Vec<Document>, ApiError> {
        let query = [
            ("group_id", join(group_ids)),
            ("status", status.join(",")),
            ("fields", fields.join(",")),
            ("page", page.to_string()),
        ];
        self.collect_pages("/2/events", &query).await
    }
}
