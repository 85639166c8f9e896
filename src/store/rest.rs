use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::time::Duration;

use super::{tables, StoreError, TableStore, OKR_SELECT};

/// Client for a PostgREST-style table API with a GoTrue-style auth endpoint.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            access_token: None,
        })
    }

    /// Act as a signed-in user instead of the anonymous api key role.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, urlencoding::encode(table))
    }

    fn row_url(&self, table: &str, id: &str) -> String {
        format!(
            "{}?id=eq.{}",
            self.table_url(table),
            urlencoding::encode(id)
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        request.header("apikey", &self.api_key).bearer_auth(bearer)
    }

    async fn read_rows(response: Response) -> Result<Vec<Value>, StoreError> {
        let response = check(response).await?;
        Ok(response.json::<Vec<Value>>().await?)
    }
}

/// Turn non-2xx replies into [`StoreError::Rejected`], preferring the store's
/// own `message` field.
async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("msg"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());

    Err(StoreError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl TableStore for RestStore {
    async fn select(&self, table: &str, order_by: Option<&str>) -> Result<Vec<Value>, StoreError> {
        let mut url = format!("{}?select=*", self.table_url(table));
        if let Some(field) = order_by {
            url.push_str(&format!("&order={}.asc", urlencoding::encode(field)));
        }
        debug!("GET {url}");

        let response = self.authorize(self.client.get(&url)).send().await?;
        Self::read_rows(response).await
    }

    async fn select_okrs(&self, id: Option<&str>) -> Result<Vec<Value>, StoreError> {
        let mut url = format!(
            "{}?select={}",
            self.table_url(tables::OKRS),
            urlencoding::encode(OKR_SELECT)
        );
        if let Some(id) = id {
            url.push_str(&format!("&id=eq.{}", urlencoding::encode(id)));
        }
        debug!("GET {url}");

        let response = self.authorize(self.client.get(&url)).send().await?;
        Self::read_rows(response).await
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, StoreError> {
        let url = self.table_url(table);
        debug!("POST {url} ({} rows)", rows.len());

        let response = self
            .authorize(self.client.post(&url))
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;
        Self::read_rows(response).await
    }

    async fn update(&self, table: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        let url = self.row_url(table, id);
        debug!("PATCH {url}");

        let response = self
            .authorize(self.client.patch(&url))
            .json(&patch)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError> {
        let url = self.row_url(table, id);
        debug!("DELETE {url}");

        let response = self.authorize(self.client.delete(&url)).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn current_user_id(&self) -> Result<Option<String>, StoreError> {
        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };

        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Ok(None);
        }

        let user: Value = check(response).await?.json().await?;
        Ok(user.get("id").and_then(|id| id.as_str()).map(str::to_string))
    }
}
