//! HTTPS client for the service's descriptor and tab-state endpoints.

use crate::config::{AuthConfig, ServiceConfig};
use crate::error::WatchError;
use async_trait::async_trait;
use chatwire::info::InfoEnvelope;
use chatwire::tabs::TabStateEnvelope;
use chatwire::{EntityKind, Info, TabState};
use reqwest::header;
use std::collections::HashMap;
use std::time::Duration;

/// Timeout for descriptor and tab-state requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-side queries against the hosted service.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Fetch the organization's Info directory snapshot.
    async fn fetch_info(&self, organization: &str) -> Result<Info, WatchError>;

    /// Fetch per-conversation read/unread state across all tabs.
    async fn fetch_tab_state(
        &self,
        organization: &str,
    ) -> Result<HashMap<String, TabState>, WatchError>;
}

/// `reqwest`-backed [`ChatApi`] implementation.
pub struct ApiClient {
    http: reqwest::Client,
    domain: String,
}

impl ApiClient {
    /// Build the client, attaching session credentials to every request.
    pub fn new(service: &ServiceConfig, auth: &AuthConfig) -> Result<Self, WatchError> {
        let mut headers = header::HeaderMap::new();
        if let Some(cookie) = &auth.cookie {
            let value = header::HeaderValue::from_str(cookie)
                .map_err(|_| WatchError::MissingCredentials)?;
            headers.insert(header::COOKIE, value);
        }
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("chatwatch/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            http,
            domain: service.domain.clone(),
        })
    }

    fn api_url(&self, organization: &str, operation: &str) -> String {
        format!(
            "https://{organization}.{}/api/1/odata.svc/{operation}",
            self.domain
        )
    }

    async fn get_json(
        &self,
        organization: &str,
        operation: &'static str,
        query: &str,
    ) -> Result<String, WatchError> {
        let url = format!("{}{query}", self.api_url(organization, operation));
        let response = self.http.get(&url).send().await?;
        // Success predicate: the whole 2xx range.
        if !response.status().is_success() {
            return Err(WatchError::Status(operation, response.status()));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn fetch_info(&self, organization: &str) -> Result<Info, WatchError> {
        let body = self.get_json(organization, "Info()", "?$format=json").await?;
        let envelope: InfoEnvelope = serde_json::from_str(&body)?;
        Ok(envelope.d)
    }

    async fn fetch_tab_state(
        &self,
        organization: &str,
    ) -> Result<HashMap<String, TabState>, WatchError> {
        let body = self.get_json(organization, "Tabs.GetState()", "").await?;
        let envelope: TabStateEnvelope = serde_json::from_str(&body)?;
        Ok(envelope.d)
    }
}

/// Conversation page URL for a resolved entity.
pub fn entity_url(domain: &str, organization: &str, kind: EntityKind, id: i64) -> String {
    format!(
        "https://{organization}.{domain}/index.html#{}/{id}",
        kind.segment()
    )
}

/// Landing page of the organization.
pub fn root_url(domain: &str, organization: &str) -> String {
    format!("https://{organization}.{domain}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_url() {
        assert_eq!(
            entity_url("ryver.com", "acme", EntityKind::Team, 42),
            "https://acme.ryver.com/index.html#teams/42"
        );
        assert_eq!(
            entity_url("ryver.com", "acme", EntityKind::User, 7),
            "https://acme.ryver.com/index.html#users/7"
        );
    }

    #[test]
    fn test_root_url() {
        assert_eq!(root_url("ryver.com", "acme"), "https://acme.ryver.com");
    }
}
