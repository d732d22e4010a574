//! HTTP client for the Hacker News Firebase API.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use hnjobs_core::config::ForumConfig;

use crate::api::ForumApi;
use crate::error::{ForumError, ForumResult};
use crate::types::{ForumUser, Item, RawItem};

/// [`ForumApi`] implementation over HTTPS.
#[derive(Debug, Clone)]
pub struct HackerNewsClient {
    client: reqwest::Client,
    base_url: String,
}

impl HackerNewsClient {
    /// Build a client from configuration.
    pub fn new(config: &ForumConfig) -> ForumResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are made against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn user_url(&self, username: &str) -> String {
        format!("{}/user/{}.json", self.base_url, username)
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/item/{}.json", self.base_url, id)
    }

    /// GET `url` and decode the body. The API answers unknown resources
    /// with a literal `null`, which decodes to `None`.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ForumResult<Option<T>> {
        debug!(url = %url, "Forum request");

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), url = %url, body = %body, "Forum API error");
            return Err(ForumError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice::<Option<T>>(&bytes)?)
    }
}

#[async_trait]
impl ForumApi for HackerNewsClient {
    async fn get_user(&self, username: &str) -> ForumResult<ForumUser> {
        let url = self.user_url(username);
        self.get_json::<ForumUser>(&url)
            .await?
            .ok_or_else(|| ForumError::NotFound(format!("user/{username}")))
    }

    async fn get_item(&self, id: i64) -> ForumResult<Item> {
        let url = self.item_url(id);
        self.get_json::<RawItem>(&url)
            .await?
            .map(Item::from)
            .ok_or_else(|| ForumError::NotFound(format!("item/{id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let config = ForumConfig {
            base_url: "https://hacker-news.firebaseio.com/v0/".to_string(),
            ..ForumConfig::default()
        };
        let client = HackerNewsClient::new(&config).expect("client builds");
        assert_eq!(client.base_url(), "https://hacker-news.firebaseio.com/v0");
        assert_eq!(
            client.user_url("whoishiring"),
            "https://hacker-news.firebaseio.com/v0/user/whoishiring.json"
        );
        assert_eq!(
            client.item_url(42),
            "https://hacker-news.firebaseio.com/v0/item/42.json"
        );
    }

    #[test]
    fn test_null_body_decodes_to_none() {
        let decoded: Option<RawItem> = serde_json::from_str("null").expect("null is valid json");
        assert!(decoded.is_none());
    }
}
