// src/source/truth_social.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{within_window, ApiStatus, PostSource, RawPost};

const PAGE_LIMIT: u32 = 40;
pub const ENV_TOKEN: &str = "TRUTHSOCIAL_TOKEN";

/// Mastodon-compatible status client for Truth Social.
pub struct TruthSocialSource {
    base_url: String,
    token: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct Account {
    id: String,
}

impl TruthSocialSource {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("tariff-post-classifier/0.1")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building truth social http client")?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    pub fn from_env(base_url: impl Into<String>) -> Result<Self> {
        Self::new(base_url, std::env::var(ENV_TOKEN).ok())
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let req = self.client.get(url);
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    async fn lookup_account(&self, handle: &str) -> Result<String> {
        let url = format!("{}/api/v1/accounts/lookup", self.base_url);
        let account: Account = self
            .get(&url)
            .query(&[("acct", handle)])
            .send()
            .await
            .context("account lookup request")?
            .error_for_status()
            .context("account lookup non-2xx")?
            .json()
            .await
            .context("account lookup body")?;
        Ok(account.id)
    }

    async fn page(&self, account_id: &str, max_id: Option<&str>) -> Result<Vec<ApiStatus>> {
        let url = format!("{}/api/v1/accounts/{account_id}/statuses", self.base_url);
        let mut query = vec![
            ("exclude_replies", "true".to_string()),
            ("limit", PAGE_LIMIT.to_string()),
        ];
        if let Some(id) = max_id {
            query.push(("max_id", id.to_string()));
        }
        self.get(&url)
            .query(&query)
            .send()
            .await
            .context("statuses request")?
            .error_for_status()
            .context("statuses non-2xx")?
            .json()
            .await
            .context("statuses body")
    }
}

#[async_trait]
impl PostSource for TruthSocialSource {
    async fn pull(&self, author: &str, created_after: DateTime<Utc>) -> Result<Vec<RawPost>> {
        let account_id = self.lookup_account(author).await?;
        tracing::debug!(author, account_id = %account_id, "resolved account");

        let mut collected: Vec<ApiStatus> = Vec::new();
        let mut max_id: Option<String> = None;
        loop {
            let page = self.page(&account_id, max_id.as_deref()).await?;
            let Some(last) = page.last() else {
                break;
            };
            let next_max = last.id.clone();
            if max_id.as_deref() == Some(next_max.as_str()) {
                return Err(anyhow!("pagination did not advance past {next_max}"));
            }
            let reached_window_start = page.iter().any(|s| s.created_at <= created_after);
            collected.extend(page);
            if reached_window_start {
                break;
            }
            max_id = Some(next_max);
        }

        let posts = within_window(collected, created_after);
        counter!("posts_pulled_total").increment(posts.len() as u64);
        tracing::info!(author, posts = posts.len(), "pulled statuses");
        Ok(posts)
    }

    fn name(&self) -> &'static str {
        "truth-social"
    }
}
