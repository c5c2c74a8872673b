use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::config::Credentials;
use crate::post::Post;
use crate::{Error, Result, MAX_POSTS_PER_QUERY};

/// Parameters for one hashtag timeline request. Both bounds are exclusive,
/// the way the server interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchParams {
    pub limit: u8,
    pub min_id: Option<u128>,
    pub max_id: Option<u128>,
}

impl SearchParams {
    /// Builds exclusive server bounds out of inclusive caller bounds.
    /// An inclusive lower bound of 0 covers the whole id space and is dropped.
    pub fn from_inclusive(limit: i64, start_id: Option<u128>, end_id: Option<u128>) -> Self {
        Self {
            limit: clamp_limit(limit),
            min_id: start_id.and_then(|id| id.checked_sub(1)),
            max_id: end_id.map(|id| id.saturating_add(1)),
        }
    }
}

/// Clamps the requested number of posts into `0..=40`.
pub fn clamp_limit(requested: i64) -> u8 {
    requested.clamp(0, MAX_POSTS_PER_QUERY as i64) as u8
}

#[async_trait]
pub trait SearchApi {
    /// Returns at most `params.limit` posts tagged with `query`, newest first.
    async fn search(&self, query: &str, params: SearchParams) -> Result<Vec<Post>>;
}

/// Talks to `GET /api/v1/timelines/tag/:hashtag` on a Mastodon server.
#[derive(Debug, Clone)]
pub struct MastodonClient {
    client: Client,
    base_url: Url,
    credentials: Credentials,
}

impl MastodonClient {
    pub fn new(credentials: Credentials) -> Result<Self> {
        let base_url = Url::parse(&credentials.base_url)
            .map_err(|_| Error::InvalidBaseUrl(credentials.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidBaseUrl(credentials.base_url.clone()));
        }

        Ok(Self {
            client: Client::new(),
            base_url,
            credentials,
        })
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Full request url, hashtag percent-encoded as a single path segment.
    pub fn timeline_url(&self, query: &str, params: SearchParams) -> Result<Url> {
        let hashtag = query.trim_start_matches('#');

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidBaseUrl(self.credentials.base_url.clone()))?
            .pop_if_empty()
            .extend(["api", "v1", "timelines", "tag", hashtag]);

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &params.limit.to_string());
            if let Some(min_id) = params.min_id {
                pairs.append_pair("min_id", &min_id.to_string());
            }
            if let Some(max_id) = params.max_id {
                pairs.append_pair("max_id", &max_id.to_string());
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl SearchApi for MastodonClient {
    async fn search(&self, query: &str, params: SearchParams) -> Result<Vec<Post>> {
        let url = self.timeline_url(query, params)?;
        let res = self
            .client
            .get(url)
            .bearer_auth(&self.credentials.access_token)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        let posts = res.json::<Vec<Post>>().await?;
        Ok(posts)
    }
}
