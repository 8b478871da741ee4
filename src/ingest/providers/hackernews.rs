// src/ingest/providers/hackernews.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::types::{Engagement, RawRecord, SourceProvider};

const SEARCH_URL: &str =
    "https://hn.algolia.com/api/v1/search_by_date?tags=story&hitsPerPage=50";

/// Stories from the Algolia Hacker News search API (JSON, no auth).
pub struct HackerNewsProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    title: Option<String>,
    url: Option<String>,
    story_text: Option<String>,
    created_at: Option<String>,
    points: Option<i64>,
    num_comments: Option<i64>,
    #[serde(rename = "objectID")]
    object_id: Option<String>,
}

impl HackerNewsProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_default_url() -> Self {
        Self::from_url(SEARCH_URL)
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    fn parse_records(body: &str) -> Result<Vec<RawRecord>> {
        let response: SearchResponse =
            serde_json::from_str(body).context("parsing algolia hn response")?;

        let mut out = Vec::with_capacity(response.hits.len());
        for hit in response.hits {
            out.push(RawRecord {
                title: hit.title.unwrap_or_default(),
                link: hit.url.unwrap_or_default(),
                summary: hit.story_text.unwrap_or_default(),
                published: hit.created_at,
                source: "Hacker News".to_string(),
                engagement: Some(Engagement {
                    score: hit.points,
                    comments: hit.num_comments,
                    reactions: None,
                }),
                extra: hit
                    .object_id
                    .map(|id| serde_json::json!({ "object_id": id }))
                    .unwrap_or(serde_json::Value::Null),
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for HackerNewsProvider {
    async fn collect(&self) -> Result<Vec<RawRecord>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_records(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("hn http get()")?
                    .text()
                    .await
                    .context("hn http .text()")?;
                Self::parse_records(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "hackernews"
    }
}
