// src/ingest/providers/devto.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::ingest::types::{Engagement, RawRecord, SourceProvider};

const ARTICLES_URL: &str = "https://dev.to/api/articles?per_page=30&top=1";

/// Latest articles from the Dev.to public API (JSON, no auth).
pub struct DevToProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

#[derive(Debug, Deserialize)]
struct Article {
    title: Option<String>,
    url: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
    positive_reactions_count: Option<i64>,
    comments_count: Option<i64>,
    #[serde(default)]
    tag_list: Vec<String>,
}

impl DevToProvider {
    pub fn from_fixture(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_default_url() -> Self {
        Self::from_url(ARTICLES_URL)
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
        let articles: Vec<Article> =
            serde_json::from_str(body).context("parsing dev.to articles")?;

        let mut out = Vec::with_capacity(articles.len());
        for article in articles {
            out.push(RawRecord {
                title: article.title.unwrap_or_default(),
                link: article.url.unwrap_or_default(),
                summary: article.description.unwrap_or_default(),
                published: article.published_at,
                source: "Dev.to".to_string(),
                engagement: Some(Engagement {
                    score: None,
                    comments: article.comments_count,
                    reactions: article.positive_reactions_count,
                }),
                extra: if article.tag_list.is_empty() {
                    serde_json::Value::Null
                } else {
                    serde_json::json!({ "tags": article.tag_list })
                },
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for DevToProvider {
    async fn collect(&self) -> Result<Vec<RawRecord>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_records(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("dev.to http get()")?
                    .text()
                    .await
                    .context("dev.to http .text()")?;
                Self::parse_records(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "devto"
    }
}
