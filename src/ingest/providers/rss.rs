// src/ingest/providers/rss.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::ingest::types::{RawRecord, SourceProvider};

/// Generic RSS 2.0 channel. One instance per configured feed; the feed's
/// human label becomes the record's `source`.
pub struct RssProvider {
    label: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

impl RssProvider {
    pub fn from_fixture(label: impl Into<String>, s: &str) -> Self {
        Self {
            label: label.into(),
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            mode: Mode::Http {
                url: url.into(),
                client: reqwest::Client::new(),
            },
        }
    }

    fn parse_records(&self, body: &str) -> Result<Vec<RawRecord>> {
        let xml_clean = scrub_html_entities_for_xml(body);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for item in rss.channel.item {
            out.push(RawRecord {
                title: item.title.unwrap_or_default(),
                link: item.link.unwrap_or_default(),
                summary: item.description.unwrap_or_default(),
                published: item.pub_date,
                source: self.label.clone(),
                engagement: None,
                extra: serde_json::Value::Null,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceProvider for RssProvider {
    async fn collect(&self) -> Result<Vec<RawRecord>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_records(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("rss http get()")?
                    .text()
                    .await
                    .context("rss http .text()")?;
                self.parse_records(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "rss"
    }
}

// quick-xml rejects bare HTML entities inside element text.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
