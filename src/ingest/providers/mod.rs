// src/ingest/providers/mod.rs
pub mod devto;
pub mod hackernews;
pub mod rss;

pub use devto::DevToProvider;
pub use hackernews::HackerNewsProvider;
pub use rss::RssProvider;
