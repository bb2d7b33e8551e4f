pub mod article;
pub mod config;
pub mod discover;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod format;
pub mod gchat;
pub mod job;
pub mod utils;

use serde::{Deserialize, Serialize};

pub use error::{NotifierError, Result};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Content {
    Text(String),
    /// No text, but the post carries images; absolute URLs in document order.
    Images(Vec<String>),
    Empty,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub content: Content,
}

impl Article {
    pub fn new(url: String, title: String) -> Self {
        Self {
            url,
            title,
            content: Content::Empty,
        }
    }

    pub fn text_length(&self) -> usize {
        match &self.content {
            Content::Text(text) => text.chars().count(),
            Content::Images(_) | Content::Empty => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.content, Content::Empty)
    }
}
