use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::extract::{reconstruct, select_body, ExtractOptions, Selection};
use crate::format::page_title;
use crate::{Article, Content};

const IMAGE_SOURCE_ATTRS: &[&str] = &["src", "data-src", "data-original"];

/// Runs body selection and text reconstruction; images are collected only when no text survives.
pub fn extract_article(html: &str, page_url: &Url, options: &ExtractOptions) -> Article {
    let document = Html::parse_document(html);
    let title = page_title(&document, page_url.host_str());
    let mut article = Article::new(page_url.to_string(), title);

    let selection = select_body(&document, options);
    debug!("body selection: {}", selection.label());

    let text = reconstruct(&document, &selection, options);
    if !text.is_empty() {
        article.content = Content::Text(text);
        info!("extracted {} chars of text", article.text_length());
        return article;
    }

    let scope = match &selection {
        Selection::Container { element, .. } => *element,
        Selection::FullDocument => document.root_element(),
    };
    let images = image_urls(scope, page_url);
    if !images.is_empty() {
        info!("no text found, using {} images", images.len());
        article.content = Content::Images(images);
    }
    article
}

/// Absolute http(s) image URLs under `scope`, deduplicated, in document order.
pub fn image_urls(scope: ElementRef<'_>, page_url: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("img") else {
        return Vec::new();
    };

    let mut urls: Vec<String> = Vec::new();
    for img in scope.select(&selector) {
        let Some(src) = IMAGE_SOURCE_ATTRS
            .iter()
            .filter_map(|attr| img.value().attr(attr))
            .map(str::trim)
            .find(|src| !src.is_empty() && !src.starts_with("data:"))
        else {
            continue;
        };
        let Ok(resolved) = page_url.join(src) else {
            debug!("skipping unresolvable image source {src:?}");
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let resolved = resolved.to_string();
        if !urls.contains(&resolved) {
            urls.push(resolved);
        }
    }
    urls
}
