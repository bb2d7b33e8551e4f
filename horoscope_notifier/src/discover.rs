use std::sync::LazyLock;

use chrono::{Datelike, FixedOffset, NaiveDate, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::{NotifierError, Result};

static POST_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^오늘의 운세,\s*\d+월\s*\d+일").expect("POST_TITLE should compile")
});

const POST_TITLE_PREFIX: &str = "오늘의 운세,";

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// Today's date in Korea, whatever timezone the scheduler runs in.
pub fn today_kst() -> NaiveDate {
    let now = Utc::now();
    FixedOffset::east_opt(KST_OFFSET_SECS)
        .map(|kst| now.with_timezone(&kst).date_naive())
        .unwrap_or_else(|| now.date_naive())
}

/// Finds the link to today's post on the list page, or the newest one when today's is missing.
pub fn find_today_post(list_html: &str, base: &Url, today: NaiveDate) -> Result<Url> {
    let document = Html::parse_document(list_html);
    let anchors = post_anchors(&document);
    if anchors.is_empty() {
        return Err(NotifierError::PostNotFound(base.to_string()));
    }

    let wanted = format!("{}월 {}일", today.month(), today.day());
    let (anchor, text) = anchors
        .iter()
        .find(|(_, text)| text.contains(&wanted))
        .unwrap_or(&anchors[0]);
    debug!("picked post link {text:?}");

    let href = anchor.value().attr("href").unwrap_or_default();
    base.join(href)
        .map_err(|source| NotifierError::invalid_url(href, source))
}

fn post_anchors(document: &Html) -> Vec<(ElementRef<'_>, String)> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let anchors: Vec<(ElementRef<'_>, String)> = document
        .select(&selector)
        .map(|a| (a, anchor_text(a)))
        .collect();

    let titled: Vec<_> = anchors
        .iter()
        .filter(|(_, text)| POST_TITLE.is_match(text))
        .cloned()
        .collect();
    if !titled.is_empty() {
        return titled;
    }

    anchors
        .into_iter()
        .filter(|(_, text)| text.starts_with(POST_TITLE_PREFIX))
        .collect()
}

fn anchor_text(anchor: ElementRef<'_>) -> String {
    anchor
        .text()
        .map(|t| t.replace('\u{a0}', " "))
        .flat_map(|t| t.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .collect::<Vec<_>>()
        .join(" ")
}
