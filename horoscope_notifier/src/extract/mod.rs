//! Main-text extraction from loosely structured article pages.
//!
//! Extraction runs in two stages over an already parsed [`scraper::Html`]:
//! [`select_body`] picks the element most likely to hold the article text and
//! [`reconstruct`] turns it into clean paragraphs. Neither stage does I/O and
//! neither can fail; missing structure degrades to whole-document text.

mod body;
mod rules;
mod text;

pub use body::{pick_longest, rendered_len, select_body, visible_text, BodySource, Selection};
pub use rules::{apply_rules, RepairRule, PUNCTUATION_RULES};
pub use text::{
    collapse_blank_runs, drop_boilerplate, merge_paragraphs, raw_text, reconstruct,
    render_block_text, repair_paragraph,
};

/// Content container hints, tried in order. Every match is pooled; order is not priority.
pub const CONTENT_SELECTORS: &[&str] = &[
    ".xe_content",
    ".read_body",
    "article",
    ".board_read .rd_body",
    ".read",
    "#content",
];

/// Block elements scanned when no content hint matches.
pub const FALLBACK_BLOCK_SELECTOR: &str = "div, article, section, main";

/// Upper bound on fallback blocks considered.
pub const FALLBACK_LIMIT: usize = 30;

/// Subtrees removed from the container before rendering.
pub const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "header", "footer", "nav", "form",
];

/// Elements whose text is code or markup; skipped even where nothing is pruned.
pub const NON_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// A class or id word that starts with one of these marks the element as noise.
pub const NOISE_TOKENS: &[&str] = &["share", "social", "sns", "ad", "ads", "advert"];

/// Tokens shorter than this only match a whole word, so `ad` leaves `address` alone.
pub const NOISE_PREFIX_MIN_CHARS: usize = 3;

/// Share/comment/attribution footers.
pub const BOILERPLATE_MARKERS: &[&str] = &["이 게시물", "공유", "댓글", "출처"];

/// Paragraphs at least this long are kept even when they contain a marker.
pub const BOILERPLATE_MAX_CHARS: usize = 120;

/// Tunable heuristics for [`select_body`] and [`reconstruct`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub selectors: Vec<String>,
    pub fallback_limit: usize,
    pub noise_tags: Vec<String>,
    pub noise_tokens: Vec<String>,
    pub boilerplate_markers: Vec<String>,
    pub boilerplate_max_chars: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        Self {
            selectors: owned(CONTENT_SELECTORS),
            fallback_limit: FALLBACK_LIMIT,
            noise_tags: owned(NOISE_TAGS),
            noise_tokens: owned(NOISE_TOKENS),
            boilerplate_markers: owned(BOILERPLATE_MARKERS),
            boilerplate_max_chars: BOILERPLATE_MAX_CHARS,
        }
    }
}

/// Parse `html` and run both extraction stages.
pub fn extract_text(html: &str, options: &ExtractOptions) -> String {
    let document = scraper::Html::parse_document(html);
    let selection = select_body(&document, options);
    reconstruct(&document, &selection, options)
}
