//! Presentation passes applied to extracted text before it is sent to chat.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::warn;

use crate::extract::{apply_rules, merge_paragraphs, RepairRule};

pub const MAX_MESSAGE_CHARS: usize = 14_000;

pub const TRUNCATION_NOTICE: &str =
    "\n\n(메시지가 길어 일부만 전송됩니다. 원문에서 전체 확인하세요.)";

pub const DEFAULT_TITLE: &str = "오늘의 운세";

/// Lines this short are treated as fragments of the previous line.
const ORPHAN_MAX_CHARS: usize = 3;

static TRAILING_BOILERPLATE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(이 게시물|이 글|출처|공유|댓글)").expect("TRAILING_BOILERPLATE_LINE should compile")
});

static TRAILING_BOILERPLATE_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\s|^)(?:이 게시물을?|이 글|출처|공유|댓글)[^\n.!?]{0,200}[.!?]?$")
        .expect("TRAILING_BOILERPLATE_PHRASE should compile")
});

static LAST_LINE_BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\s|^)(?:이 게시물을?|이 글|출처|공유|댓글)[\s.:,]*$")
        .expect("LAST_LINE_BOILERPLATE should compile")
});

static DOT_ONLY_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[.\s]+$").expect("DOT_ONLY_LINE should compile"));

static TITLE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\s\-–—|·:]+|[\s\-–—|·:]+$").expect("TITLE_SEPARATORS should compile")
});

static SPACING_RULES: LazyLock<Vec<RepairRule>> = LazyLock::new(|| {
    vec![
        RepairRule::new(r"[^\S\n]*\([^\S\n]*", " (", "space before an opening parenthesis"),
        RepairRule::new(r"[^\S\n]*\)[^\S\n]*", ") ", "space after a closing parenthesis"),
        RepairRule::new(r"[^\S\n]*〈[^\S\n]*", " 〈", "space before an opening angle bracket"),
        RepairRule::new(r"[^\S\n]*〉[^\S\n]*", "〉 ", "space after a closing angle bracket"),
        RepairRule::new(
            r"[^\S\n]+([.,:;?!%])",
            "${1}",
            "no whitespace before punctuation",
        ),
        RepairRule::new(
            r"\.[^\S\n]*([A-Za-z가-힣])",
            ". ${1}",
            "one space after a sentence period",
        ),
        RepairRule::new(
            r"(\d)[^\S\n]*,[^\S\n]*(\d)",
            "${1}, ${2}",
            "birth-year lists read as `60, 72`",
        ),
        RepairRule::new(r"(\d)[^\S\n]+년생", "${1}년생", "birth-year suffix split from its number"),
        RepairRule::new(r"[^\S\n]{2,}", " ", "collapse horizontal runs"),
        RepairRule::new(r"(?m)^[^\S\n]+|[^\S\n]+$", "", "trim every line"),
        RepairRule::new(r"\n{3,}", "\n\n", "at most one blank line"),
    ]
});

static LAYOUT_RULES: LazyLock<Vec<RepairRule>> = LazyLock::new(|| {
    vec![
        RepairRule::new(r"\s*([<〈])", "\n\n${1}", "opening bracket starts a block"),
        RepairRule::new(r"([>〉])\s*", "${1}\n\n", "closing bracket ends a block"),
        RepairRule::new(r"\n{3,}", "\n\n", "at most one blank line"),
        RepairRule::new(r"년생\s+", "년생\n", "each birth year on its own line"),
        RepairRule::new(r"\.\s+", ".\n", "one sentence per line"),
        RepairRule::new(r"\.([^\d\s.])", ".\n${1}", "one sentence per line, unspaced"),
    ]
});

/// Removes share/comment/source footers from the end of the text.
pub fn strip_trailing_boilerplate(text: &str) -> String {
    let mut lines: Vec<&str> = text.trim_end().lines().collect();
    let mut removed = false;
    while lines
        .last()
        .is_some_and(|line| TRAILING_BOILERPLATE_LINE.is_match(line.trim()))
    {
        lines.pop();
        removed = true;
    }
    if removed {
        return lines.join("\n").trim_end().to_string();
    }

    TRAILING_BOILERPLATE_PHRASE
        .replace(text.trim_end(), "")
        .trim_end()
        .to_string()
}

/// Heals stray line breaks and applies chat spacing conventions.
pub fn normalize_spacing(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut merged: Vec<String> = Vec::new();
    for line in text.lines().map(str::trim) {
        let orphan = !line.is_empty() && line.chars().count() <= ORPHAN_MAX_CHARS;
        let prev_has_text = merged.last().is_some_and(|prev| !prev.is_empty());
        if !(orphan && prev_has_text) {
            merged.push(line.to_string());
        } else if let Some(prev) = merged.last_mut() {
            prev.push(' ');
            prev.push_str(line);
        }
    }

    let reflowed = merge_paragraphs(&merged).join("\n\n");
    apply_rules(&SPACING_RULES, &reflowed).trim().to_string()
}

/// Lays text out one sentence per line, with bracketed headings set apart.
pub fn layout_for_chat(text: &str) -> String {
    let text = match text.find('[') {
        Some(idx) => &text[idx..],
        None => text,
    };
    let laid_out = apply_rules(&LAYOUT_RULES, text);

    let mut lines: Vec<&str> = laid_out.trim_end().lines().collect();
    while lines.last().is_some_and(|line| DOT_ONLY_LINE.is_match(line)) {
        lines.pop();
    }
    let stripped_last = lines
        .pop()
        .map(|last| LAST_LINE_BOILERPLATE.replace(last, "").trim_end().to_string());
    let mut lines: Vec<String> = lines.into_iter().map(str::to_string).collect();
    lines.extend(stripped_last);
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    lines.join("\n").trim().to_string()
}

/// Every presentation pass, in the order the chat message needs them.
pub fn prepare_body(text: &str, sentence_layout: bool) -> String {
    let text = normalize_spacing(&strip_trailing_boilerplate(text));
    if sentence_layout {
        layout_for_chat(&text)
    } else {
        text
    }
}

/// Prepends the header and caps the result at `max_chars` characters plus the notice.
pub fn compose_message(title: &str, url: &str, body: &str, max_chars: usize) -> String {
    let message = format!("🔮 *{title}*\n{url}\n\n{body}");
    truncate_message(message, max_chars)
}

pub fn truncate_message(message: String, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            warn!(
                "message too long ({} chars), truncating to {max_chars}",
                message.chars().count()
            );
            let mut truncated = message[..cut].to_string();
            truncated.push_str(TRUNCATION_NOTICE);
            truncated
        }
        None => message,
    }
}

/// `<title>` text without the site host and the separators around it.
pub fn page_title(document: &Html, site_host: Option<&str>) -> String {
    let raw = Selector::parse("title")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|el| el.text().collect::<String>())
        })
        .unwrap_or_default();

    let mut title = raw.trim().to_string();
    if let Some(host) = site_host.filter(|h| !h.is_empty()) {
        title = title.replace(host, "");
    }
    let title = TITLE_SEPARATORS.replace_all(&title, "").trim().to_string();
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}
