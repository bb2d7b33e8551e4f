use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Node};
use tracing::debug;

use super::body::{visible_text, Selection};
use super::rules::{apply_rules, PUNCTUATION_RULES};
use super::{ExtractOptions, NOISE_PREFIX_MIN_CHARS};

static HSPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]{2,}").expect("HSPACE_RUN should compile"));

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li", "main", "ol", "p", "pre", "section", "table",
    "td", "th", "tr", "ul",
];

/// Turns the selected container (or the whole document) into cleaned paragraph text.
///
/// Never returns an empty string while the source still has text: when pruning and
/// boilerplate filtering remove everything, the unpruned container text is returned.
pub fn reconstruct(document: &Html, selection: &Selection<'_>, options: &ExtractOptions) -> String {
    let Some(container) = selection.element() else {
        let text = raw_text(document.root_element());
        debug!("no container: using full document text length={}", text.chars().count());
        return text;
    };

    let pruned = prune_noise(document, container, options);
    let rendered = pruned
        .tree
        .get(container.id())
        .and_then(ElementRef::wrap)
        .map(render_block_text)
        .unwrap_or_default();

    let lines = collapse_blank_runs(&rendered);
    let paragraphs = merge_paragraphs(&lines)
        .iter()
        .map(|p| repair_paragraph(p))
        .collect();
    let text = drop_boilerplate(paragraphs, options)
        .join("\n\n")
        .trim()
        .to_string();

    if !text.is_empty() {
        debug!("final text length={}", text.chars().count());
        return text;
    }

    debug!("cleaned text empty, falling back to raw container text");
    raw_text(container)
}

/// Copy of `document` with noise subtrees under `container` detached.
fn prune_noise(document: &Html, container: ElementRef<'_>, options: &ExtractOptions) -> Html {
    let noise: Vec<_> = container
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|el| is_noise(el, options))
        .map(|el| el.id())
        .collect();

    let mut pruned = document.clone();
    for id in noise {
        if let Some(mut node) = pruned.tree.get_mut(id) {
            node.detach();
        }
    }
    pruned
}

fn is_noise(element: &ElementRef<'_>, options: &ExtractOptions) -> bool {
    let el = element.value();
    if options.noise_tags.iter().any(|tag| tag == el.name()) {
        return true;
    }
    ["class", "id"]
        .iter()
        .filter_map(|attr| el.attr(attr))
        .flat_map(|value| value.split(|c: char| c.is_whitespace() || c == '-' || c == '_'))
        .map(str::to_ascii_lowercase)
        .any(|word| {
            options
                .noise_tokens
                .iter()
                .any(|token| word_matches_token(&word, &token.to_ascii_lowercase()))
        })
}

/// Short tokens must match the whole word; longer ones also match as a prefix (`sharebox`).
fn word_matches_token(word: &str, token: &str) -> bool {
    if token.chars().count() < NOISE_PREFIX_MIN_CHARS {
        word == token
    } else {
        word.starts_with(token)
    }
}

/// Renders an element with one line per text node and a blank line around block elements.
pub fn render_block_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    render_into(element, &mut out);
    out
}

fn render_into(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    line_break(out);
                    out.push_str(text);
                }
            }
            Node::Element(el) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if el.name() == "br" {
                    out.push('\n');
                    continue;
                }
                let block = BLOCK_TAGS.contains(&el.name());
                if block {
                    paragraph_break(out);
                }
                render_into(child, out);
                if block {
                    paragraph_break(out);
                }
            }
            _ => {}
        }
    }
}

fn line_break(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn paragraph_break(out: &mut String) {
    if out.is_empty() {
        return;
    }
    while !out.ends_with("\n\n") {
        out.push('\n');
    }
}

/// Trims every line, keeps at most one blank line in a row and squeezes inner whitespace runs.
pub fn collapse_blank_runs(text: &str) -> Vec<String> {
    let mut cleaned = Vec::new();
    let mut prev_blank = false;
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !prev_blank {
                cleaned.push(String::new());
                prev_blank = true;
            }
        } else {
            cleaned.push(HSPACE_RUN.replace_all(line, " ").into_owned());
            prev_blank = false;
        }
    }
    cleaned
}

/// Joins consecutive non-blank lines with a space; blank lines separate paragraphs.
pub fn merge_paragraphs<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in lines.iter().map(AsRef::as_ref) {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join(" ").trim().to_string());
                current.clear();
            }
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" ").trim().to_string());
    }
    paragraphs
}

pub fn repair_paragraph(paragraph: &str) -> String {
    apply_rules(&PUNCTUATION_RULES, paragraph)
}

/// Drops short paragraphs that carry a share/comment/source marker.
pub fn drop_boilerplate(paragraphs: Vec<String>, options: &ExtractOptions) -> Vec<String> {
    paragraphs
        .into_iter()
        .filter(|p| {
            let boilerplate = p.chars().count() < options.boilerplate_max_chars
                && options
                    .boilerplate_markers
                    .iter()
                    .any(|marker| p.contains(marker.as_str()));
            if boilerplate {
                debug!("dropping short boilerplate paragraph: {p:?}");
            }
            !boilerplate
        })
        .filter(|p| !p.is_empty())
        .collect()
}

/// Visible text nodes one per line with whitespace normalized; no noise pruning.
pub fn raw_text(element: ElementRef<'_>) -> String {
    let joined = visible_text(element)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    collapse_blank_runs(&joined).join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::select_body;

    fn run(html: &str) -> String {
        let doc = Html::parse_document(html);
        let options = ExtractOptions::default();
        let selection = select_body(&doc, &options);
        reconstruct(&doc, &selection, &options)
    }

    #[test]
    fn prunes_noise_but_keeps_lookalike_classes() {
        let html = r#"<article>
            <p>본문 내용입니다.</p>
            <div class="share-box">카카오톡으로 보내기</div>
            <script>var tracking = 1;</script>
            <nav>이전 글 다음 글</nav>
            <div class="read_body">계속되는 본문</div>
            <div id="ad_top">배너</div>
        </article>"#;
        assert_eq!(run(html), "본문 내용입니다.\n\n계속되는 본문");
    }

    #[test]
    fn pruning_does_not_touch_the_callers_document() {
        let doc = Html::parse_document(
            r#"<div class="xe_content"><p>운세 본문</p><div class="social">SNS</div></div>"#,
        );
        let options = ExtractOptions::default();
        let selection = select_body(&doc, &options);
        assert_eq!(reconstruct(&doc, &selection, &options), "운세 본문");
        assert!(raw_text(selection.element().unwrap()).contains("SNS"));
    }

    #[test]
    fn wrapped_lines_merge_into_one_paragraph() {
        let html = "<div class=\"xe_content\">쥐띠는<br>오늘 좋은 일이<br>있습니다.<br><br>소띠는 조심하세요.</div>";
        assert_eq!(run(html), "쥐띠는 오늘 좋은 일이 있습니다.\n\n소띠는 조심하세요.");
    }

    #[test]
    fn inline_markup_is_joined_with_spaces() {
        let html = "<div class=\"xe_content\"><p><b>72</b> 년생 <span>재물운</span> 상승 !</p></div>";
        assert_eq!(run(html), "72년생 재물운 상승!");
    }

    #[test]
    fn long_paragraph_with_marker_is_kept_verbatim() {
        let long = format!("오늘은 친구와 기쁨을 공유하면 좋은 날입니다{}", "가".repeat(180));
        assert!(long.chars().count() > 200);
        let html = format!("<div class=\"xe_content\"><p>{long}</p><p>출처: 운세</p></div>");
        assert_eq!(run(&html), long);
    }

    #[test]
    fn boilerplate_only_container_falls_back_to_raw_text() {
        assert_eq!(run(r#"<div class="xe_content"><p>댓글   0</p></div>"#), "댓글 0");
    }

    #[test]
    fn fully_pruned_container_falls_back_to_raw_text() {
        let html = r#"<div class="xe_content"><div class="ad">광고 문구만 있음</div></div>"#;
        assert_eq!(run(html), "광고 문구만 있음");
    }

    #[test]
    fn ad_and_share_prefixes_are_pruned() {
        let html = r#"<div class="xe_content"><p>쥐띠는 좋은 날입니다.</p>
            <div class="ads">지금 가입하면 50% 할인 쿠폰 증정</div>
            <ins class="adsbygoogle">광고</ins>
            <div id="sharebox">카카오톡 보내기</div>
            <ul class="socialLinks"><li>페이스북</li></ul></div>"#;
        assert_eq!(run(html), "쥐띠는 좋은 날입니다.");
    }

    #[test]
    fn short_token_needs_whole_word() {
        let html = r#"<div class="xe_content"><p class="address">서울시 어딘가</p><p>본문</p></div>"#;
        assert_eq!(run(html), "서울시 어딘가\n\n본문");
    }

    #[test]
    fn script_and_style_never_reach_the_fallback() {
        let html = r#"<html><head><style>body{color:red}</style><script>var tracking=1;</script></head>
            <body><p>오늘의 운세</p></body></html>"#;
        assert_eq!(run(html), "오늘의 운세");

        let html = r#"<div class="xe_content"><script>var tracking=1;</script><p>댓글 0</p></div>"#;
        assert_eq!(run(html), "댓글 0");
    }

    #[test]
    fn collapse_keeps_single_blank_lines() {
        let lines = collapse_blank_runs("  a  \n\n\n\t\nb    c\n");
        assert_eq!(lines, vec!["a", "", "b c"]);
    }

    #[test]
    fn trailing_paragraph_is_emitted() {
        let paragraphs = merge_paragraphs(&["첫", "줄", "", "", "끝"]);
        assert_eq!(paragraphs, vec!["첫 줄", "끝"]);
    }

    #[test]
    fn drop_boilerplate_threshold_is_strict() {
        let mut options = ExtractOptions::default();
        options.boilerplate_max_chars = 4;
        let kept = drop_boilerplate(vec!["공유하기".into(), "공유".into(), "본문".into()], &options);
        assert_eq!(kept, vec!["공유하기", "본문"]);
    }
}
