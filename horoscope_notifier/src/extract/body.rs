use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};

use super::{ExtractOptions, FALLBACK_BLOCK_SELECTOR, NON_TEXT_TAGS};

/// Which rule produced the chosen container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodySource {
    /// One of the content hints matched; holds the hint that matched the winner.
    Selector(String),
    /// No hint matched; the winner came from the block-element scan.
    DensityFallback,
}

#[derive(Debug, Clone)]
pub enum Selection<'a> {
    Container {
        element: ElementRef<'a>,
        source: BodySource,
        text_len: usize,
    },
    /// Nothing usable; callers fall back to the whole document's text.
    FullDocument,
}

impl<'a> Selection<'a> {
    pub fn label(&self) -> &'static str {
        match self {
            Selection::Container {
                source: BodySource::Selector(_),
                ..
            } => "selector",
            Selection::Container {
                source: BodySource::DensityFallback,
                ..
            } => "density-fallback",
            Selection::FullDocument => "full-document",
        }
    }

    pub fn element(&self) -> Option<ElementRef<'a>> {
        match self {
            Selection::Container { element, .. } => Some(*element),
            Selection::FullDocument => None,
        }
    }
}

/// Text nodes under `element` in document order, skipping script, style and similar bodies.
pub fn visible_text<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> {
    element.descendants().filter_map(|node| {
        let Node::Text(text) = node.value() else {
            return None;
        };
        let hidden = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|el| NON_TEXT_TAGS.contains(&el.value().name()));
        (!hidden).then_some(&**text)
    })
}

/// Length in characters of the element's visible text, nodes trimmed and joined by single spaces.
pub fn rendered_len(element: ElementRef<'_>) -> usize {
    let mut len = 0;
    let mut first = true;
    for piece in visible_text(element).map(str::trim).filter(|t| !t.is_empty()) {
        if !first {
            len += 1;
        }
        len += piece.chars().count();
        first = false;
    }
    len
}

/// Returns the item with the greatest length; on ties the earliest one wins.
pub fn pick_longest<T>(candidates: impl IntoIterator<Item = (T, usize)>) -> Option<(T, usize)> {
    candidates.into_iter().fold(None, |best, (item, len)| match best {
        Some((_, best_len)) if best_len >= len => best,
        _ => Some((item, len)),
    })
}

pub fn select_body<'a>(document: &'a Html, options: &ExtractOptions) -> Selection<'a> {
    let mut hinted: Vec<(ElementRef<'a>, String)> = Vec::new();
    for css in &options.selectors {
        let Ok(selector) = Selector::parse(css) else {
            warn!("skipping unparsable content selector {css:?}");
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            debug!(
                "selector matched: {css} -> element text length={}",
                rendered_len(element)
            );
            if !hinted.iter().any(|(seen, _)| seen.id() == element.id()) {
                hinted.push((element, css.clone()));
            }
        }
    }

    if !hinted.is_empty() {
        sort_by_document_order(document, &mut hinted);
        let scored = hinted
            .into_iter()
            .map(|(element, css)| ((element, css), rendered_len(element)));
        if let Some(((element, css), text_len)) = pick_longest(scored) {
            debug!("chosen body element ({css}) text length={text_len}");
            return Selection::Container {
                element,
                source: BodySource::Selector(css),
                text_len,
            };
        }
    }

    let blocks: Vec<ElementRef<'a>> = match Selector::parse(FALLBACK_BLOCK_SELECTOR) {
        Ok(selector) => document
            .select(&selector)
            .take(options.fallback_limit)
            .collect(),
        Err(_) => Vec::new(),
    };
    debug!("fallback blocks found: {}", blocks.len());

    match pick_longest(blocks.into_iter().map(|el| (el, rendered_len(el)))) {
        Some((element, text_len)) => {
            debug!("chosen fallback block text length={text_len}");
            Selection::Container {
                element,
                source: BodySource::DensityFallback,
                text_len,
            }
        }
        None => {
            debug!("no candidates: using full document text");
            Selection::FullDocument
        }
    }
}

fn sort_by_document_order<T>(document: &Html, items: &mut Vec<(ElementRef<'_>, T)>) {
    let mut ordered = Vec::with_capacity(items.len());
    for node in document.root_element().descendants() {
        if let Some(pos) = items.iter().position(|(el, _)| el.id() == node.id()) {
            ordered.push(items.swap_remove(pos));
            if items.is_empty() {
                break;
            }
        }
    }
    // anything not under the root element keeps its relative order at the end
    ordered.append(items);
    *items = ordered;
}
