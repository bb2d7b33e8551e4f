use std::path::Path;

use serde_json::Value;
use tracing::{error, info, warn};
use url::Url;

use crate::article::extract_article;
use crate::config::{JobSource, Settings};
use crate::discover::{find_today_post, today_kst};
use crate::error::{NotifierError, Result};
use crate::fetch::Fetcher;
use crate::format::{compose_message, prepare_body};
use crate::gchat::{card_payload, carousel_payload, text_payload, Webhook};
use crate::utils;
use crate::{Article, Content};

pub const DEBUG_HTML_FILE: &str = "horoscope_debug_raw.html";

/// What a finished job hands to the delivery step.
#[derive(Debug, Clone)]
pub struct Outgoing {
    /// Human-readable rendition, printed on dry runs.
    pub preview: String,
    pub payload: Value,
}

/// Chat payload for an extracted article; `None` when it has neither text nor images.
pub fn build_outgoing(article: &Article, settings: &Settings) -> Option<Outgoing> {
    match &article.content {
        Content::Text(text) => {
            let body = prepare_body(text, settings.sentence_layout);
            let message = compose_message(&article.title, &article.url, &body, settings.max_len);
            let payload = if settings.card {
                card_payload(&message)
            } else {
                text_payload(&message)
            };
            Some(Outgoing {
                preview: message,
                payload,
            })
        }
        Content::Images(images) => Some(Outgoing {
            preview: format!("🔮 *{}*\n{}\n\n{}", article.title, article.url, images.join("\n")),
            payload: carousel_payload(&article.title, &article.url, images),
        }),
        Content::Empty => None,
    }
}

pub struct Runner {
    settings: Settings,
    fetcher: Fetcher,
    webhook: Option<Webhook>,
}

impl Runner {
    pub fn new(settings: Settings) -> Result<Self> {
        let fetcher = Fetcher::new(settings.fetch.clone())?;
        let webhook = settings
            .delivery_webhook()?
            .cloned()
            .map(Webhook::new)
            .transpose()?;
        Ok(Self {
            settings,
            fetcher,
            webhook,
        })
    }

    /// Article URLs to process, discovering today's post when none were given.
    pub async fn job_urls(&self) -> Result<Vec<Url>> {
        match &self.settings.jobs {
            JobSource::Articles(urls) => Ok(urls.clone()),
            JobSource::Discover(list_url) => {
                self.check_robots(list_url).await;
                let html = self.fetcher.get_text(list_url.as_str()).await?;
                let post = find_today_post(&html, list_url, today_kst())?;
                info!("found post URL: {post}");
                Ok(vec![post])
            }
        }
    }

    /// Runs every job in order and returns how many failed.
    pub async fn run(&self) -> Result<usize> {
        let urls = self.job_urls().await?;
        let mut failures = 0;
        for url in &urls {
            if let Err(e) = self.run_job(url).await {
                error!("job {url} failed: {e}");
                failures += 1;
            }
        }
        Ok(failures)
    }

    pub async fn run_job(&self, url: &Url) -> Result<()> {
        self.check_robots(url).await;
        let html = self.fetcher.get_text(url.as_str()).await?;
        let article = extract_article(&html, url, &self.settings.extract);

        let Some(outgoing) = build_outgoing(&article, &self.settings) else {
            if self.settings.debug {
                dump_debug_html(&html);
            }
            return Err(NotifierError::EmptyArticle(url.to_string()));
        };

        if let Some(path) = &self.settings.save {
            utils::save_json(&outgoing.payload, path)?;
        }

        match &self.webhook {
            Some(webhook) => {
                webhook.send(&outgoing.payload).await?;
                info!("done: {url}");
            }
            _ => {
                info!("dry run: skipping webhook delivery, printing instead");
                println!("{}", outgoing.preview);
            }
        }
        Ok(())
    }

    async fn check_robots(&self, url: &Url) {
        if !self.fetcher.robots_allows(url).await {
            warn!("robots.txt may disallow {url}; continuing since this is a personal notifier");
        }
    }
}

fn dump_debug_html(html: &str) {
    match utils::save_text(html, Path::new(DEBUG_HTML_FILE)) {
        Ok(()) => error!("extraction produced no content; raw HTML saved to {DEBUG_HTML_FILE}"),
        Err(e) => error!("failed to save debug html: {e}"),
    }
}
