use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::error::{NotifierError, Result};
use crate::extract::{ExtractOptions, BOILERPLATE_MAX_CHARS};
use crate::fetch::FetchConfig;
use crate::format::MAX_MESSAGE_CHARS;

pub const DEFAULT_LIST_URL: &str = "https://askjiyun.com/today";

/// Send today's horoscope post to Google Chat.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Article URL to send; repeat for several jobs. Skips list-page discovery
    #[arg(short, long = "url")]
    pub urls: Vec<String>,

    /// List page that links to the daily posts
    #[arg(long, default_value = DEFAULT_LIST_URL)]
    pub list_url: String,

    /// Google Chat incoming webhook URL
    #[arg(long, env = "GCHAT_WEBHOOK", hide_env_values = true)]
    pub webhook: Option<String>,

    /// Print the message instead of posting it
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging and dump raw HTML when extraction finds nothing
    #[arg(long)]
    pub debug: bool,

    /// Send text inside a card widget instead of a plain message
    #[arg(long)]
    pub card: bool,

    /// Keep paragraphs instead of putting each sentence on its own line
    #[arg(long)]
    pub no_sentence_breaks: bool,

    /// Maximum message length in characters before truncation
    #[arg(long, default_value_t = MAX_MESSAGE_CHARS)]
    pub max_len: usize,

    /// Paragraphs shorter than this are dropped when they look like share/comment footers
    #[arg(long, default_value_t = BOILERPLATE_MAX_CHARS)]
    pub boilerplate_max_chars: usize,

    /// Attempts per GET request
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 15)]
    pub timeout: u64,

    /// Write the outgoing payload as JSON to this file
    #[arg(long)]
    pub save: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    /// Find today's post on a list page.
    Discover(Url),
    Articles(Vec<Url>),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub jobs: JobSource,
    /// Always present unless `dry_run` is set.
    pub webhook: Option<Url>,
    pub dry_run: bool,
    pub debug: bool,
    pub card: bool,
    pub sentence_layout: bool,
    pub max_len: usize,
    pub save: Option<PathBuf>,
    pub fetch: FetchConfig,
    pub extract: ExtractOptions,
}

impl Settings {
    /// Validates flags; a missing webhook fails here, before any network work.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let webhook = match cli.webhook.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_url(raw)?),
            _ => None,
        };

        let jobs = if cli.urls.is_empty() {
            JobSource::Discover(parse_url(&cli.list_url)?)
        } else {
            JobSource::Articles(
                cli.urls
                    .iter()
                    .map(|u| parse_url(u))
                    .collect::<Result<Vec<_>>>()?,
            )
        };

        let referer = match &jobs {
            JobSource::Discover(url) => site_root(url),
            JobSource::Articles(urls) => urls.first().map(site_root).unwrap_or_default(),
        };

        let extract = ExtractOptions {
            boilerplate_max_chars: cli.boilerplate_max_chars,
            ..ExtractOptions::default()
        };

        let settings = Self {
            jobs,
            webhook,
            dry_run: cli.dry_run,
            debug: cli.debug,
            card: cli.card,
            sentence_layout: !cli.no_sentence_breaks,
            max_len: cli.max_len,
            save: cli.save,
            fetch: FetchConfig {
                timeout: Duration::from_secs(cli.timeout),
                attempts: cli.retries.max(1),
                referer,
                ..FetchConfig::default()
            },
            extract,
        };
        settings.delivery_webhook()?;
        Ok(settings)
    }

    /// Where payloads go: `None` on a dry run, an error when a live run has no webhook.
    pub fn delivery_webhook(&self) -> Result<Option<&Url>> {
        match (&self.webhook, self.dry_run) {
            (_, true) => Ok(None),
            (Some(url), false) => Ok(Some(url)),
            (None, false) => Err(NotifierError::MissingWebhook),
        }
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|source| NotifierError::invalid_url(raw, source))
}

fn site_root(url: &Url) -> String {
    url.join("/")
        .map(|root| root.as_str().trim_end_matches('/').to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["horoscope_notifier"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn webhook_is_required_without_dry_run() {
        let mut parsed = cli(&[]);
        parsed.webhook = None;
        assert!(matches!(
            Settings::from_cli(parsed),
            Err(NotifierError::MissingWebhook)
        ));
    }

    #[test]
    fn blank_webhook_counts_as_missing() {
        let mut parsed = cli(&[]);
        parsed.webhook = Some("  ".into());
        assert!(matches!(
            Settings::from_cli(parsed),
            Err(NotifierError::MissingWebhook)
        ));
    }

    #[test]
    fn dry_run_needs_no_webhook() {
        let mut parsed = cli(&["--dry-run"]);
        parsed.webhook = None;
        let settings = Settings::from_cli(parsed).unwrap();
        assert!(settings.webhook.is_none());
        assert_eq!(
            settings.jobs,
            JobSource::Discover(Url::parse(DEFAULT_LIST_URL).unwrap())
        );
        assert_eq!(settings.fetch.referer, "https://askjiyun.com");
        assert_eq!(settings.max_len, MAX_MESSAGE_CHARS);
        assert!(settings.sentence_layout);
    }

    #[test]
    fn delivery_webhook_follows_dry_run() {
        let mut parsed = cli(&["--dry-run"]);
        parsed.webhook = Some("https://chat.googleapis.com/v1/spaces/x/messages".into());
        let mut settings = Settings::from_cli(parsed).unwrap();
        assert!(settings.delivery_webhook().unwrap().is_none());

        settings.dry_run = false;
        assert!(settings.delivery_webhook().unwrap().is_some());

        settings.webhook = None;
        assert!(matches!(
            settings.delivery_webhook(),
            Err(NotifierError::MissingWebhook)
        ));
    }

    #[test]
    fn explicit_urls_become_article_jobs() {
        let parsed = cli(&[
            "--webhook",
            "https://chat.googleapis.com/v1/spaces/x/messages?key=k",
            "--url",
            "https://askjiyun.com/today/1",
            "-u",
            "https://example.com/post/2",
            "--retries",
            "0",
        ]);
        let settings = Settings::from_cli(parsed).unwrap();
        match settings.jobs {
            JobSource::Articles(urls) => assert_eq!(urls.len(), 2),
            other => panic!("unexpected jobs {other:?}"),
        }
        assert_eq!(settings.fetch.attempts, 1);
    }

    #[test]
    fn invalid_webhook_is_rejected() {
        let mut parsed = cli(&[]);
        parsed.webhook = Some("not a url".into());
        assert!(matches!(
            Settings::from_cli(parsed),
            Err(NotifierError::InvalidUrl { .. })
        ));
    }
}
