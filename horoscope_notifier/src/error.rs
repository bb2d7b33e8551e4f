use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T, E = NotifierError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("GET {url} failed after {attempts} attempts: {source}")]
    Fetch {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid URL {input:?}: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("no '오늘의 운세' post link found on {0}")]
    PostNotFound(String),

    #[error("GCHAT_WEBHOOK is not set (pass --webhook or use --dry-run)")]
    MissingWebhook,

    #[error("webhook responded {status}: {body}")]
    Delivery { status: StatusCode, body: String },

    #[error("article at {0} had neither text nor images")]
    EmptyArticle(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl NotifierError {
    pub(crate) fn invalid_url(input: &str, source: url::ParseError) -> Self {
        Self::InvalidUrl {
            input: input.to_string(),
            source,
        }
    }
}
