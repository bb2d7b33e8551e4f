use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::error::{NotifierError, Result};

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(20);

/// Plain text message.
pub fn text_payload(message: &str) -> Value {
    json!({ "text": message })
}

/// Legacy card that keeps line formatting inside a text paragraph widget.
pub fn card_payload(message: &str) -> Value {
    json!({
        "cards": [{
            "sections": [{
                "widgets": [{ "textParagraph": { "text": message } }]
            }]
        }]
    })
}

/// Card with an image carousel, one carousel card per image.
pub fn carousel_payload(title: &str, page_url: &str, images: &[String]) -> Value {
    let carousel_cards: Vec<Value> = images
        .iter()
        .map(|image| json!({ "widgets": [{ "image": { "imageUrl": image } }] }))
        .collect();

    json!({
        "text": format!("🔮 *{title}*\n{page_url}"),
        "cardsV2": [{
            "cardId": "horoscope-images",
            "card": {
                "header": { "title": title, "subtitle": page_url },
                "sections": [{
                    "widgets": [{ "carousel": { "carouselCards": carousel_cards } }]
                }]
            }
        }]
    })
}

pub struct Webhook {
    client: reqwest::Client,
    url: Url,
}

impl Webhook {
    pub fn new(url: Url) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(DELIVERY_TIMEOUT)
                .build()?,
            url,
        })
    }

    /// POSTs the payload once; a non-2xx answer is logged with its body and returned as an error.
    pub async fn send(&self, payload: &Value) -> Result<()> {
        if let Some(message) = payload.get("text").and_then(Value::as_str) {
            info!(
                "Sending to GChat: message length={} chars, newlines={}",
                message.chars().count(),
                message.matches('\n').count()
            );
        }
        debug!("GChat payload JSON: {payload}");

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=UTF-8"),
        );

        let response = self
            .client
            .post(self.url.clone())
            .headers(headers)
            .json(payload)
            .send()
            .await
            .inspect_err(|e| error!("GChat POST failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("GChat delivery failed: {status} {body}");
            return Err(NotifierError::Delivery { status, body });
        }

        info!("Google Chat delivery succeeded: {status}");
        Ok(())
    }
}
