//! Media inlining: turns each `MediaRef` into a text fragment for the prompt.
//! Images are downloaded and embedded as base64 data URIs; anything that fails
//! degrades to a plain URL reference. Nothing here returns an error.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use metrics::counter;
use reqwest::Client;
use std::time::Duration;

use crate::source::{MediaKind, MediaRef};

pub const DEFAULT_DETAIL: &str = "low";
const FALLBACK_MIME: &str = "image/jpeg";

/// Raw HTTP response as seen by the inliner.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<Fetched>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent("tariff-post-classifier/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .context("building media http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<Fetched> {
        let resp = self.client.get(url).send().await.context("media get")?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = resp.bytes().await.context("media body")?.to_vec();
        Ok(Fetched {
            status,
            content_type,
            body,
        })
    }
}

/// Render one media item as a prompt fragment (each fragment starts with a newline).
pub async fn inline_media(fetcher: &dyn MediaFetcher, media: &MediaRef) -> String {
    match &media.kind {
        MediaKind::Image => inline_image(fetcher, media).await,
        MediaKind::Other(_) => {
            let dump = serde_json::to_string(media).unwrap_or_else(|_| media.url.clone());
            format!("\nNon-image media: {dump}")
        }
    }
}

/// Inline every media item of a post, in order.
pub async fn inline_all(fetcher: &dyn MediaFetcher, media: &[MediaRef]) -> Vec<String> {
    let mut out = Vec::with_capacity(media.len());
    for m in media {
        out.push(inline_media(fetcher, m).await);
    }
    out
}

async fn inline_image(fetcher: &dyn MediaFetcher, media: &MediaRef) -> String {
    counter!("media_fetch_total").increment(1);
    match fetcher.get(&media.url).await {
        Ok(f) if f.status == 200 => {
            let detail = media.detail.as_deref().unwrap_or(DEFAULT_DETAIL);
            let mime = image_mime(f.content_type.as_deref());
            format!("\nImage ({detail}): {}", data_uri(mime, &f.body))
        }
        Ok(f) => {
            tracing::warn!(url = %media.url, status = f.status, "image fetch non-200, using url");
            fallback(&media.url)
        }
        Err(e) => {
            tracing::warn!(url = %media.url, error = %e, "image fetch failed, using url");
            fallback(&media.url)
        }
    }
}

fn fallback(url: &str) -> String {
    counter!("media_fetch_fallback_total").increment(1);
    format!("\nImage URL: {url} (failed to fetch image)")
}

fn image_mime(content_type: Option<&str>) -> &str {
    content_type
        .map(|ct| ct.split(';').next().unwrap_or_default().trim())
        .filter(|ct| ct.starts_with("image/"))
        .unwrap_or(FALLBACK_MIME)
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct Canned(Option<Fetched>);

    #[async_trait]
    impl MediaFetcher for Canned {
        async fn get(&self, _url: &str) -> Result<Fetched> {
            self.0.clone().ok_or_else(|| anyhow!("connection refused"))
        }
    }

    fn ok(ct: Option<&str>, body: &[u8]) -> Canned {
        Canned(Some(Fetched {
            status: 200,
            content_type: ct.map(str::to_string),
            body: body.to_vec(),
        }))
    }

    #[tokio::test]
    async fn image_is_inlined_with_default_detail() {
        let f = ok(None, b"abc");
        let out = inline_media(&f, &MediaRef::image("https://x.test/a.jpg")).await;
        assert_eq!(out, "\nImage (low): data:image/jpeg;base64,YWJj");
    }

    #[tokio::test]
    async fn detail_hint_and_content_type_are_used() {
        let f = ok(Some("image/png; charset=binary"), b"abc");
        let mut m = MediaRef::image("https://x.test/a.png");
        m.detail = Some("high".into());
        let out = inline_media(&f, &m).await;
        assert!(out.starts_with("\nImage (high): data:image/png;base64,"));
    }

    #[tokio::test]
    async fn non_image_content_type_falls_back_to_jpeg() {
        let f = ok(Some("application/octet-stream"), b"x");
        let out = inline_media(&f, &MediaRef::image("u")).await;
        assert!(out.contains("data:image/jpeg;base64,"));
    }

    #[tokio::test]
    async fn non_200_yields_url_fallback() {
        let f = Canned(Some(Fetched {
            status: 404,
            content_type: None,
            body: vec![],
        }));
        let out = inline_media(&f, &MediaRef::image("https://x.test/gone.jpg")).await;
        assert_eq!(out, "\nImage URL: https://x.test/gone.jpg (failed to fetch image)");
    }

    #[tokio::test]
    async fn transport_error_yields_url_fallback() {
        let f = Canned(None);
        let out = inline_media(&f, &MediaRef::image("https://x.test/a.jpg")).await;
        assert!(out.contains("Image URL: https://x.test/a.jpg (failed to fetch image)"));
        assert!(!out.contains("base64"));
    }

    #[tokio::test]
    async fn other_media_is_dumped_as_json() {
        let f = Canned(None);
        let m = MediaRef {
            kind: MediaKind::Other("video".into()),
            url: "https://x.test/v.mp4".into(),
            detail: None,
        };
        let out = inline_media(&f, &m).await;
        assert_eq!(
            out,
            "\nNon-image media: {\"type\":\"video\",\"url\":\"https://x.test/v.mp4\"}"
        );
    }
}
