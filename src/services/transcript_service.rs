use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use once_cell::sync::Lazy;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use thiserror::Error;

use crate::errors::AppError;

static VIDEO_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/(?:watch\?(?:.*&)?v=|shorts/|embed/)|youtu\.be/)([A-Za-z0-9_-]{11})")
        .unwrap()
});
static CAPTION_BASE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""captionTracks":\[\{"baseUrl":"([^"]+)""#).unwrap());
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

#[derive(Debug, Clone, Error)]
pub enum TranscriptError {
    #[error("Invalid YouTube URL")]
    InvalidUrl,

    #[error("No transcript available for this video")]
    NoCaptions,

    #[error("Failed to fetch transcript: {0}")]
    Fetch(String),
}

impl From<reqwest::Error> for TranscriptError {
    fn from(err: reqwest::Error) -> Self {
        TranscriptError::Fetch(err.to_string())
    }
}

impl From<TranscriptError> for AppError {
    fn from(err: TranscriptError) -> Self {
        AppError::IngestionError(err.to_string())
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, TranscriptError>;
}

pub fn video_id(url: &str) -> Option<String> {
    VIDEO_ID
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Fetches the first caption track of a YouTube video as plain text.
pub struct YouTubeTranscriptFetcher {
    client: reqwest::Client,
}

impl YouTubeTranscriptFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Mozilla/5.0 (compatible; tutor-server)")
            .build()
            .map_err(|e| AppError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TranscriptFetcher for YouTubeTranscriptFetcher {
    async fn fetch(&self, url: &str) -> Result<String, TranscriptError> {
        let id = video_id(url).ok_or(TranscriptError::InvalidUrl)?;
        log::info!("Fetching transcript for video {}", id);

        let page = self
            .client
            .get(format!("https://www.youtube.com/watch?v={}", id))
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let track_url = caption_track_url(&page).ok_or(TranscriptError::NoCaptions)?;
        let xml = self
            .client
            .get(track_url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let transcript = transcript_text(&xml)?;
        if transcript.trim().is_empty() {
            return Err(TranscriptError::NoCaptions);
        }
        Ok(transcript)
    }
}

fn caption_track_url(page: &str) -> Option<String> {
    CAPTION_BASE_URL
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace("\\u0026", "&").replace("\\/", "/"))
}

fn transcript_text(xml: &str) -> Result<String, TranscriptError> {
    let mut reader = Reader::from_str(xml);
    let mut lines = Vec::new();
    let mut line = String::new();
    // Nesting depth inside the current <text> element; zero outside of one.
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if depth > 0 {
                    depth += 1;
                } else if e.local_name().as_ref() == b"text" {
                    depth = 1;
                    line.clear();
                }
            }
            Ok(Event::End(_)) if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let cleaned = MARKUP.replace_all(&line, "");
                    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
                    if !cleaned.is_empty() {
                        lines.push(cleaned);
                    }
                }
            }
            Ok(Event::Text(e)) if depth > 0 => {
                let text = e
                    .unescape_with(|entity| resolve_html5_entity(entity))
                    .map_err(malformed)?;
                line.push_str(&decode_inner(&text));
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(e)),
            _ => {}
        }
    }

    Ok(lines.join(" "))
}

// Timed-text payloads are frequently double-encoded ("&amp;#39;"), so the
// unescaped text gets a second pass. Text with a bare '&' is kept as is.
fn decode_inner(text: &str) -> String {
    unescape_with(text, |entity| resolve_html5_entity(entity))
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| text.to_string())
}

fn malformed(err: impl std::fmt::Display) -> TranscriptError {
    TranscriptError::Fetch(format!("Malformed timed text: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_video_id_from_common_forms() {
        let expected = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), expected);
        assert_eq!(
            video_id("https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ&t=42"),
            expected
        );
        assert_eq!(video_id("https://youtu.be/dQw4w9WgXcQ?si=abc"), expected);
        assert_eq!(video_id("https://youtube.com/shorts/dQw4w9WgXcQ"), expected);
        assert_eq!(video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), expected);
    }

    #[test]
    fn rejects_non_youtube_urls() {
        assert_eq!(video_id("https://vimeo.com/12345678901"), None);
        assert_eq!(video_id("not a url"), None);
    }

    #[test]
    fn finds_caption_track_url() {
        let page = r#"..."captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=abc&lang=en","name":{}}]}}"#;
        assert_eq!(
            caption_track_url(page).as_deref(),
            Some("https://www.youtube.com/api/timedtext?v=abc&lang=en")
        );
        assert_eq!(caption_track_url("<html>no captions</html>"), None);
    }

    #[test]
    fn timed_text_becomes_plain_text() {
        let xml = r##"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.1" dur="2">Light is &amp;#39;energy&amp;#39;</text><text start="2.1" dur="1.5">for <font color="#fff">plants</font>
now</text><text start="4" dur="1"></text></transcript>"##;
        assert_eq!(transcript_text(xml).unwrap(), "Light is 'energy' for plants now");
    }

    #[test]
    fn numeric_and_named_entities_are_decoded() {
        let xml = r#"<transcript><text start="0" dur="1">It&amp;#8217;s &amp;#x27;ok&amp;#x27; &amp;mdash; done</text><text start="1" dur="1">Tom &amp; Jerry&nbsp;&lt;3</text></transcript>"#;
        assert_eq!(
            transcript_text(xml).unwrap(),
            "It\u{2019}s 'ok' \u{2014} done Tom & Jerry <3"
        );
    }

    #[test]
    fn escaped_markup_inside_captions_is_stripped() {
        let xml = r#"<transcript><text start="0" dur="1">&lt;i&gt;Music&lt;/i&gt; plays</text></transcript>"#;
        assert_eq!(transcript_text(xml).unwrap(), "Music plays");
    }

    #[test]
    fn malformed_timed_text_is_a_fetch_error() {
        let err = transcript_text("<transcript><text>open</other></transcript>").unwrap_err();
        assert!(matches!(err, TranscriptError::Fetch(_)));
    }

    #[tokio::test]
    async fn invalid_url_fails_before_network() {
        let fetcher = YouTubeTranscriptFetcher::new(5).unwrap();
        let err = fetcher.fetch("https://example.com/video").await.unwrap_err();
        assert!(matches!(err, TranscriptError::InvalidUrl));
    }
}
