//! Caption lookup through yt-dlp metadata.

use super::{CaptionError, CaptionSegment, CaptionSource};
use crate::config::CaptionSettings;
use crate::error::{Result, SkrivError};
use crate::video::VideoId;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument};
use url::Url;

/// Reads the caption tracks yt-dlp reports for a video and downloads the preferred one.
pub struct YtDlpCaptionSource {
    languages: Vec<String>,
    http: reqwest::Client,
}

impl YtDlpCaptionSource {
    pub fn from_settings(settings: &CaptionSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()?;

        Ok(Self {
            languages: settings.languages.clone(),
            http,
        })
    }

    async fn video_info(&self, video_id: &VideoId) -> std::result::Result<Value, CaptionError> {
        let output = Command::new("yt-dlp")
            .arg("--dump-json")
            .arg("--skip-download")
            .arg("--no-playlist")
            .arg("--no-warnings")
            .arg(video_id.watch_url())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    CaptionError::Lookup(SkrivError::ToolNotFound("yt-dlp".into()).to_string())
                }
                _ => CaptionError::Lookup(format!("yt-dlp execution failed: {e}")),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptionError::Lookup(format!(
                "yt-dlp metadata failed for {}: {}",
                video_id,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| CaptionError::Lookup(format!("invalid yt-dlp metadata: {e}")))
    }

    async fn download_track(&self, url: &str) -> std::result::Result<String, CaptionError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| CaptionError::Lookup(format!("caption download failed: {e}")))?;

        response
            .text()
            .await
            .map_err(|e| CaptionError::Lookup(format!("caption download failed: {e}")))
    }
}

#[async_trait]
impl CaptionSource for YtDlpCaptionSource {
    #[instrument(skip(self), fields(video_id = %video_id))]
    async fn fetch_segments(
        &self,
        video_id: &VideoId,
    ) -> std::result::Result<Vec<CaptionSegment>, CaptionError> {
        let info = self.video_info(video_id).await?;
        let track = select_track(&info, &self.languages)?;

        info!("Using {} caption track ({})", track.kind, track.language);
        debug!("Caption track URL: {}", track.url);

        let body = self.download_track(&track.url).await?;
        parse_json3(&body)
    }
}

/// The caption track chosen for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SelectedTrack {
    pub language: String,
    /// "manual" or "automatic".
    pub kind: &'static str,
    pub url: String,
}

/// Pick a caption track from yt-dlp metadata.
///
/// Exact language matches win over regional variants (`en` before `en-GB`). Within each,
/// uploaded tracks win over automatic ones, and languages are tried in the order given.
pub(crate) fn select_track(
    info: &Value,
    languages: &[String],
) -> std::result::Result<SelectedTrack, CaptionError> {
    let manual = info.get("subtitles").and_then(Value::as_object);
    let automatic = info.get("automatic_captions").and_then(Value::as_object);

    let has_any = [manual, automatic]
        .iter()
        .flatten()
        .any(|tracks| !tracks.is_empty());
    if !has_any {
        return Err(CaptionError::Disabled);
    }

    let sources = [("manual", manual), ("automatic", automatic)];

    let exact = |lang: &str, key: &str| key.eq_ignore_ascii_case(lang);
    let regional = |lang: &str, key: &str| {
        key.get(..lang.len()).is_some_and(|p| p.eq_ignore_ascii_case(lang))
            && key[lang.len()..].starts_with('-')
    };
    let matchers: [&dyn Fn(&str, &str) -> bool; 2] = [&exact, &regional];

    for is_match in matchers {
        for lang in languages {
            for (kind, tracks) in sources {
                let Some(tracks) = tracks else { continue };
                let mut keys: Vec<&String> = tracks.keys().filter(|k| is_match(lang, k)).collect();
                keys.sort();

                for key in keys {
                    if let Some(url) = tracks.get(key).and_then(json3_url) {
                        return Ok(SelectedTrack {
                            language: key.clone(),
                            kind,
                            url,
                        });
                    }
                }
            }
        }
    }

    Err(CaptionError::NotFound(languages.to_vec()))
}

/// URL of a track's json3 rendition, forcing the format on the first usable URL if needed.
///
/// Machine translations of another track are not usable.
fn json3_url(formats: &Value) -> Option<String> {
    let formats: Vec<(Option<&str>, &str)> = formats
        .as_array()?
        .iter()
        .filter_map(|f| {
            let url = f.get("url").and_then(Value::as_str)?;
            Some((f.get("ext").and_then(Value::as_str), url))
        })
        .filter(|(_, url)| !is_translation(url))
        .collect();

    if let Some((_, url)) = formats.iter().find(|(ext, _)| *ext == Some("json3")) {
        return Some(url.to_string());
    }

    let raw = formats.first()?.1;
    let mut url = Url::parse(raw).ok()?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "fmt")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");

    Some(url.to_string())
}

/// Translated tracks carry the target language in a `tlang` query parameter.
fn is_translation(raw: &str) -> bool {
    Url::parse(raw).is_ok_and(|url| url.query_pairs().any(|(key, _)| key == "tlang"))
}

#[derive(Debug, Deserialize)]
struct Json3 {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a YouTube json3 caption document into segments.
pub(crate) fn parse_json3(body: &str) -> std::result::Result<Vec<CaptionSegment>, CaptionError> {
    let doc: Json3 = serde_json::from_str(body)
        .map_err(|e| CaptionError::Lookup(format!("invalid caption document: {e}")))?;

    Ok(doc
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.trim();
            (!text.is_empty()).then(|| CaptionSegment::new(event.start_ms as f64 / 1000.0, text))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_tracks_means_disabled() {
        let info = json!({ "id": "abc", "subtitles": {}, "automatic_captions": {} });
        assert_eq!(select_track(&info, &langs(&["en"])), Err(CaptionError::Disabled));

        let info = json!({ "id": "abc" });
        assert_eq!(select_track(&info, &langs(&["en"])), Err(CaptionError::Disabled));
    }

    #[test]
    fn test_other_language_only_is_not_found() {
        let info = json!({
            "subtitles": { "de": [{ "ext": "json3", "url": "https://example.com/de" }] }
        });
        assert_eq!(
            select_track(&info, &langs(&["en"])),
            Err(CaptionError::NotFound(langs(&["en"])))
        );
    }

    #[test]
    fn test_manual_preferred_over_automatic() {
        let info = json!({
            "subtitles": { "en": [{ "ext": "json3", "url": "https://example.com/manual" }] },
            "automatic_captions": { "en": [{ "ext": "json3", "url": "https://example.com/auto" }] }
        });
        let track = select_track(&info, &langs(&["en"])).unwrap();
        assert_eq!(track.kind, "manual");
        assert_eq!(track.url, "https://example.com/manual");
    }

    #[test]
    fn test_exact_language_preferred_over_regional() {
        let info = json!({
            "subtitles": { "en-GB": [{ "ext": "json3", "url": "https://example.com/gb" }] },
            "automatic_captions": { "en": [{ "ext": "json3", "url": "https://example.com/auto" }] }
        });
        let track = select_track(&info, &langs(&["en"])).unwrap();
        assert_eq!(track.language, "en");
        assert_eq!(track.kind, "automatic");
    }

    #[test]
    fn test_regional_fallback() {
        let info = json!({
            "subtitles": { "en-US": [{ "ext": "json3", "url": "https://example.com/us" }] }
        });
        let track = select_track(&info, &langs(&["en"])).unwrap();
        assert_eq!(track.language, "en-US");
    }

    #[test]
    fn test_forces_json3_format() {
        let info = json!({
            "subtitles": { "en": [{ "ext": "vtt", "url": "https://example.com/timedtext?v=abc&fmt=vtt" }] }
        });
        let track = select_track(&info, &langs(&["en"])).unwrap();
        assert_eq!(track.url, "https://example.com/timedtext?v=abc&fmt=json3");
    }

    #[test]
    fn test_translated_tracks_are_skipped() {
        let info = json!({
            "automatic_captions": {
                "de-orig": [{ "ext": "json3", "url": "https://example.com/timedtext?v=abc&lang=de&fmt=json3" }],
                "en": [{ "ext": "json3", "url": "https://example.com/timedtext?v=abc&lang=de&tlang=en&fmt=json3" }]
            }
        });
        assert_eq!(
            select_track(&info, &langs(&["en"])),
            Err(CaptionError::NotFound(langs(&["en"])))
        );
    }

    #[test]
    fn test_original_track_chosen_over_translation() {
        let info = json!({
            "automatic_captions": {
                "en": [
                    { "ext": "json3", "url": "https://example.com/timedtext?v=abc&lang=de&tlang=en&fmt=json3" },
                    { "ext": "vtt", "url": "https://example.com/timedtext?v=abc&lang=en&fmt=vtt" }
                ]
            }
        });
        let track = select_track(&info, &langs(&["en"])).unwrap();
        assert_eq!(track.url, "https://example.com/timedtext?v=abc&lang=en&fmt=json3");
    }

    #[test]
    fn test_parse_json3() {
        let body = r#"{
            "events": [
                { "tStartMs": 0, "dDurationMs": 1000 },
                { "tStartMs": 1200, "segs": [{ "utf8": "hello " }, { "utf8": "world" }] },
                { "tStartMs": 2500, "segs": [{ "utf8": "\n" }] },
                { "tStartMs": 3000, "segs": [{ "utf8": "again" }] }
            ]
        }"#;
        let segments = parse_json3(body).unwrap();
        assert_eq!(
            segments,
            vec![CaptionSegment::new(1.2, "hello world"), CaptionSegment::new(3.0, "again")]
        );
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        assert!(matches!(parse_json3("<xml/>"), Err(CaptionError::Lookup(_))));
    }
}
