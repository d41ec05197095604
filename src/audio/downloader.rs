//! yt-dlp/ffmpeg backed audio acquisition and splitting.

use super::{AudioAcquirer, AudioArtifact};
use crate::error::{Result, SkrivError};
use crate::video::VideoId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Containers yt-dlp may leave behind when mp3 extraction is skipped.
const KNOWN_EXTENSIONS: &[&str] = &["mp3", "m4a", "opus", "webm", "ogg", "wav"];

/// Downloads audio with yt-dlp into a shared temporary directory.
///
/// Each request writes `<video id>-<uuid>.*`, so concurrent requests for the same video
/// never touch each other's files.
pub struct YtDlpAcquirer {
    temp_dir: PathBuf,
}

impl YtDlpAcquirer {
    pub fn new(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
        }
    }

    async fn download(&self, video_id: &VideoId, stem: &str) -> Result<PathBuf> {
        let url = video_id.watch_url();
        let template = self.temp_dir.join(format!("{}.%(ext)s", stem));
        let target_path = self.temp_dir.join(format!("{}.mp3", stem));

        info!("Downloading audio from {}", url);

        let result = Command::new("yt-dlp")
            .arg("--format").arg("bestaudio/best")
            .arg("--extract-audio")
            .arg("--audio-format").arg("mp3")
            .arg("--audio-quality").arg("192K")
            .arg("--output").arg(&template)
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg(&url)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SkrivError::ToolNotFound("yt-dlp".into()));
            }
            Err(e) => {
                return Err(SkrivError::AudioDownload(format!("yt-dlp execution failed: {e}")));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SkrivError::AudioDownload(format!(
                "yt-dlp failed for {}: {}",
                video_id,
                stderr.trim()
            )));
        }

        let downloaded = find_audio_file(&self.temp_dir, stem)?;

        if downloaded != target_path {
            warn!("Expected mp3 not found, converting {}", downloaded.display());
            let converted = normalize_to_mp3(&downloaded, &target_path).await;
            remove_logged(&downloaded, "source container");
            converted?;
        }

        Ok(target_path)
    }
}

#[async_trait]
impl AudioAcquirer for YtDlpAcquirer {
    #[instrument(skip(self), fields(video_id = %video_id))]
    async fn acquire(&self, video_id: &VideoId) -> Result<AudioArtifact> {
        std::fs::create_dir_all(&self.temp_dir)?;

        let stem = format!("{}-{}", video_id.file_stem(), Uuid::new_v4().simple());

        match self.download(video_id, &stem).await {
            Ok(path) => {
                info!("Audio downloaded to {}", path.display());
                Ok(AudioArtifact::new(path))
            }
            Err(e) => {
                remove_partials(&self.temp_dir, &stem);
                Err(e)
            }
        }
    }
}

/// Locates the file yt-dlp produced for a request stem.
fn find_audio_file(dir: &Path, stem: &str) -> Result<PathBuf> {
    for ext in KNOWN_EXTENSIONS {
        let candidate = dir.join(format!("{}.{}", stem, ext));
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    let entries = std::fs::read_dir(dir)
        .map_err(|e| SkrivError::AudioDownload(format!("Cannot read directory: {e}")))?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        // yt-dlp leaves .part/.ytdl files while working; those are not audio
        if name.starts_with(stem) && !name.ends_with(".part") && !name.ends_with(".ytdl") {
            return Ok(entry.path());
        }
    }

    Err(SkrivError::AudioDownload("Audio file not found after download".into()))
}

/// Removes every file belonging to a failed request.
fn remove_partials(dir: &Path, stem: &str) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        if entry.file_name().to_string_lossy().starts_with(stem) {
            remove_logged(&entry.path(), "partial download");
        }
    }
}

/// Removes one file, logging the outcome. Returns whether the file was removed.
fn remove_logged(path: &Path, what: &str) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {} {}", what, path.display());
            true
        }
        Err(e) => {
            warn!("Failed to remove {} {}: {}", what, path.display(), e);
            false
        }
    }
}

/// Converts an audio file to MP3 using ffmpeg.
async fn normalize_to_mp3(source: &Path, dest: &Path) -> Result<()> {
    debug!("Converting {:?} to MP3", source);

    let result = Command::new("ffmpeg")
        .arg("-i").arg(source)
        .arg("-vn")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let _ = std::fs::remove_file(dest);
            let err = String::from_utf8_lossy(&out.stderr);
            Err(SkrivError::AudioDownload(format!("ffmpeg conversion failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SkrivError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(SkrivError::AudioDownload(format!("ffmpeg error: {e}"))),
    }
}

/// Splits audio into consecutive pieces of at most `chunk_seconds`.
///
/// Pieces are written to `output_dir` and returned in timeline order. Audio that already
/// fits is returned as-is.
#[instrument(skip_all)]
pub async fn split_audio(source: &Path, output_dir: &Path, chunk_seconds: u32) -> Result<Vec<PathBuf>> {
    let total_duration = probe_duration(source).await?;
    let chunk_len = f64::from(chunk_seconds.max(1));

    if total_duration <= chunk_len {
        return Ok(vec![source.to_path_buf()]);
    }

    info!("Splitting {:.1}s of audio into {}s pieces", total_duration, chunk_seconds);

    let mut pieces = Vec::new();
    let mut offset = 0.0;
    let mut idx = 0u32;

    while offset < total_duration {
        let piece = output_dir.join(format!("piece_{:04}.mp3", idx));
        let length = chunk_len.min(total_duration - offset);
        extract_segment(source, &piece, offset, length).await?;
        pieces.push(piece);
        offset += chunk_len;
        idx += 1;
    }

    Ok(pieces)
}

async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    let result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-vn")
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("4")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(SkrivError::ToolFailed(format!("ffmpeg segment extraction failed: {err}")))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SkrivError::ToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(SkrivError::ToolFailed(format!("ffmpeg error: {e}"))),
    }
}

/// Queries the duration of an audio file using ffprobe with JSON output.
async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SkrivError::ToolNotFound("ffprobe".into()));
        }
        Err(e) => return Err(SkrivError::ToolFailed(format!("ffprobe failed: {e}"))),
    };

    if !output.status.success() {
        return Err(SkrivError::ToolFailed("ffprobe returned error".into()));
    }

    parse_probe_duration(&output.stdout)
}

fn parse_probe_duration(stdout: &[u8]) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_slice(stdout)?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| SkrivError::ToolFailed("Could not determine audio duration".into()))
}
