//! Audio acquisition.
//!
//! An [`AudioAcquirer`] turns a [`VideoId`] into a local [`AudioArtifact`]. The artifact
//! owns its backing file: dropping it deletes the file, so whichever stage holds it last
//! is guaranteed to clean up on every exit path.

mod downloader;

pub use downloader::{split_audio, YtDlpAcquirer};

use crate::error::Result;
use crate::video::VideoId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Container/codec of an audio artifact, taken from its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    M4a,
    Opus,
    Webm,
    Ogg,
    Wav,
    Other(String),
}

impl AudioFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        match ext.as_str() {
            "mp3" => AudioFormat::Mp3,
            "m4a" => AudioFormat::M4a,
            "opus" => AudioFormat::Opus,
            "webm" => AudioFormat::Webm,
            "ogg" => AudioFormat::Ogg,
            "wav" => AudioFormat::Wav,
            _ => AudioFormat::Other(ext),
        }
    }
}

/// A transient local audio file.
///
/// Not `Clone`: exactly one owner exists, and the file is removed when that owner drops it.
#[derive(Debug)]
pub struct AudioArtifact {
    path: PathBuf,
    format: AudioFormat,
}

impl AudioArtifact {
    /// Take ownership of an existing file.
    pub fn new(path: PathBuf) -> Self {
        let format = AudioFormat::from_path(&path);
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> &AudioFormat {
        &self.format
    }
}

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => info!("Cleaned up temporary audio file: {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to delete temporary audio file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Obtains local audio for a video.
#[async_trait]
pub trait AudioAcquirer: Send + Sync {
    /// Download the audio track. On error no partial file may be left behind.
    async fn acquire(&self, video_id: &VideoId) -> Result<AudioArtifact>;
}
