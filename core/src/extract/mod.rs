//! Talking to yt-dlp: metadata probes, downloads and locating their output.

use serde::Deserialize;

mod dispatch;
mod ytdlp;

pub use dispatch::dispatch_download;
pub use ytdlp::YtDlp;

/// Everything we keep from a yt-dlp metadata probe. Unknown fields in the
/// probe output are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Seconds. yt-dlp reports fractional durations for some extractors.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub formats: Vec<StreamFormat>,
}

/// One raw descriptor from yt-dlp's format list. Every field is optional:
/// placeholder entries (storyboards, manifests) carry almost nothing, and
/// the catalog builder treats missing fields as absent rather than failing
/// the whole probe.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StreamFormat {
    #[serde(default)]
    pub format_id: Option<String>,
    /// Video codec name, or the literal `"none"` for audio-only streams.
    #[serde(default)]
    pub vcodec: Option<String>,
    /// Audio codec name, or the literal `"none"` for video-only streams.
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub height: Option<i64>,
    /// Average audio bitrate in kbps.
    #[serde(default)]
    pub abr: Option<f64>,
    /// Total bitrate in kbps.
    #[serde(default)]
    pub tbr: Option<f64>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub format_note: Option<String>,
}

impl StreamFormat {
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref().is_some_and(|codec| codec != "none")
    }

    pub fn has_audio(&self) -> bool {
        self.acodec.as_deref().is_some_and(|codec| codec != "none")
    }

    /// Known size in bytes, preferring the exact field over yt-dlp's
    /// estimate. Zero counts as unknown.
    pub fn best_size(&self) -> Option<u64> {
        self.filesize
            .filter(|size| *size > 0)
            .or_else(|| {
                self.filesize_approx
                    .map(|approx| approx as u64)
                    .filter(|size| *size > 0)
            })
    }
}
