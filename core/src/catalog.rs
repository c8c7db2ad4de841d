//! Turning the raw yt-dlp format list into the catalog shown to the user.

use std::cmp::Reverse;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use itertools::Itertools;
use strum::{Display, EnumString};

use crate::extract::StreamFormat;

/// Container of the file handed to the user. Video choices are served as
/// mp4, the single audio choice is re-encoded by ffmpeg to a 320 kbps mp3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Container {
    Mp4,
    Mp3,
}

/// One download choice in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub format_id: String,
    /// `"1080p"` for video entries, always `"320kbps"` for audio.
    pub quality: String,
    /// Rendered size like `"12.3 MB"`, or `"Unknown size"`.
    pub size: String,
    pub container: Container,
    pub note: Option<String>,
}

/// What the user gets to pick from: video resolutions best-first, plus at
/// most one audio choice.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamCatalog {
    pub video: Vec<CatalogEntry>,
    pub audio: Option<CatalogEntry>,
}

/// The audio stream is re-encoded to this fixed bitrate on download, so the
/// label does not depend on the source stream's own bitrate.
const AUDIO_QUALITY_LABEL: &str = "320kbps";
const AUDIO_NOTE: &str = "MP3 320kbps";

/// Builds the deduplicated catalog from yt-dlp's format list.
///
/// Video streams are keyed by height, keeping the highest total bitrate per
/// resolution; comparison is strict, so the first descriptor seen wins ties.
/// Audio keeps only the single stream with the highest average bitrate.
/// Descriptors with neither codec (storyboards, manifest placeholders) and
/// video descriptors without a positive height are skipped.
pub fn build_catalog(formats: &[StreamFormat]) -> StreamCatalog {
    let mut best_video: HashMap<i64, &StreamFormat> = HashMap::new();
    let mut best_audio: Option<&StreamFormat> = None;
    let mut best_audio_bitrate = 0.0_f64;

    for format in formats {
        if format.has_video() {
            let Some(height) = format.height.filter(|height| *height > 0) else {
                continue;
            };
            match best_video.entry(height) {
                Entry::Vacant(entry) => {
                    entry.insert(format);
                }
                Entry::Occupied(mut entry) => {
                    if format.tbr.unwrap_or(0.0) > entry.get().tbr.unwrap_or(0.0) {
                        entry.insert(format);
                    }
                }
            }
        } else if format.has_audio() {
            let bitrate = format.abr.unwrap_or(0.0);
            if bitrate > best_audio_bitrate {
                best_audio_bitrate = bitrate;
                best_audio = Some(format);
            }
        }
    }

    let video = best_video
        .into_iter()
        .sorted_by_key(|(height, _)| Reverse(*height))
        .map(|(height, format)| CatalogEntry {
            format_id: format.format_id.clone().unwrap_or_default(),
            quality: format!("{}p", height),
            size: human_size(format.best_size()),
            container: Container::Mp4,
            note: None,
        })
        .collect();
    let audio = best_audio.map(|format| CatalogEntry {
        format_id: format.format_id.clone().unwrap_or_default(),
        quality: AUDIO_QUALITY_LABEL.to_string(),
        size: human_size(format.best_size()),
        container: Container::Mp3,
        note: Some(AUDIO_NOTE.to_string()),
    });
    StreamCatalog { video, audio }
}

fn human_size(bytes: Option<u64>) -> String {
    match bytes {
        Some(bytes) => format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0),
        None => "Unknown size".to_string(),
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn video_format(format_id: &str, height: i64, tbr: f64) -> StreamFormat {
        StreamFormat {
            format_id: Some(format_id.to_string()),
            vcodec: Some("avc1.64002a".to_string()),
            acodec: Some("none".to_string()),
            height: Some(height),
            tbr: Some(tbr),
            ..Default::default()
        }
    }

    fn audio_format(format_id: &str, abr: f64) -> StreamFormat {
        StreamFormat {
            format_id: Some(format_id.to_string()),
            vcodec: Some("none".to_string()),
            acodec: Some("mp4a.40.2".to_string()),
            abr: Some(abr),
            ..Default::default()
        }
    }

    #[test]
    fn keeps_highest_bitrate_per_resolution() {
        let formats = [
            video_format("247", 1080, 505.1),
            video_format("248", 1080, 901.4),
            video_format("136", 720, 300.0),
        ];
        let catalog = build_catalog(&formats);
        assert_eq!(
            catalog
                .video
                .iter()
                .map(|entry| (entry.format_id.as_str(), entry.quality.as_str()))
                .collect::<Vec<_>>(),
            vec![("248", "1080p"), ("136", "720p")]
        );
    }

    #[test]
    fn first_descriptor_wins_bitrate_ties() {
        let formats = [
            video_format("first", 720, 400.0),
            video_format("second", 720, 400.0),
        ];
        let catalog = build_catalog(&formats);
        assert_eq!(catalog.video.len(), 1);
        assert_eq!(catalog.video[0].format_id, "first");
    }

    #[test]
    fn picks_single_best_audio_with_fixed_label() {
        let formats = [
            audio_format("249", 57.9),
            audio_format("251", 129.5),
            audio_format("250", 74.2),
        ];
        let catalog = build_catalog(&formats);
        assert!(catalog.video.is_empty());
        let audio = catalog.audio.expect("one audio entry");
        assert_eq!(audio.format_id, "251");
        assert_eq!(audio.quality, "320kbps");
        assert_eq!(audio.container, Container::Mp3);
        assert_eq!(audio.note.as_deref(), Some("MP3 320kbps"));
    }

    #[test]
    fn audio_without_any_bitrate_is_not_picked() {
        let formats = [StreamFormat {
            format_id: Some("140".to_string()),
            vcodec: Some("none".to_string()),
            acodec: Some("mp4a.40.2".to_string()),
            ..Default::default()
        }];
        let catalog = build_catalog(&formats);
        assert_eq!(catalog.audio, None);
    }

    #[test]
    fn skips_placeholders_and_heightless_video() {
        let storyboard = StreamFormat {
            format_id: Some("sb0".to_string()),
            vcodec: Some("none".to_string()),
            acodec: Some("none".to_string()),
            ..Default::default()
        };
        let no_height = StreamFormat {
            format_id: Some("597".to_string()),
            vcodec: Some("avc1.4d400b".to_string()),
            acodec: Some("none".to_string()),
            tbr: Some(30.0),
            ..Default::default()
        };
        let catalog = build_catalog(&[storyboard, no_height]);
        assert_eq!(catalog, StreamCatalog::default());
    }

    #[test]
    fn renders_sizes_with_approx_fallback() {
        let mut exact = video_format("22", 720, 500.0);
        exact.filesize = Some(64_334_766);
        // zero counts as unset, the estimate takes over
        let mut approx = video_format("18", 360, 200.0);
        approx.filesize = Some(0);
        approx.filesize_approx = Some(52_428_800.0);
        let unknown = video_format("17", 144, 50.0);
        let catalog = build_catalog(&[exact, approx, unknown]);
        assert_eq!(
            catalog
                .video
                .iter()
                .map(|entry| entry.size.as_str())
                .collect::<Vec<_>>(),
            vec!["61.4 MB", "50.0 MB", "Unknown size"]
        );
    }

    #[test]
    fn container_labels_round_trip() {
        assert_eq!(Container::Mp4.to_string(), "mp4");
        assert_eq!(Container::Mp3.to_string(), "mp3");
        assert_eq!(Container::from_str("mp3"), Ok(Container::Mp3));
        assert!(Container::from_str("flv").is_err());
    }

    proptest! {
        #[test]
        fn video_entries_sorted_strictly_descending(
            streams in proptest::collection::vec((1_i64..5000, 0_u32..100_000), 0..24),
        ) {
            let formats: Vec<StreamFormat> = streams
                .iter()
                .enumerate()
                .map(|(i, (height, tbr))| video_format(&format!("f{}", i), *height, *tbr as f64 / 10.0))
                .collect();
            let mut reversed = formats.clone();
            reversed.reverse();

            let catalog = build_catalog(&formats);
            let heights: Vec<i64> = catalog
                .video
                .iter()
                .map(|entry| entry.quality.trim_end_matches('p').parse().unwrap())
                .collect();
            for pair in heights.windows(2) {
                prop_assert!(pair[0] > pair[1], "heights not strictly descending: {:?}", heights);
            }

            // the label sequence does not depend on input order
            let reversed_heights: Vec<String> = build_catalog(&reversed)
                .video
                .into_iter()
                .map(|entry| entry.quality)
                .collect();
            let labels: Vec<String> = catalog.video.into_iter().map(|entry| entry.quality).collect();
            prop_assert_eq!(labels, reversed_heights);
        }
    }
}
