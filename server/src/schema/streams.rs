use serde::Serialize;
use utoipa::ToSchema;

use grabtube_core::catalog::{CatalogEntry, StreamCatalog};
use grabtube_core::extract::VideoMetadata;

/// Successful `/get_streams` answer, shaped exactly like the page's
/// javascript expects it. Failed requests use the uniform error body
/// instead.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StreamsResponse {
    /// Always `"success"` here.
    pub status: String,
    pub title: String,
    pub thumbnail: String,
    pub streams: StreamBuckets,
    /// Whole seconds.
    pub duration: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StreamBuckets {
    pub video: Vec<VideoStream>,
    /// Zero or one entry.
    pub audio: Vec<AudioStream>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VideoStream {
    pub itag: String,
    /// Like `"1080p"`.
    pub resolution: String,
    /// Like `"12.3 MB"`, or `"Unknown size"`.
    pub filesize: String,
    pub ext: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AudioStream {
    pub itag: String,
    pub abr: String,
    pub filesize: String,
    pub ext: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_note: Option<String>,
}

impl StreamsResponse {
    pub fn new(metadata: VideoMetadata, catalog: StreamCatalog) -> StreamsResponse {
        StreamsResponse {
            status: "success".to_string(),
            title: metadata.title.unwrap_or_default(),
            thumbnail: metadata.thumbnail.unwrap_or_default(),
            duration: metadata.duration.map(|d| d.round() as i64).unwrap_or(0),
            streams: catalog.into(),
        }
    }
}

impl From<StreamCatalog> for StreamBuckets {
    fn from(catalog: StreamCatalog) -> Self {
        StreamBuckets {
            video: catalog.video.iter().map(VideoStream::from).collect(),
            audio: catalog.audio.iter().map(AudioStream::from).collect(),
        }
    }
}

impl From<&CatalogEntry> for VideoStream {
    fn from(entry: &CatalogEntry) -> Self {
        VideoStream {
            itag: entry.format_id.clone(),
            resolution: entry.quality.clone(),
            filesize: entry.size.clone(),
            ext: entry.container.to_string(),
        }
    }
}

impl From<&CatalogEntry> for AudioStream {
    fn from(entry: &CatalogEntry) -> Self {
        AudioStream {
            itag: entry.format_id.clone(),
            abr: entry.quality.clone(),
            filesize: entry.size.clone(),
            ext: entry.container.to_string(),
            format_note: entry.note.clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use grabtube_core::catalog::Container;
    use pretty_assertions::assert_eq;

    #[test]
    fn streams_response_serializes_to_wire_shape() {
        let catalog = StreamCatalog {
            video: vec![CatalogEntry {
                format_id: "137".to_string(),
                quality: "1080p".to_string(),
                size: "61.4 MB".to_string(),
                container: Container::Mp4,
                note: None,
            }],
            audio: Some(CatalogEntry {
                format_id: "251".to_string(),
                quality: "320kbps".to_string(),
                size: "3.3 MB".to_string(),
                container: Container::Mp3,
                note: Some("MP3 320kbps".to_string()),
            }),
        };
        let metadata = VideoMetadata {
            title: Some("Some Talk".to_string()),
            thumbnail: Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/hq720.jpg".to_string()),
            duration: Some(212.36),
            formats: vec![],
        };

        let response = StreamsResponse::new(metadata, catalog);
        assert_eq!(
            serde_json::to_value(response).unwrap(),
            serde_json::json!({
                "status": "success",
                "title": "Some Talk",
                "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hq720.jpg",
                "duration": 212,
                "streams": {
                    "video": [
                        {
                            "itag": "137",
                            "resolution": "1080p",
                            "filesize": "61.4 MB",
                            "ext": "mp4"
                        }
                    ],
                    "audio": [
                        {
                            "itag": "251",
                            "abr": "320kbps",
                            "filesize": "3.3 MB",
                            "ext": "mp3",
                            "format_note": "MP3 320kbps"
                        }
                    ]
                }
            })
        );
    }

    #[test]
    fn missing_metadata_fields_default_to_empty() {
        let metadata = VideoMetadata {
            title: None,
            thumbnail: None,
            duration: None,
            formats: vec![],
        };
        let response = StreamsResponse::new(metadata, StreamCatalog::default());
        assert_eq!(response.title, "");
        assert_eq!(response.thumbnail, "");
        assert_eq!(response.duration, 0);
        assert!(response.streams.video.is_empty());
        assert!(response.streams.audio.is_empty());
    }
}
