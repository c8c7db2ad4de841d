use std::process::Stdio;
use std::time::Duration;

use camino::Utf8Path as Path;
use camino::Utf8PathBuf as PathBuf;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::catalog::Container;
use crate::config::Config;
use crate::error::ExtractError;
use crate::util::{bin_or_default, OptionPathExt};

use super::VideoMetadata;

/// Sent with metadata probes so extraction sees a current desktop browser.
const PROBE_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Handle on the yt-dlp binary, carrying configured binary paths and
/// per-operation timeouts. Cheap to clone.
#[derive(Debug, Clone)]
pub struct YtDlp {
    bin_path: Option<PathBuf>,
    ffmpeg_path: Option<PathBuf>,
    probe_timeout: Duration,
    download_timeout: Duration,
}

impl YtDlp {
    pub fn new(config: &Config) -> YtDlp {
        let bin_paths = config.bin_paths.as_ref();
        YtDlp {
            bin_path: bin_paths.and_then(|paths| paths.ytdlp.clone()),
            ffmpeg_path: bin_paths.and_then(|paths| paths.ffmpeg.clone()),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            download_timeout: Duration::from_secs(config.download_timeout_secs),
        }
    }

    /// Resolves video metadata and the full format list without downloading
    /// anything. Fails with the last stderr line if yt-dlp rejects the URL.
    #[instrument(skip(self))]
    pub async fn probe(&self, url: &str) -> Result<VideoMetadata, ExtractError> {
        let mut command = self.command();
        command.args(probe_args(url));
        let output = run_with_timeout(command, self.probe_timeout).await?;
        if !output.status.success() {
            return Err(ExtractError::Extraction(last_stderr_line(&output.stderr)));
        }
        let metadata: VideoMetadata = serde_json::from_slice(&output.stdout)
            .map_err(|err| ExtractError::Extraction(format!("could not parse yt-dlp output: {}", err)))?;
        debug!(formats = metadata.formats.len(), "probe finished");
        Ok(metadata)
    }

    /// Downloads the stream with the given format id into `download_dir`.
    /// For [`Container::Mp3`] the audio is extracted and re-encoded through
    /// ffmpeg at a fixed 320 kbps.
    #[instrument(skip(self))]
    pub async fn download(
        &self,
        url: &str,
        format_id: &str,
        container: Container,
        download_dir: &Path,
    ) -> Result<(), ExtractError> {
        let mut command = self.command();
        command.args(download_args(
            url,
            format_id,
            container,
            download_dir,
            self.ffmpeg_path.as_opt_path(),
        ));
        let output = run_with_timeout(command, self.download_timeout).await?;
        if !output.status.success() {
            return Err(ExtractError::Dispatch(last_stderr_line(&output.stderr)));
        }
        Ok(())
    }

    fn command(&self) -> Command {
        let mut command = Command::new(bin_or_default(self.bin_path.as_opt_path(), "yt-dlp"));
        command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

async fn run_with_timeout(
    mut command: Command,
    timeout: Duration,
) -> Result<std::process::Output, ExtractError> {
    let child = command.spawn()?;
    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => Ok(output?),
        // kill_on_drop reaps the child when the output future is dropped
        Err(_elapsed) => Err(ExtractError::Timeout(timeout.as_secs())),
    }
}

fn last_stderr_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("yt-dlp failed")
        .to_string()
}

fn probe_args(url: &str) -> Vec<String> {
    vec![
        "-J".to_string(),
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--user-agent".to_string(),
        PROBE_USER_AGENT.to_string(),
        url.to_string(),
    ]
}

fn download_args(
    url: &str,
    format_id: &str,
    container: Container,
    download_dir: &Path,
    ffmpeg_path: Option<&Path>,
) -> Vec<String> {
    let mut args = vec![
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "-f".to_string(),
        format_id.to_string(),
        "-o".to_string(),
        download_dir.join("%(title)s.%(ext)s").to_string(),
    ];
    if container == Container::Mp3 {
        args.extend(
            ["-x", "--audio-format", "mp3", "--audio-quality", "320K"]
                .iter()
                .map(|flag| flag.to_string()),
        );
    }
    if let Some(ffmpeg_path) = ffmpeg_path {
        args.push("--ffmpeg-location".to_string());
        args.push(ffmpeg_path.to_string());
    }
    args.push(url.to_string());
    args
}

#[test]
fn probe_args_assembled_correctly() {
    let expected = [
        "-J",
        "--no-playlist",
        "--no-warnings",
        "--user-agent",
        PROBE_USER_AGENT,
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
    ];
    let actual = probe_args("https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    assert_eq!(expected.as_slice(), &actual);
}

#[test]
fn video_download_args_assembled_correctly() {
    let expected = [
        "--no-playlist",
        "--no-warnings",
        "-f",
        "137",
        "-o",
        "downloads/%(title)s.%(ext)s",
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
    ];
    let actual = download_args(
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "137",
        Container::Mp4,
        Path::new("downloads"),
        None,
    );
    assert_eq!(expected.as_slice(), &actual);
}

#[test]
fn audio_download_args_add_extraction_flags() {
    let expected = [
        "--no-playlist",
        "--no-warnings",
        "-f",
        "251",
        "-o",
        "downloads/%(title)s.%(ext)s",
        "-x",
        "--audio-format",
        "mp3",
        "--audio-quality",
        "320K",
        "--ffmpeg-location",
        "/usr/bin/ffmpeg",
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
    ];
    let actual = download_args(
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "251",
        Container::Mp3,
        Path::new("downloads"),
        Some(Path::new("/usr/bin/ffmpeg")),
    );
    assert_eq!(expected.as_slice(), &actual);
}

#[test]
fn probe_output_parsed_correctly() {
    use claims::assert_ok;
    use pretty_assertions::assert_eq;

    use super::StreamFormat;

    let probe_output = r#"
{
    "id": "dQw4w9WgXcQ",
    "title": "Rick Astley - Never Gonna Give You Up (Official Music Video)",
    "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg",
    "description": "The official video.",
    "channel": "Rick Astley",
    "duration": 212,
    "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
    "formats": [
        {
            "format_id": "sb2",
            "format_note": "storyboard",
            "ext": "mhtml",
            "protocol": "mhtml",
            "acodec": "none",
            "vcodec": "none",
            "url": "https://i.ytimg.com/sb/dQw4w9WgXcQ/storyboard3_L0/default.mhtml",
            "width": 48,
            "height": 27,
            "fps": 0.09433962264150944
        },
        {
            "format_id": "251",
            "format_note": "medium",
            "ext": "webm",
            "acodec": "opus",
            "vcodec": "none",
            "abr": 129.478,
            "asr": 48000,
            "filesize": 3437753,
            "audio_channels": 2,
            "quality": 3.0,
            "language": "en"
        },
        {
            "format_id": "137",
            "format_note": "1080p",
            "ext": "mp4",
            "acodec": "none",
            "vcodec": "avc1.640028",
            "width": 1920,
            "height": 1080,
            "fps": 25,
            "tbr": 2436.208,
            "filesize": 64334766
        },
        {
            "format_id": "18",
            "format_note": "360p",
            "ext": "mp4",
            "acodec": "mp4a.40.2",
            "vcodec": "avc1.42001E",
            "width": 640,
            "height": 360,
            "fps": 25,
            "tbr": 557.885,
            "filesize": null,
            "filesize_approx": 14787381.0
        }
    ]
}
    "#;
    let metadata: VideoMetadata = assert_ok!(serde_json::from_str(probe_output));
    assert_eq!(
        metadata.title.as_deref(),
        Some("Rick Astley - Never Gonna Give You Up (Official Music Video)")
    );
    assert_eq!(
        metadata.thumbnail.as_deref(),
        Some("https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
    );
    assert_eq!(metadata.duration, Some(212.0));
    assert_eq!(metadata.formats.len(), 4);

    let storyboard = &metadata.formats[0];
    assert!(!storyboard.has_video());
    assert!(!storyboard.has_audio());

    let audio = &metadata.formats[1];
    assert_eq!(
        audio,
        &StreamFormat {
            format_id: Some("251".to_string()),
            vcodec: Some("none".to_string()),
            acodec: Some("opus".to_string()),
            height: None,
            abr: Some(129.478),
            tbr: None,
            filesize: Some(3437753),
            filesize_approx: None,
            ext: Some("webm".to_string()),
            format_note: Some("medium".to_string()),
        }
    );
    assert!(audio.has_audio());

    let video = &metadata.formats[2];
    assert!(video.has_video());
    assert_eq!(video.height, Some(1080));
    assert_eq!(video.best_size(), Some(64334766));

    // null filesize falls back to the approximate one
    let combined = &metadata.formats[3];
    assert_eq!(combined.best_size(), Some(14787381));
}
