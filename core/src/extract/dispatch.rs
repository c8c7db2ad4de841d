use camino::Utf8Path as Path;
use camino::Utf8PathBuf as PathBuf;
use tracing::{info, instrument, warn};

use crate::catalog::Container;
use crate::error::ExtractError;

use super::YtDlp;

/// Characters yt-dlp rewrites when writing the output file.
const UNSAFE_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Fullwidth substitutions current yt-dlp releases apply to unsafe
/// characters in file names.
const FILENAME_REPLACEMENTS: &[(char, char)] = &[
    ('<', '＜'),
    ('>', '＞'),
    (':', '：'),
    ('"', '＂'),
    ('/', '⧸'),
    ('\\', '⧹'),
    ('|', '｜'),
    ('?', '？'),
    ('*', '＊'),
];

/// Resolves the video title, hands the download to yt-dlp and returns the
/// path of the produced file.
///
/// yt-dlp applies its own filename sanitization and the real extension can
/// differ from the requested container (a webm video stream stays webm), so
/// the exact output path is not knowable upfront. We check the expected
/// `<title>.<container>` path first and fall back to scanning the download
/// directory for a file sharing the leading part of the title.
#[instrument(skip(ytdlp))]
pub async fn dispatch_download(
    ytdlp: &YtDlp,
    download_dir: &Path,
    url: &str,
    format_id: &str,
    container: Container,
) -> Result<PathBuf, ExtractError> {
    let metadata = ytdlp
        .probe(url)
        .await
        .map_err(ExtractError::into_dispatch)?;
    let title = metadata.title.unwrap_or_default();
    ytdlp.download(url, format_id, container, download_dir).await?;
    let path = locate_output(download_dir, &title, container).await?;
    info!(%path, "download finished");
    Ok(path)
}

/// Finds the file yt-dlp wrote for `title`, preferring the exact expected
/// path and falling back to a prefix scan of the download directory.
async fn locate_output(
    download_dir: &Path,
    title: &str,
    container: Container,
) -> Result<PathBuf, ExtractError> {
    let expected = download_dir.join(format!("{}.{}", sanitize_title(title), container));
    if tokio::fs::metadata(&expected).await.is_ok() {
        return Ok(expected);
    }
    warn!(%expected, "expected output file not found, scanning download directory");
    // The substitution yt-dlp picks for unsafe characters has changed across
    // releases, so the scan only trusts the part of the title before the
    // first one.
    let prefix = scan_prefix(title);
    let mut entries = tokio::fs::read_dir(download_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if !prefix.is_empty() && file_name.starts_with(prefix) {
            return Ok(download_dir.join(file_name));
        }
    }
    Err(ExtractError::OutputMissing { expected })
}

/// Applies yt-dlp's substitutions for characters it never writes into file
/// names, so the expected path matches what lands on disk.
fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            FILENAME_REPLACEMENTS
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect()
}

/// Prefix of `title` up to the first character yt-dlp rewrites.
fn scan_prefix(title: &str) -> &str {
    match title.find(UNSAFE_FILENAME_CHARS) {
        Some(index) => &title[..index],
        None => title,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use claims::{assert_err, assert_ok};
    use pretty_assertions::assert_eq;

    fn utf8_dir_path(dir: &tempfile::TempDir) -> &Path {
        Path::from_path(dir.path()).expect("tempdir path is utf8")
    }

    #[test]
    fn sanitize_substitutes_fullwidth_forms_for_reserved_characters() {
        assert_eq!(sanitize_title("My Talk: Part 1/2"), "My Talk： Part 1⧸2");
        assert_eq!(sanitize_title("plain title"), "plain title");
    }

    #[test]
    fn scan_prefix_stops_at_the_first_reserved_character() {
        assert_eq!(scan_prefix("My Talk: Part 1"), "My Talk");
        assert_eq!(scan_prefix("plain title"), "plain title");
        assert_eq!(scan_prefix("*leading"), "");
    }

    #[tokio::test]
    async fn locates_file_at_expected_path() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = utf8_dir_path(&dir);
        std::fs::write(dir_path.join("My Talk.mp4"), b"video").unwrap();

        let located = assert_ok!(locate_output(dir_path, "My Talk", Container::Mp4).await);
        assert_eq!(located, dir_path.join("My Talk.mp4"));
    }

    #[tokio::test]
    async fn falls_back_to_prefix_scan_when_extension_differs() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = utf8_dir_path(&dir);
        std::fs::write(dir_path.join("My Talk.webm"), b"video").unwrap();

        let located = assert_ok!(locate_output(dir_path, "My Talk", Container::Mp4).await);
        assert_eq!(located, dir_path.join("My Talk.webm"));
    }

    #[tokio::test]
    async fn locates_file_written_with_fullwidth_replacements() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = utf8_dir_path(&dir);
        std::fs::write(dir_path.join("My Talk： Part 1.mp3"), b"audio").unwrap();

        let located = assert_ok!(locate_output(dir_path, "My Talk: Part 1", Container::Mp3).await);
        assert_eq!(located, dir_path.join("My Talk： Part 1.mp3"));
    }

    #[tokio::test]
    async fn scan_tolerates_older_replacement_styles() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = utf8_dir_path(&dir);
        std::fs::write(dir_path.join("My Talk - Part 1.mp3"), b"audio").unwrap();

        let located = assert_ok!(locate_output(dir_path, "My Talk: Part 1", Container::Mp3).await);
        assert_eq!(located, dir_path.join("My Talk - Part 1.mp3"));
    }

    #[tokio::test]
    async fn missing_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = utf8_dir_path(&dir);
        std::fs::write(dir_path.join("Unrelated.mp4"), b"video").unwrap();

        let error = assert_err!(locate_output(dir_path, "My Talk", Container::Mp4).await);
        match error {
            ExtractError::OutputMissing { expected } => {
                assert_eq!(expected, dir_path.join("My Talk.mp4"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_title_never_matches_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let dir_path = utf8_dir_path(&dir);
        std::fs::write(dir_path.join("Some File.mp4"), b"video").unwrap();

        assert_err!(locate_output(dir_path, "", Container::Mp4).await);
    }
}
