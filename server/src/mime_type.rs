use std::borrow::Cow;

pub fn guess_mime_type(file_ext: &str) -> Option<Cow<'static, str>> {
    match file_ext {
        "mp4" | "m4v" => Some(Cow::Borrowed("video/mp4")),
        "mp3" => Some(Cow::Borrowed("audio/mpeg")),
        "webm" => Some(Cow::Borrowed("video/webm")),
        "mkv" => Some(Cow::Borrowed("video/x-matroska")),
        "m4a" => Some(Cow::Borrowed("audio/mp4")),
        "ogg" | "opus" => Some(Cow::Borrowed("audio/ogg")),
        _ => None,
    }
}

pub fn guess_mime_type_path(path: &camino::Utf8Path) -> Option<Cow<'static, str>> {
    let ext = path.extension()?.to_ascii_lowercase();
    match guess_mime_type(&ext) {
        Some(m) => Some(m),
        None => {
            tracing::warn!(
                "can't guess MIME type for filename '{}'",
                &path
                    .file_name()
                    .map(|p| p.to_string())
                    .unwrap_or(String::new())
            );
            None
        }
    }
}
