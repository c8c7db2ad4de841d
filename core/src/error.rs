use camino::Utf8PathBuf;

/// Failures raised while talking to yt-dlp or locating its output. Route
/// handlers flatten all of these into the `{"status": "error", ...}` body
/// the pages expect.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    /// yt-dlp failed while resolving video metadata. Carries the last
    /// stderr line, which is what the user gets to see.
    #[error("{0}")]
    Extraction(String),
    /// yt-dlp failed while downloading.
    #[error("{0}")]
    Dispatch(String),
    #[error("download finished but no file matching '{expected}' was found")]
    OutputMissing { expected: Utf8PathBuf },
    #[error("yt-dlp did not finish within {0}s")]
    Timeout(u64),
    #[error("error running yt-dlp: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Failures inside the download operation all surface as dispatch
    /// failures, whichever phase of the combined call raised them.
    pub fn into_dispatch(self) -> ExtractError {
        match self {
            ExtractError::Extraction(message) => ExtractError::Dispatch(message),
            other => other,
        }
    }
}
