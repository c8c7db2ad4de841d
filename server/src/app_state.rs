use std::sync::Arc;

use camino::Utf8PathBuf as PathBuf;
use grabtube_core::extract::YtDlp;

pub struct AppState {
    pub ytdlp: YtDlp,
    pub download_dir: PathBuf,
}

pub type SharedState = Arc<AppState>;
