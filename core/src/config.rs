use camino::{Utf8Path as Path, Utf8PathBuf as PathBuf};
use color_eyre::eyre::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 120;
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlDownloadDir {
    path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlStaticDir {
    path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlBinPaths {
    pub ytdlp: Option<String>,
    pub ffmpeg: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TomlConfig {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub probe_timeout_secs: Option<u64>,
    pub download_timeout_secs: Option<u64>,
    #[serde(rename = "DownloadDir")]
    pub download_dir: Option<TomlDownloadDir>,
    #[serde(rename = "StaticDir")]
    pub static_dir: Option<TomlStaticDir>,
    #[serde(rename = "BinPaths")]
    pub bin_paths: Option<TomlBinPaths>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinPaths {
    pub ytdlp: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub address: Option<String>,
    pub port: Option<u16>,
    /// Where yt-dlp writes downloaded files.
    pub download_dir: PathBuf,
    /// Directory the html pages and their assets are served from.
    pub static_dir: PathBuf,
    pub bin_paths: Option<BinPaths>,
    pub probe_timeout_secs: u64,
    pub download_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            address: None,
            port: None,
            download_dir: DEFAULT_DOWNLOAD_DIR.into(),
            static_dir: DEFAULT_STATIC_DIR.into(),
            bin_paths: None,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

pub async fn read_config(path: &Path) -> Result<Config> {
    let toml_str = tokio::fs::read_to_string(path)
        .await
        .context(format!("Error reading config file {}", path))?;
    let toml_config: TomlConfig = toml::from_str(&toml_str).context("Error parsing config file")?;
    let download_dir = toml_config
        .download_dir
        .map(|dir| PathBuf::from(dir.path))
        .unwrap_or_else(|| DEFAULT_DOWNLOAD_DIR.into());
    let static_dir = toml_config
        .static_dir
        .map(|dir| PathBuf::from(dir.path))
        .unwrap_or_else(|| DEFAULT_STATIC_DIR.into());
    let bin_paths = toml_config.bin_paths.map(|bin_paths| BinPaths {
        ytdlp: bin_paths.ytdlp.map(PathBuf::from),
        ffmpeg: bin_paths.ffmpeg.map(PathBuf::from),
    });
    Ok(Config {
        address: toml_config.address,
        port: toml_config.port,
        download_dir,
        static_dir,
        bin_paths,
        probe_timeout_secs: toml_config
            .probe_timeout_secs
            .unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS),
        download_timeout_secs: toml_config
            .download_timeout_secs
            .unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
    })
}
