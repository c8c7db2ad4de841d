use std::process::Stdio;

use camino::Utf8Path as Path;
use tokio::process::Command;

use crate::{
    config::BinPaths,
    util::{bin_or_default, OptionPathExt},
};

/// Checks on startup that the binaries everything else shells out to are
/// actually there, so a missing yt-dlp shows up in the log right away
/// instead of on the first request.
pub async fn run_self_check(bin_paths: Option<&BinPaths>) -> Result<(), ()> {
    let ytdlp_bin_path: Option<&Path> = bin_paths.and_then(|bp| bp.ytdlp.as_opt_path());
    check_can_run_ytdlp(ytdlp_bin_path).await?;
    let ffmpeg_bin_path: Option<&Path> = bin_paths.and_then(|bp| bp.ffmpeg.as_opt_path());
    check_can_run_ffmpeg(ffmpeg_bin_path).await?;
    Ok(())
}

async fn check_can_run_ytdlp(ytdlp_bin_path: Option<&Path>) -> Result<(), ()> {
    let spawn_result = Command::new(bin_or_default(ytdlp_bin_path, "yt-dlp"))
        .arg("--version")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();
    let ytdlp = match spawn_result {
        Ok(c) => c,
        Err(err) => match err.kind() {
            std::io::ErrorKind::NotFound => {
                if let Some(ytdlp_path) = ytdlp_bin_path {
                    tracing::error!("Could not find yt-dlp at path from config: {}", ytdlp_path);
                } else {
                    tracing::error!("Could not find yt-dlp (no 'yt-dlp' in $PATH). Is it installed?");
                }
                return Err(());
            }
            _kind => {
                tracing::error!("Error running yt-dlp: {}", err);
                return Err(());
            }
        },
    };
    let output = match ytdlp.wait_with_output().await {
        Ok(o) => o,
        Err(err) => {
            tracing::error!(
                "yt-dlp test failed, error waiting for yt-dlp process: {}",
                err
            );
            return Err(());
        }
    };
    if !output.status.success() {
        tracing::error!(
            "yt-dlp test failed, 'yt-dlp --version' exited with an error:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );
        return Err(());
    }
    tracing::debug!(
        "ok: can run yt-dlp ({})",
        String::from_utf8_lossy(&output.stdout).trim()
    );
    Ok(())
}

async fn check_can_run_ffmpeg(ffmpeg_bin_path: Option<&Path>) -> Result<(), ()> {
    let spawn_result = Command::new(bin_or_default(ffmpeg_bin_path, "ffmpeg"))
        .arg("-version")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();
    let ffmpeg = match spawn_result {
        Ok(c) => c,
        Err(err) => match err.kind() {
            std::io::ErrorKind::NotFound => {
                // audio conversion to mp3 needs ffmpeg
                tracing::error!("Could not find ffmpeg. Is it installed?");
                return Err(());
            }
            _kind => {
                tracing::error!("Error running ffmpeg: {}", err);
                return Err(());
            }
        },
    };
    let output = match ffmpeg.wait_with_output().await {
        Ok(o) => o,
        Err(err) => {
            tracing::error!(
                "ffmpeg test failed, error waiting for ffmpeg process: {}",
                err
            );
            return Err(());
        }
    };
    if !output.status.success() {
        tracing::error!(
            "ffmpeg test failed, error running ffmpeg:\n{}",
            String::from_utf8_lossy(&output.stdout)
        );
        return Err(());
    }
    tracing::debug!("ok: can run ffmpeg");
    Ok(())
}
