use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, trace};

use super::{Extracted, MediaExtractor};
use crate::request::Format;

pub const AUDIO_CODEC: &str = "mp3";
const AUDIO_QUALITY: &str = "192K";
const VIDEO_FORMAT: &str = "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best";

#[derive(Debug)]
pub struct YtDlpExtractor {
    bin: String,
}
impl YtDlpExtractor {
    pub fn new<T: Into<String>>(bin: T) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait::async_trait]
impl MediaExtractor for YtDlpExtractor {
    #[tracing::instrument(skip(self, output_stem))]
    async fn extract(
        &self,
        url: &str,
        format: Format,
        output_stem: &Path,
    ) -> anyhow::Result<Extracted> {
        debug!("Running yt-dlp");

        let template = {
            let mut t: OsString = output_stem.as_os_str().to_os_string();
            t.push(".%(ext)s");
            t
        };

        let mut cmd = Command::new(&self.bin);
        cmd.args(["--no-playlist", "--no-warnings", "--no-progress"])
            .args(["--print", "after_move:title", "--print", "after_move:filepath"])
            .arg("-o")
            .arg(&template);

        match format {
            Format::Audio => cmd
                .args(["-f", "bestaudio/best", "-x"])
                .args(["--audio-format", AUDIO_CODEC])
                .args(["--audio-quality", AUDIO_QUALITY]),
            Format::Video => cmd.args(["-f", VIDEO_FORMAT]),
        };

        let output = cmd
            .arg("--")
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.bin))?;

        trace!(status = ?output.status, "yt-dlp finished");

        if !output.status.success() {
            anyhow::bail!(error_summary(&String::from_utf8_lossy(&output.stderr)));
        }

        let (title, path) = parse_printed(&String::from_utf8_lossy(&output.stdout))?;
        let path = normalize_output(path, format);

        if !tokio::fs::try_exists(&path).await? {
            anyhow::bail!("yt-dlp reported {} but the file is missing", path.display());
        }

        debug!(?path, ?title, "Media extracted");

        Ok(Extracted { path, title })
    }
}

/// Last two printed lines are the title and the final file path.
fn parse_printed(stdout: &str) -> anyhow::Result<(Option<String>, PathBuf)> {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).rev();

    let Some(path) = lines.next() else {
        anyhow::bail!("yt-dlp did not report an output file");
    };
    let title = lines.next().filter(|t| *t != "NA").map(ToString::to_string);

    Ok((title, PathBuf::from(path)))
}

/// Audio always ends up in the configured codec, whatever the source container.
fn normalize_output(path: PathBuf, format: Format) -> PathBuf {
    match format {
        Format::Audio if path.extension().and_then(|e| e.to_str()) != Some(AUDIO_CODEC) => {
            path.with_extension(AUDIO_CODEC)
        }
        _ => path,
    }
}

fn error_summary(stderr: &str) -> String {
    let errors = stderr
        .lines()
        .filter(|l| l.starts_with("ERROR"))
        .collect::<Vec<_>>()
        .join("\n");

    if errors.is_empty() {
        let stderr = stderr.trim();
        if stderr.is_empty() {
            "yt-dlp exited with an error".to_string()
        } else {
            stderr.to_string()
        }
    } else {
        errors
    }
}
