use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Output, Stdio},
};

use anyhow::Context;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, trace};

use super::Catalog;
use crate::downloader::batch::TrackDescriptor;

const TRACK_FORMAT: &str = "mp3";
const OUTPUT_TEMPLATE: &str = "{artists} - {title}.{output-ext}";

#[derive(Debug, Deserialize)]
struct SavedSong {
    name: String,
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    artists: Vec<String>,
    url: String,
}
impl From<SavedSong> for TrackDescriptor {
    fn from(song: SavedSong) -> Self {
        let artist = song
            .artist
            .or_else(|| song.artists.first().cloned())
            .unwrap_or_default();

        Self::new(song.name, artist, song.url)
    }
}

#[derive(Debug)]
pub struct SpotdlCatalog {
    bin: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}
impl SpotdlCatalog {
    pub fn new<T: Into<String>>(
        bin: T,
        client_id: Option<String>,
        client_secret: Option<String>,
    ) -> Self {
        Self {
            bin: bin.into(),
            client_id,
            client_secret,
        }
    }

    fn command(&self, operation: &str) -> Command {
        let mut cmd = Command::new(&self.bin);
        cmd.arg(operation);

        if let Some(id) = &self.client_id {
            cmd.arg("--client-id").arg(id);
        }
        if let Some(secret) = &self.client_secret {
            cmd.arg("--client-secret").arg(secret);
        }

        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    async fn run(&self, mut cmd: Command) -> anyhow::Result<Output> {
        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.bin))?;

        trace!(status = ?output.status, "spotdl finished");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.is_empty() {
                anyhow::bail!("spotdl exited with {:?}", output.status.code());
            }
            anyhow::bail!(stderr.to_string());
        }

        Ok(output)
    }
}

#[async_trait::async_trait]
impl Catalog for SpotdlCatalog {
    #[tracing::instrument(skip(self, scratch_dir))]
    async fn resolve(&self, url: &str, scratch_dir: &Path) -> anyhow::Result<Vec<TrackDescriptor>> {
        debug!("Resolving catalog link");
        let save_file = scratch_dir.join("tracks.spotdl");

        let mut cmd = self.command("save");
        cmd.arg(url).arg("--save-file").arg(&save_file);
        self.run(cmd).await?;

        let saved = tokio::fs::read(&save_file)
            .await
            .context("spotdl did not write a save file")?;

        parse_saved(&saved)
    }

    #[tracing::instrument(skip_all, fields(title = %track.title))]
    async fn fetch(&self, track: &TrackDescriptor, download_dir: &Path) -> anyhow::Result<PathBuf> {
        debug!("Fetching track");
        let template: OsString = download_dir.join(OUTPUT_TEMPLATE).into_os_string();

        let mut cmd = self.command("download");
        cmd.arg(&track.source_url)
            .arg("--output")
            .arg(&template)
            .args(["--format", TRACK_FORMAT]);
        self.run(cmd).await?;

        first_file_in(download_dir)
            .await?
            .with_context(|| format!("No audio file written for {}", track.title))
    }
}

fn parse_saved(saved: &[u8]) -> anyhow::Result<Vec<TrackDescriptor>> {
    let songs: Vec<SavedSong> =
        serde_json::from_slice(saved).context("Could not read spotdl save file")?;

    Ok(songs.into_iter().map(Into::into).collect())
}

async fn first_file_in(dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden && entry.file_type().await?.is_file() {
            return Ok(Some(entry.path()));
        }
    }

    Ok(None)
}
