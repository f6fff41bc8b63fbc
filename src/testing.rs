//! In-memory stand-ins for the bot's collaborators.

use std::{
    collections::HashMap,
    fs::File,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use teloxide::types::{ChatId, MessageId};

use crate::{
    artifact::{ArtifactKind, MediaArtifact},
    bot::Transport,
    downloader::{
        batch::TrackDescriptor,
        handlers::{Catalog, Extracted, MediaExtractor},
    },
    helpers::download::HttpFetch,
    request::{Format, ReplyTarget},
};

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).map_or(true, |mut entries| entries.next().is_none())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Text(String),
    Artifact {
        kind: ArtifactKind,
        display_name: Option<String>,
        caption: Option<String>,
        size: u64,
        zip_entries: Option<usize>,
    },
    Formats(String),
    Removed(MessageId),
}

#[derive(Debug, Default)]
pub struct FakeTransport {
    sent: Mutex<Vec<Sent>>,
    fail_sends: bool,
    fail_texts: bool,
}
impl FakeTransport {
    pub fn failing_sends() -> Self {
        Self {
            fail_sends: true,
            ..Self::default()
        }
    }

    /// Every send fails, text replies included.
    pub fn unreachable() -> Self {
        Self {
            fail_sends: true,
            fail_texts: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().expect("poisoned").clone()
    }

    fn push(&self, sent: Sent) {
        self.sent.lock().expect("poisoned").push(sent);
    }
}

#[async_trait::async_trait]
impl Transport for FakeTransport {
    async fn send_text(&self, _target: &ReplyTarget, text: &str) -> anyhow::Result<()> {
        if self.fail_texts {
            anyhow::bail!("Forbidden: bot was blocked by the user");
        }

        self.push(Sent::Text(text.to_string()));
        Ok(())
    }

    async fn send_artifact(
        &self,
        _target: &ReplyTarget,
        artifact: &MediaArtifact,
        caption: Option<&str>,
    ) -> anyhow::Result<()> {
        if self.fail_sends {
            anyhow::bail!("Request Entity Too Large");
        }

        assert!(artifact.path().exists(), "artifact deleted before send");

        let zip_entries = (artifact.kind() == ArtifactKind::Archive).then(|| {
            zip::ZipArchive::new(File::open(artifact.path()).expect("open archive"))
                .expect("valid archive")
                .len()
        });

        self.push(Sent::Artifact {
            kind: artifact.kind(),
            display_name: artifact.display_name().map(ToString::to_string),
            caption: caption.map(ToString::to_string),
            size: artifact.size(),
            zip_entries,
        });
        Ok(())
    }

    async fn offer_formats(&self, _target: &ReplyTarget, url: &str) -> anyhow::Result<()> {
        self.push(Sent::Formats(url.to_string()));
        Ok(())
    }

    async fn remove_message(&self, _chat: ChatId, message: MessageId) -> anyhow::Result<()> {
        self.push(Sent::Removed(message));
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakeExtractor {
    error: Option<String>,
    panics: bool,
    delay: Duration,
}
impl FakeExtractor {
    pub const fn working() -> Self {
        Self {
            error: None,
            panics: false,
            delay: Duration::ZERO,
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::working()
        }
    }

    /// Writes a partial file, then panics mid-download.
    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::working()
        }
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait::async_trait]
impl MediaExtractor for FakeExtractor {
    async fn extract(
        &self,
        _url: &str,
        format: Format,
        output_stem: &Path,
    ) -> anyhow::Result<Extracted> {
        tokio::time::sleep(self.delay).await;

        if self.panics {
            std::fs::write(with_suffix(output_stem, ".webm.part"), b"partial")?;
            panic!("extractor blew up");
        }

        if let Some(error) = &self.error {
            std::fs::write(with_suffix(output_stem, ".f137.mp4.part"), b"partial")?;
            anyhow::bail!(error.clone());
        }

        let path = with_suffix(output_stem, &format!(".{}", format.as_str()));
        std::fs::write(&path, b"media")?;

        Ok(Extracted {
            path,
            title: Some("Fake Title".to_string()),
        })
    }
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut path = stem.as_os_str().to_os_string();
    path.push(suffix);
    PathBuf::from(path)
}

#[derive(Debug)]
pub struct FakeCatalog {
    titles: Vec<String>,
    failing: Vec<String>,
}
impl FakeCatalog {
    pub fn new(titles: &[&str], failing: &[&str]) -> Self {
        Self {
            titles: titles.iter().map(ToString::to_string).collect(),
            failing: failing.iter().map(ToString::to_string).collect(),
        }
    }
}

#[async_trait::async_trait]
impl Catalog for FakeCatalog {
    async fn resolve(&self, url: &str, _scratch_dir: &Path) -> anyhow::Result<Vec<TrackDescriptor>> {
        Ok(self
            .titles
            .iter()
            .enumerate()
            .map(|(n, title)| {
                TrackDescriptor::new(title.clone(), "Artist".to_string(), format!("{url}#{n}"))
            })
            .collect())
    }

    async fn fetch(&self, track: &TrackDescriptor, download_dir: &Path) -> anyhow::Result<PathBuf> {
        if self.failing.contains(&track.title) {
            std::fs::write(download_dir.join("half.tmp"), b"partial")?;
            anyhow::bail!("no match for {}", track.title);
        }

        let path = download_dir.join(format!("{}.mp3", track.title));
        std::fs::write(&path, track.title.repeat(100))?;
        Ok(path)
    }
}

#[derive(Debug, Default)]
pub struct FakeHttp {
    pages: HashMap<String, String>,
    resources: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
    page_timeouts: Mutex<Vec<Duration>>,
}
impl FakeHttp {
    #[must_use]
    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    #[must_use]
    pub fn resource(mut self, url: &str, bytes: &[u8]) -> Self {
        self.resources.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Timeouts passed to every page fetch so far.
    pub fn page_timeouts(&self) -> Vec<Duration> {
        self.page_timeouts.lock().expect("poisoned").clone()
    }
}

#[async_trait::async_trait]
impl HttpFetch for FakeHttp {
    async fn fetch_text(&self, url: &str, timeout: Duration) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.page_timeouts.lock().expect("poisoned").push(timeout);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("404 for {url}"))
    }

    async fn download_file(&self, url: &str, file_path: &Path) -> anyhow::Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(bytes) = self.resources.get(url) else {
            anyhow::bail!("404 for {url}");
        };

        tokio::fs::write(file_path, bytes).await?;
        Ok(bytes.len() as u64)
    }
}
