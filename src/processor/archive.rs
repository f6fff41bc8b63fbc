use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use tracing::{debug, trace};
use walkdir::WalkDir;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Zip every file under `dir` into `archive_path`, keeping paths relative to
/// `dir`. Returns the number of entries written.
#[tracing::instrument]
pub async fn archive_directory(dir: PathBuf, archive_path: PathBuf) -> anyhow::Result<usize> {
    debug!("Packaging directory");
    tokio::task::spawn_blocking(move || write_archive(&dir, &archive_path)).await?
}

fn write_archive(dir: &Path, archive_path: &Path) -> anyhow::Result<usize> {
    let mut zip = ZipWriter::new(File::create(archive_path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry
            .path()
            .strip_prefix(dir)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        trace!(%name, "Adding file to archive");
        zip.start_file(name, options)?;
        io::copy(&mut File::open(entry.path())?, &mut zip)?;
        entries += 1;
    }

    zip.finish()?;
    debug!(entries, "Archive written");

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[tokio::test]
    async fn keeps_relative_paths() {
        let src = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");
        std::fs::write(src.path().join("b.mp3"), b"bbb").expect("write");
        std::fs::create_dir(src.path().join("disc 2")).expect("mkdir");
        std::fs::write(src.path().join("disc 2").join("a.mp3"), b"aaa").expect("write");

        let archive_path = out.path().join("x.zip");
        let entries = archive_directory(src.path().into(), archive_path.clone())
            .await
            .expect("archived");
        assert_eq!(entries, 2);

        let mut zip = zip::ZipArchive::new(File::open(&archive_path).expect("open")).expect("zip");
        let mut names: Vec<_> = zip.file_names().map(ToString::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["b.mp3", "disc 2/a.mp3"]);

        let mut contents = String::new();
        zip.by_name("disc 2/a.mp3")
            .expect("entry")
            .read_to_string(&mut contents)
            .expect("read");
        assert_eq!(contents, "aaa");
    }

    #[tokio::test]
    async fn empty_directory_gives_empty_archive() {
        let src = tempfile::tempdir().expect("tempdir");
        let out = tempfile::tempdir().expect("tempdir");

        let entries = archive_directory(src.path().into(), out.path().join("e.zip"))
            .await
            .expect("archived");

        assert_eq!(entries, 0);
    }
}
