//! Archive extraction.
//!
//! Supports gzip-compressed (`.tar.gz`, `.tgz`) and plain `.tar` archives.
//! Gzip is detected by its magic bytes, so the file extension is not trusted.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Component, Path};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use tar::Archive;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Extract the archive at `archive_path` fully into `dest`.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    let mut file = File::open(archive_path)
        .with_context(|| format!("failed to open archive: {}", archive_path.display()))?;

    let mut magic = [0u8; 2];
    let gzipped = match file.read_exact(&mut magic) {
        Ok(()) => magic == GZIP_MAGIC,
        Err(_) => false,
    };
    file.seek(SeekFrom::Start(0))?;

    let reader = BufReader::new(file);
    if gzipped {
        unpack(Archive::new(GzDecoder::new(reader)), dest)
    } else {
        unpack(Archive::new(reader), dest)
    }
}

fn unpack<R: Read>(mut archive: Archive<R>, dest: &Path) -> Result<()> {
    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create destination directory: {}", dest.display()))?;

    let mut count = 0usize;
    for entry in archive.entries().context("failed to read archive entries")? {
        let mut entry = entry.context("failed to read archive entry")?;
        let entry_path = entry.path().context("failed to get entry path")?.into_owned();

        // Reject entries that would land outside the destination.
        if entry_path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            bail!(
                "archive entry escapes destination directory: {}",
                entry_path.display()
            );
        }

        let output_path = dest.join(&entry_path);
        let entry_type = entry.header().entry_type();

        match entry_type {
            tar::EntryType::Directory => {
                std::fs::create_dir_all(&output_path).with_context(|| {
                    format!("failed to create directory: {}", output_path.display())
                })?;
            }
            tar::EntryType::Regular
            | tar::EntryType::Continuous
            | tar::EntryType::Link
            | tar::EntryType::Symlink => {
                if let Some(parent) = output_path.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create directory: {}", parent.display())
                    })?;
                }
                entry.unpack_in(dest).with_context(|| {
                    format!("failed to extract: {}", output_path.display())
                })?;
                count += 1;
            }
            _ => {
                tracing::debug!(
                    "Skipping unsupported entry type {:?}: {}",
                    entry_type,
                    entry_path.display()
                );
            }
        }
    }

    tracing::debug!("Extracted {} entries to {}", count, dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TarballBuilder;
    use tempfile::TempDir;

    #[test]
    fn test_extract_gzip() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("eigen-3.4.0.tar.gz");
        TarballBuilder::new()
            .dir("eigen-3.4.0/")
            .file("eigen-3.4.0/Eigen/Core", "// core")
            .write_gz(&archive);

        let dest = tmp.path().join("out");
        extract_archive(&archive, &dest).unwrap();

        let content = std::fs::read_to_string(dest.join("eigen-3.4.0/Eigen/Core")).unwrap();
        assert_eq!(content, "// core");
    }

    #[test]
    fn test_extract_plain_tar() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("dep.tar");
        TarballBuilder::new()
            .file("dep-1.0/README", "readme")
            .write_plain(&archive);

        let dest = tmp.path().join("out");
        extract_archive(&archive, &dest).unwrap();
        assert!(dest.join("dep-1.0/README").is_file());
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("broken.tar.gz");
        std::fs::write(&archive, [0x1f, 0x8b, 0x00, 0x01, 0x02]).unwrap();

        assert!(extract_archive(&archive, &tmp.path().join("out")).is_err());
    }

    #[test]
    fn test_extract_missing_archive() {
        let tmp = TempDir::new().unwrap();
        assert!(extract_archive(&tmp.path().join("nope.tar.gz"), tmp.path()).is_err());
    }
}
