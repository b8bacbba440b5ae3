//! License aggregation.
//!
//! Every file under the source directory that matches the include pattern
//! is normalized into one display-safe resource file in the output
//! directory. Prior outputs with the same name are overwritten; nothing
//! outside the output directory is touched. Two inputs that normalize to
//! the same resource name are a failure, never a silent overwrite.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::core::LicenseEntry;
use crate::util::fs::{ensure_dir, matching_files, read_to_string, relative_path, write_string};

/// Aggregation failed.
#[derive(Debug, Error, Diagnostic)]
pub enum AggregationError {
    #[error("failed to list license files in {dir}")]
    #[diagnostic(code(gantry::licenses::source_dir))]
    SourceDir {
        dir: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("license output directory {dir} is not writable")]
    #[diagnostic(code(gantry::licenses::output_dir))]
    OutputDir {
        dir: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("{} license file(s) failed: {}", .failures.len(), FileFailure::list(.failures))]
    #[diagnostic(code(gantry::licenses::files))]
    Files { failures: Vec<FileFailure> },
}

/// A single license file that could not be processed.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: anyhow::Error,
}

impl FileFailure {
    fn list(failures: &[FileFailure]) -> String {
        failures
            .iter()
            .map(|f| format!("{} ({:#})", f.path.display(), f.error))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Result of a successful aggregation.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub entries: Vec<LicenseEntry>,
    pub outputs: Vec<PathBuf>,
}

/// Turns a directory of license files into resource files.
pub struct LicenseAggregator {
    output_dir: PathBuf,
}

impl LicenseAggregator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        LicenseAggregator {
            output_dir: output_dir.into(),
        }
    }

    /// Directory the resource files are written to.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Process every file in `source_dir` matching `include_pattern`.
    ///
    /// A failing file does not stop the others; all failures are reported
    /// together afterwards.
    pub fn aggregate(
        &self,
        source_dir: &Path,
        include_pattern: &str,
    ) -> Result<Aggregation, AggregationError> {
        let files = if source_dir.is_dir() {
            matching_files(source_dir, include_pattern).map_err(|source| {
                AggregationError::SourceDir {
                    dir: source_dir.to_path_buf(),
                    source,
                }
            })?
        } else {
            tracing::warn!(
                "license directory {} does not exist; no licenses bundled",
                source_dir.display()
            );
            Vec::new()
        };

        ensure_dir(&self.output_dir).map_err(|source| AggregationError::OutputDir {
            dir: self.output_dir.clone(),
            source,
        })?;

        let mut aggregation = Aggregation::default();
        let mut failures = Vec::new();
        let mut claimed: HashMap<String, PathBuf> = HashMap::new();

        for path in files {
            let entry = match load(&path) {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!("failed to process license {}: {:#}", path.display(), error);
                    failures.push(FileFailure { path, error });
                    continue;
                }
            };

            if let Some(first) = claimed.get(&entry.normalized_file_name) {
                let error = anyhow::anyhow!(
                    "resource name `{}` is already taken by {}",
                    entry.normalized_file_name,
                    first.display()
                );
                tracing::warn!("failed to process license {}: {:#}", path.display(), error);
                failures.push(FileFailure { path, error });
                continue;
            }

            let output = self.output_dir.join(&entry.normalized_file_name);
            if let Err(error) = write_string(&output, &entry.render()) {
                tracing::warn!("failed to process license {}: {:#}", path.display(), error);
                failures.push(FileFailure { path, error });
                continue;
            }

            tracing::debug!(
                "{} -> {}",
                relative_path(source_dir, &path).display(),
                output.display()
            );
            claimed.insert(entry.normalized_file_name.clone(), path);
            aggregation.entries.push(entry);
            aggregation.outputs.push(output);
        }

        if !failures.is_empty() {
            return Err(AggregationError::Files { failures });
        }

        tracing::info!(
            "Bundled {} license file(s) into {}",
            aggregation.entries.len(),
            self.output_dir.display()
        );
        Ok(aggregation)
    }
}

fn load(path: &Path) -> anyhow::Result<LicenseEntry> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("file name is not valid UTF-8"))?;

    let content = read_to_string(path)?;
    Ok(LicenseEntry::new(name, &content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn license_dir(tmp: &TempDir) -> PathBuf {
        let dir = tmp.path().join("LICENSES");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("MIT.txt"), "MIT License\n\nCopyright <you>\n").unwrap();
        fs::write(dir.join("BSL-1.0.txt"), "Boost Software License\n").unwrap();
        fs::write(dir.join("README.md"), "not a license\n").unwrap();
        dir
    }

    #[test]
    fn test_aggregate_selected_files() {
        let tmp = TempDir::new().unwrap();
        let source = license_dir(&tmp);
        let out = tmp.path().join("out");

        let result = LicenseAggregator::new(&out)
            .aggregate(&source, "*.txt")
            .unwrap();

        let mut names: Vec<_> = result
            .entries
            .iter()
            .map(|e| e.normalized_file_name.as_str())
            .collect();
        names.sort();
        assert_eq!(names, ["bsl_1_0.txt", "mit.txt"]);

        let mit = fs::read_to_string(out.join("mit.txt")).unwrap();
        assert_eq!(mit, "MIT License\n<br /><br />\nCopyright &lt;you&gt;\n");
        assert!(!out.join("readme_md.txt").exists());
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let source = license_dir(&tmp);
        let out = tmp.path().join("out");
        let aggregator = LicenseAggregator::new(&out);

        aggregator.aggregate(&source, "*").unwrap();
        let first = fs::read(out.join("mit.txt")).unwrap();
        aggregator.aggregate(&source, "*").unwrap();
        let second = fs::read(out.join("mit.txt")).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_dir(&out).unwrap().count(), 3);
    }

    #[test]
    fn test_missing_source_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let result = LicenseAggregator::new(tmp.path().join("out"))
            .aggregate(&tmp.path().join("LICENSES"), "*")
            .unwrap();
        assert!(result.entries.is_empty());
    }

    #[test]
    fn test_bad_file_reported_others_written() {
        let tmp = TempDir::new().unwrap();
        let source = license_dir(&tmp);
        fs::write(source.join("Broken.txt"), [0xff, 0xfe, 0x00]).unwrap();
        let out = tmp.path().join("out");

        let err = LicenseAggregator::new(&out)
            .aggregate(&source, "*.txt")
            .unwrap_err();

        match err {
            AggregationError::Files { ref failures } => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].path.ends_with("Broken.txt"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("Broken.txt"));
        assert!(out.join("mit.txt").is_file());
        assert!(out.join("bsl_1_0.txt").is_file());
    }

    #[test]
    fn test_colliding_names_reported_not_overwritten() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("LICENSES");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("MIT.txt"), "MIT upper\n").unwrap();
        fs::write(source.join("mit"), "mit lower\n").unwrap();
        let out = tmp.path().join("out");

        let err = LicenseAggregator::new(&out)
            .aggregate(&source, "*")
            .unwrap_err();

        match err {
            AggregationError::Files { ref failures } => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].path.ends_with("mit"));
                assert!(format!("{:#}", failures[0].error).contains("MIT.txt"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            fs::read_to_string(out.join("mit.txt")).unwrap(),
            "MIT upper\n"
        );
    }

    #[test]
    fn test_nested_files_need_recursive_pattern() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("LICENSES");
        fs::create_dir_all(source.join("a")).unwrap();
        fs::create_dir_all(source.join("b")).unwrap();
        fs::write(source.join("a/LICENSE.txt"), "first\n").unwrap();
        fs::write(source.join("b/LICENSE.txt"), "second\n").unwrap();
        fs::write(source.join("MIT.txt"), "mit\n").unwrap();
        let out = tmp.path().join("out");

        let top = LicenseAggregator::new(&out)
            .aggregate(&source, "*")
            .unwrap();
        assert_eq!(top.entries.len(), 1);
        assert!(!out.join("license.txt").exists());

        let err = LicenseAggregator::new(&out)
            .aggregate(&source, "**/*")
            .unwrap_err();
        match err {
            AggregationError::Files { ref failures } => {
                assert_eq!(failures.len(), 1);
                assert!(failures[0].path.ends_with("b/LICENSE.txt"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            fs::read_to_string(out.join("license.txt")).unwrap(),
            "first\n"
        );
    }

    #[test]
    fn test_unwritable_output_dir() {
        let tmp = TempDir::new().unwrap();
        let source = license_dir(&tmp);
        let blocker = tmp.path().join("out");
        fs::write(&blocker, "a file, not a directory").unwrap();

        let err = LicenseAggregator::new(blocker.join("licenses"))
            .aggregate(&source, "*")
            .unwrap_err();
        assert!(matches!(err, AggregationError::OutputDir { .. }));
    }
}
