//! Test doubles and fixtures for unit tests.
//!
//! - [`MockDescriber`] answers describe queries with canned output.
//! - [`MockFetcher`] serves archives from memory and counts requests.
//! - [`TarballBuilder`] assembles tar archives in memory.
//! - [`GitFixture`] is a throwaway repository driven through libgit2.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use git2::{Repository, Signature};
use tempfile::TempDir;
use url::Url;

use crate::sources::describe::{Describe, DescribeQuery};
use crate::sources::fetch::{FetchError, Fetcher};

/// Describer returning fixed output per query kind.
#[derive(Debug, Default)]
pub struct MockDescriber {
    long: Option<String>,
    dirty: Option<String>,
    failure: Option<String>,
    queries: Mutex<Vec<DescribeQuery>>,
}

impl MockDescriber {
    pub fn new() -> Self {
        MockDescriber::default()
    }

    /// Every query fails with `message`, as outside a repository.
    pub fn failing(message: impl Into<String>) -> Self {
        MockDescriber {
            failure: Some(message.into()),
            ..MockDescriber::default()
        }
    }

    /// Output for long-form queries.
    pub fn long(mut self, output: impl Into<String>) -> Self {
        self.long = Some(output.into());
        self
    }

    /// Output for dirty-aware queries.
    pub fn dirty(mut self, output: impl Into<String>) -> Self {
        self.dirty = Some(output.into());
        self
    }

    /// Queries received so far, in order.
    pub fn queries(&self) -> Vec<DescribeQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl Describe for MockDescriber {
    fn describe(&self, query: &DescribeQuery) -> Result<String> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.clone());
        }

        if let Some(ref message) = self.failure {
            bail!("{}", message);
        }

        let output = if query.long { &self.long } else { &self.dirty };
        match output {
            Some(output) => Ok(output.clone()),
            None => bail!("no describe output configured for {:?}", query),
        }
    }
}

/// Fetcher serving registered URLs from memory; anything else is a 404.
#[derive(Debug, Default)]
pub struct MockFetcher {
    bodies: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        MockFetcher::default()
    }

    pub fn serve(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    /// Number of fetch calls made, successful or not.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for MockFetcher {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let body = self.bodies.get(url.as_str()).ok_or_else(|| FetchError::Http {
            url: url.clone(),
            status: 404,
        })?;

        let io_err = |source| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        };
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(dest, body).map_err(io_err)?;
        Ok(body.len() as u64)
    }
}

/// In-memory tar archive builder.
#[derive(Debug, Default)]
pub struct TarballBuilder {
    entries: Vec<(String, Option<Vec<u8>>)>,
}

impl TarballBuilder {
    pub fn new() -> Self {
        TarballBuilder::default()
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.entries.push((path.to_string(), None));
        self
    }

    pub fn file(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.entries
            .push((path.to_string(), Some(content.as_ref().to_vec())));
        self
    }

    /// The uncompressed archive.
    pub fn tar_bytes(&self) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, content) in &self.entries {
            let mut header = tar::Header::new_gnu();
            match content {
                None => {
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_mode(0o755);
                    header.set_size(0);
                    header.set_cksum();
                    builder
                        .append_data(&mut header, path, std::io::empty())
                        .unwrap();
                }
                Some(data) => {
                    header.set_entry_type(tar::EntryType::Regular);
                    header.set_mode(0o644);
                    header.set_size(data.len() as u64);
                    header.set_cksum();
                    builder
                        .append_data(&mut header, path, data.as_slice())
                        .unwrap();
                }
            }
        }
        builder.into_inner().unwrap()
    }

    /// The gzip-compressed archive.
    pub fn gz_bytes(&self) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&self.tar_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    pub fn write_gz(&self, path: &Path) {
        std::fs::write(path, self.gz_bytes()).unwrap();
    }

    pub fn write_plain(&self, path: &Path) {
        std::fs::write(path, self.tar_bytes()).unwrap();
    }
}

/// A temporary git repository.
pub struct GitFixture {
    dir: TempDir,
    repo: Repository,
}

impl GitFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Gantry Test").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        GitFixture { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn signature(&self) -> Signature<'static> {
        Signature::now("Gantry Test", "test@example.com").unwrap()
    }

    /// Write `file` and commit it on HEAD.
    pub fn commit(&self, file: &str, content: &str) {
        std::fs::write(self.path().join(file), content).unwrap();

        let mut index = self.repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        let sig = self.signature();
        let parent = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<_> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, &format!("update {}", file), &tree, &parents)
            .unwrap();
    }

    /// Annotated tag on HEAD.
    pub fn tag(&self, name: &str) {
        let head = self.repo.head().unwrap().peel_to_commit().unwrap();
        self.repo
            .tag(name, head.as_object(), &self.signature(), name, false)
            .unwrap();
    }
}
