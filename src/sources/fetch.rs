//! Archive downloads.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use url::Url;

/// A download failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to create HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("download of {url} timed out after {timeout:?}")]
    Timeout { url: Url, timeout: Duration },

    #[error("download of {url} failed: HTTP {status}")]
    Http { url: Url, status: u16 },

    #[error("download of {url} failed")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to write download to {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Fetches a remote archive to a local file.
pub trait Fetcher: Send + Sync {
    /// Download `url` to `dest`, returning the number of bytes written.
    ///
    /// `dest` either holds the complete archive afterwards or is untouched.
    fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, FetchError>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        (**self).fetch(url, dest)
    }
}

impl<T: Fetcher + ?Sized> Fetcher for Box<T> {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        (**self).fetch(url, dest)
    }
}

/// Blocking HTTP(S) fetcher with a bounded timeout.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    timeout: Duration,
    progress: bool,
}

impl HttpFetcher {
    /// Create a fetcher whose whole request (connect + body) must finish within `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("gantry/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;

        Ok(HttpFetcher {
            client,
            timeout,
            progress: false,
        })
    }

    /// Show a byte progress bar on stderr when it is a terminal.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn progress_bar(&self, total: Option<u64>) -> ProgressBar {
        if !self.progress || !io::stderr().is_terminal() {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(total.unwrap_or(0));
        let template = if total.is_some() {
            "{spinner:.cyan} [{bar:30.cyan/blue}] {bytes}/{total_bytes} {bytes_per_sec}"
        } else {
            "{spinner:.cyan} {bytes} {bytes_per_sec}"
        };
        if let Ok(style) = ProgressStyle::with_template(template) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar
    }

    fn transport_error(&self, url: &Url, source: reqwest::Error) -> FetchError {
        if source.is_timeout() {
            FetchError::Timeout {
                url: url.clone(),
                timeout: self.timeout,
            }
        } else {
            FetchError::Transport {
                url: url.clone(),
                source,
            }
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, FetchError> {
        let io_err = |source: io::Error| FetchError::Io {
            path: dest.to_path_buf(),
            source,
        };

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.clone(),
                status: status.as_u16(),
            });
        }

        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(io_err)?;

        // Stream into a temp file beside `dest`, then move it into place.
        let mut staged = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
        let bar = self.progress_bar(response.content_length());
        let written = {
            let mut writer = bar.wrap_write(staged.as_file_mut());
            let written = response
                .copy_to(&mut writer)
                .map_err(|e| self.transport_error(url, e))?;
            writer.flush().map_err(io_err)?;
            written
        };
        bar.finish_and_clear();

        staged
            .persist(dest)
            .map_err(|e| io_err(e.error))?;

        Ok(written)
    }
}
