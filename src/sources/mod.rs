//! External sources.
//!
//! Sources answer questions about, or fetch data from, things outside the
//! build tree: repository history, remote archives, and archive contents.

pub mod archive;
pub mod describe;
pub mod fetch;

pub use archive::extract_archive;
pub use describe::{Describe, DescribeBackend, DescribeQuery, GitCommand, LibGit};
pub use fetch::{FetchError, Fetcher, HttpFetcher};
