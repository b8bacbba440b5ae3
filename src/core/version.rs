//! Version identity derived from repository history.
//!
//! A describe query of the form `v<major>.<minor>.<patch>-<commits>-g<hash>`
//! is parsed into a [`VersionIdentity`], which encodes to a single monotonic
//! [`VersionCode`] by fixed-width decimal concatenation:
//!
//! ```text
//! major(2) + minor(1) + patch(1) + commits(5)
//! v1.2.3-45-gabcdef  ->  "01" "2" "3" "00045"  ->  "012300045"  ->  12300045
//! ```
//!
//! Each field must fit its width. A field that does not fit is an error,
//! never a silent truncation.

use std::fmt;
use std::sync::LazyLock;

use miette::Diagnostic;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Matches the long describe form, with an optional dirty marker.
static DESCRIBE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v(\d+)\.(\d+)\.(\d+)-(\d+)-g([0-9a-fA-F]+)(-dirty)?$")
        .expect("describe pattern is valid")
});

/// Decimal widths of the encoded fields.
pub const MAJOR_WIDTH: usize = 2;
pub const MINOR_WIDTH: usize = 1;
pub const PATCH_WIDTH: usize = 1;
pub const COMMITS_WIDTH: usize = 5;

/// A field captured from describe output could not be encoded.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("version field `{field}` is not numeric: `{value}`")]
    #[diagnostic(
        code(gantry::version::malformed),
        help("this indicates a defect in describe parsing, please report it")
    )]
    Malformed { field: &'static str, value: String },

    #[error("version field `{field}` = {value} does not fit in {width} decimal digit(s)")]
    #[diagnostic(
        code(gantry::version::overflow),
        help("tag a new version whose components fit the version code layout")
    )]
    FieldOverflow {
        field: &'static str,
        value: String,
        width: usize,
    },
}

/// Structured version identity parsed from a describe query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionIdentity {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub commits_since_patch: u32,
    pub commit_hash: String,
    pub dirty: bool,
}

impl VersionIdentity {
    /// Parse describe output.
    ///
    /// Returns `Ok(None)` when the text is not in long describe form (for
    /// example a bare commit hash when no matching tag is reachable).
    pub fn parse(describe: &str) -> Result<Option<Self>, VersionError> {
        let Some(caps) = DESCRIBE_RE.captures(describe.trim()) else {
            return Ok(None);
        };

        let field = |idx: usize| caps.get(idx).map(|m| m.as_str()).unwrap_or_default();

        let identity = VersionIdentity {
            major: parse_field("major", field(1), MAJOR_WIDTH)?,
            minor: parse_field("minor", field(2), MINOR_WIDTH)?,
            patch: parse_field("patch", field(3), PATCH_WIDTH)?,
            commits_since_patch: parse_field("commits", field(4), COMMITS_WIDTH)?,
            commit_hash: field(5).to_string(),
            dirty: caps.get(6).is_some(),
        };

        Ok(Some(identity))
    }

    /// The fixed-width digit string, before integer conversion.
    pub fn code_digits(&self) -> String {
        format!(
            "{:0mw$}{:0nw$}{:0pw$}{:0cw$}",
            self.major,
            self.minor,
            self.patch,
            self.commits_since_patch,
            mw = MAJOR_WIDTH,
            nw = MINOR_WIDTH,
            pw = PATCH_WIDTH,
            cw = COMMITS_WIDTH,
        )
    }

    /// Encode into a version code. Dirty state never affects the code.
    pub fn version_code(&self) -> VersionCode {
        let scale_patch = 10u32.pow(COMMITS_WIDTH as u32);
        let scale_minor = scale_patch * 10u32.pow(PATCH_WIDTH as u32);
        let scale_major = scale_minor * 10u32.pow(MINOR_WIDTH as u32);

        VersionCode(
            self.major * scale_major
                + self.minor * scale_minor
                + self.patch * scale_patch
                + self.commits_since_patch,
        )
    }
}

impl fmt::Display for VersionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{}.{}.{}-{}-g{}",
            self.major, self.minor, self.patch, self.commits_since_patch, self.commit_hash
        )?;
        if self.dirty {
            write!(f, "-dirty")?;
        }
        Ok(())
    }
}

/// Single-integer encoding of a [`VersionIdentity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionCode(pub u32);

impl VersionCode {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VersionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn parse_field(field: &'static str, value: &str, width: usize) -> Result<u32, VersionError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::Malformed {
            field,
            value: value.to_string(),
        });
    }

    let overflow = || VersionError::FieldOverflow {
        field,
        value: value.to_string(),
        width,
    };

    // Digits only at this point, so a parse failure can only mean overflow.
    let parsed: u64 = value.parse().map_err(|_| overflow())?;
    if parsed >= 10u64.pow(width as u32) {
        return Err(overflow());
    }

    Ok(parsed as u32)
}
