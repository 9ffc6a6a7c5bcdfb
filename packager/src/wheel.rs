//! Wheel filename parsing and build tagging.
//!
//! Wheel filenames are dash-delimited:
//! `{name}-{version}(-{build tag})?-{python tag}-{abi tag}-{platform tag}.whl`.
//! Tagging inserts a build tag right after the version so that wheels built
//! from different revisions of the same version sort and install distinctly.
//! The wheel format requires a build tag to start with a digit.

use crate::error::{PackagerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use glob::{MatchOptions, Pattern};
use std::fmt;

/// File extension carried by every wheel.
const WHEEL_EXTENSION: &str = ".whl";

/// A validated wheel build tag.
///
/// # Examples
///
/// ```
/// use mlflow_packager::wheel::BuildTag;
///
/// let tag = BuildTag::from_revision("0.sha.", "abc123").expect("valid revision");
/// assert_eq!(tag.as_str(), "0.sha.abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildTag(String);

impl BuildTag {
    /// Composes a tag from a literal prefix and a revision identifier.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidBuildTag`] if the revision is empty or
    /// contains a dash, whitespace, or a path separator, or if the composed
    /// tag does not start with a digit.
    pub fn from_revision(prefix: &str, revision: &str) -> Result<Self> {
        let invalid = |reason: &str| PackagerError::InvalidBuildTag {
            value: revision.to_owned(),
            reason: reason.to_owned(),
        };

        if revision.is_empty() {
            return Err(invalid("revision must not be empty"));
        }
        if let Some(bad) = revision
            .chars()
            .find(|c| *c == '-' || *c == '/' || *c == '\\' || c.is_whitespace())
        {
            return Err(invalid(&format!("character {bad:?} is not allowed in a build tag")));
        }

        let tag = format!("{prefix}{revision}");
        if !tag.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(PackagerError::InvalidBuildTag {
                value: tag,
                reason: "build tag must start with a digit".to_owned(),
            });
        }

        Ok(Self(tag))
    }

    /// Return the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BuildTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A wheel filename split into distribution, version, and the remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WheelFilename {
    distribution: String,
    version: String,
    rest: String,
}

impl WheelFilename {
    /// Splits a wheel filename on its first two dashes.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidWheelName`] if the name does not end
    /// in `.whl` or lacks a distribution, version, or tag segment.
    pub fn parse(filename: &str) -> Result<Self> {
        let invalid = |reason: &str| PackagerError::InvalidWheelName {
            name: filename.to_owned(),
            reason: reason.to_owned(),
        };

        if !filename.ends_with(WHEEL_EXTENSION) {
            return Err(invalid("expected a .whl extension"));
        }

        let mut parts = filename.splitn(3, '-');
        let (Some(distribution), Some(version), Some(rest)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid("expected name-version-tags"));
        };

        if distribution.is_empty() || version.is_empty() || rest.len() <= WHEEL_EXTENSION.len() {
            return Err(invalid("expected name-version-tags"));
        }

        Ok(Self {
            distribution: distribution.to_owned(),
            version: version.to_owned(),
            rest: rest.to_owned(),
        })
    }

    /// Return the distribution segment.
    #[must_use]
    pub fn distribution(&self) -> &str {
        &self.distribution
    }

    /// Return the version segment.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the filename with `tag` inserted after the version.
    ///
    /// # Examples
    ///
    /// ```
    /// use mlflow_packager::wheel::{BuildTag, WheelFilename};
    ///
    /// let wheel = WheelFilename::parse("mlflow-2.0.0-py3-none-any.whl").expect("valid wheel");
    /// let tag = BuildTag::from_revision("0.sha.", "abc123").expect("valid tag");
    /// assert_eq!(
    ///     wheel.with_build_tag(&tag),
    ///     "mlflow-2.0.0-0.sha.abc123-py3-none-any.whl"
    /// );
    /// ```
    #[must_use]
    pub fn with_build_tag(&self, tag: &BuildTag) -> String {
        format!("{}-{}-{tag}-{}", self.distribution, self.version, self.rest)
    }
}

impl fmt::Display for WheelFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.distribution, self.version, self.rest)
    }
}

/// Finds the single wheel in `dir` whose name matches `pattern`.
///
/// # Errors
///
/// Returns [`PackagerError::WheelNotFound`] when nothing matches and
/// [`PackagerError::AmbiguousWheel`] when more than one file matches.
/// A pattern that is not a valid glob gives [`PackagerError::WheelPattern`].
pub fn find_single_wheel(dir: &Utf8Path, pattern: &str) -> Result<Utf8PathBuf> {
    let full_pattern = format!("{}/{pattern}", Pattern::escape(dir.as_str()));
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::new()
    };
    let paths = glob::glob_with(&full_pattern, options).map_err(|e| {
        PackagerError::WheelPattern {
            pattern: full_pattern.clone(),
            reason: e.to_string(),
        }
    })?;

    let mut candidates = Vec::new();
    for entry in paths {
        let matched = entry.map_err(std::io::Error::from)?;
        match Utf8PathBuf::from_path_buf(matched) {
            Ok(path) if path.is_file() => candidates.push(path),
            Ok(_) => {}
            Err(non_utf8) => log::debug!("ignoring non UTF-8 path {}", non_utf8.display()),
        }
    }
    candidates.sort();

    let mut found = candidates.into_iter();
    match (found.next(), found.next()) {
        (Some(only), None) => Ok(only),
        (None, _) => Err(PackagerError::WheelNotFound {
            pattern: pattern.to_owned(),
            dir: dir.to_owned(),
        }),
        (Some(first), Some(second)) => {
            let matches = [first, second]
                .into_iter()
                .chain(found)
                .filter_map(|path| path.file_name().map(str::to_owned))
                .collect();
            Err(PackagerError::AmbiguousWheel {
                pattern: pattern.to_owned(),
                matches,
            })
        }
    }
}

/// Renames the single matching wheel in `dist_dir` to carry `tag`.
///
/// Returns the new path of the wheel.
///
/// # Errors
///
/// Returns an error if no unique wheel is found, its name cannot be parsed,
/// or the rename fails.
pub fn tag_wheel(dist_dir: &Utf8Path, pattern: &str, tag: &BuildTag) -> Result<Utf8PathBuf> {
    let wheel = find_single_wheel(dist_dir, pattern)?;
    let filename = wheel.file_name().unwrap_or_default();
    let tagged_name = WheelFilename::parse(filename)?.with_build_tag(tag);
    let tagged = wheel.with_file_name(&tagged_name);

    std::fs::rename(&wheel, &tagged).map_err(|source| PackagerError::Relocation {
        from: wheel.clone(),
        to: tagged.clone(),
        source,
    })?;
    log::debug!("renamed {wheel} to {tagged}");

    Ok(tagged)
}
