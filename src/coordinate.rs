// src/coordinate.rs

//! Package coordinates: the `group:artifact:version` identity of a package.
//!
//! Coordinates borrow their structure, and rough semantics, from Maven
//! coordinates in a simplified form. A coordinate derives everything the
//! rest of the system needs to locate a package:
//!
//! - a filesystem path fragment (`com/example/service/1.2.3`)
//! - a URL path fragment (same shape, always `/`-separated)
//! - the canonical archive filename (`service-1.2.3-pkg.zip`)
//! - the full download URL given a repository base URL
//!
//! Parsing splits on `:` into exactly three parts and deliberately does not
//! validate the content of the parts. A coordinate with odd content fails
//! later, when the derived path or URL is actually used.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

/// Suffix appended to the canonical archive filename
const FILENAME_SUFFIX: &str = "-pkg";

/// The `group:artifact:version` identity of a package
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    /// Group id, dot-separated (e.g. `com.example`)
    pub group: String,
    /// Artifact id
    pub artifact: String,
    /// Version string
    pub version: String,
}

impl Coordinate {
    /// Create a new coordinate
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    /// Parse a coordinate of the form `group:artifact:version`.
    ///
    /// Only the shape is checked; part content is not validated.
    pub fn parse(s: &str) -> Result<Self, Error> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(artifact), Some(version)) => {
                Ok(Self::new(group, artifact, version))
            }
            _ => Err(Error::CoordinateError(s.to_string())),
        }
    }

    /// Base filename for the package, without extension
    pub fn base_filename(&self) -> String {
        format!("{}-{}{}", self.artifact, self.version, FILENAME_SUFFIX)
    }

    /// Canonical archive filename for the package
    pub fn filename(&self) -> String {
        format!("{}.zip", self.base_filename())
    }

    /// Directory fragment for use on the local filesystem:
    /// group with dots as separators, then artifact, then version
    pub fn path_fragment(&self) -> PathBuf {
        let mut path: PathBuf = self.group.split('.').collect();
        path.push(&self.artifact);
        path.push(&self.version);
        path
    }

    /// Directory fragment for use in URLs, always `/`-separated
    pub fn url_path_fragment(&self) -> String {
        format!(
            "{}/{}/{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version
        )
    }

    /// Full download URL for this package given the repository base URL.
    ///
    /// Exactly one `/` separates the base from the URL path fragment,
    /// whether or not the base ends with one.
    pub fn download_url(&self, base_url: &str) -> String {
        format!(
            "{}{}{}/{}",
            base_url,
            if base_url.ends_with('/') { "" } else { "/" },
            self.url_path_fragment(),
            self.filename()
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let c = Coordinate::parse("com.example:artifact:1.2.3").unwrap();
        assert_eq!(c.group, "com.example");
        assert_eq!(c.artifact, "artifact");
        assert_eq!(c.version, "1.2.3");
    }

    #[test]
    fn test_parse_too_few_parts() {
        assert!(Coordinate::parse("com.example:artifact").is_err());
        assert!(Coordinate::parse("com.example").is_err());
    }

    #[test]
    fn test_round_trip() {
        let c = Coordinate::parse("com.example:artifact:1.2.3").unwrap();
        assert_eq!(Coordinate::parse(&c.to_string()).unwrap(), c);
    }

    #[test]
    fn test_content_not_validated() {
        // Odd content parses fine; it fails later at path/URL/IO time.
        let c = Coordinate::parse("::").unwrap();
        assert_eq!(c.group, "");
        assert_eq!(c.version, "");
    }

    #[test]
    fn test_filename() {
        let c = Coordinate::new("com.example", "artifact", "1.2.3");
        assert_eq!(c.filename(), "artifact-1.2.3-pkg.zip");
    }

    #[test]
    fn test_path_fragment() {
        let c = Coordinate::new("com.example", "artifact", "1.2.3");
        assert_eq!(
            c.path_fragment(),
            PathBuf::from("com/example/artifact/1.2.3")
        );
    }

    #[test]
    fn test_url_path_fragment() {
        let c = Coordinate::new("com.example", "artifact", "1.2.3");
        assert_eq!(c.url_path_fragment(), "com/example/artifact/1.2.3");
    }

    #[test]
    fn test_download_url_slash_insensitive() {
        let c = Coordinate::new("com.example", "artifact", "1.2.3");
        let expected = "http://repo/com/example/artifact/1.2.3/artifact-1.2.3-pkg.zip";
        assert_eq!(c.download_url("http://repo"), expected);
        assert_eq!(c.download_url("http://repo/"), expected);
    }
}
