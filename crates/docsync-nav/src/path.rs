//! Hierarchical page paths

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::{Error, Result};

/// Separator used when a path is displayed or parsed from text.
const SEPARATOR: char = '/';

/// Ordered sequence of slug segments identifying a page.
///
/// The number of segments is the page's depth in the outline; dropping the
/// last segment yields the parent's path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PagePath(Vec<String>);

impl PagePath {
    /// Build a path from its segments, validating each slug.
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(Error::EmptyPath);
        }
        for segment in &segments {
            validate_slug(segment)?;
        }
        Ok(Self(segments))
    }

    /// Single-segment path at the top of the outline.
    pub fn root(slug: impl Into<String>) -> Result<Self> {
        Self::new([slug.into()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Depth in the outline, starting at 1 for top-level pages.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// The last segment.
    pub fn slug(&self) -> &str {
        // Construction guarantees at least one segment.
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    /// Path of the parent page, or `None` for top-level pages.
    pub fn parent(&self) -> Option<PagePath> {
        if self.0.len() <= 1 {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Path of a child page with the given slug.
    pub fn child(&self, slug: impl Into<String>) -> Result<PagePath> {
        let slug = slug.into();
        validate_slug(&slug)?;
        let mut segments = self.0.clone();
        segments.push(slug);
        Ok(Self(segments))
    }

    /// True when `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &PagePath) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }
}

impl fmt::Display for PagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for PagePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s.split(SEPARATOR))
    }
}

impl Serialize for PagePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Check that a slug can appear as a path segment and a table cell.
pub fn validate_slug(slug: &str) -> Result<()> {
    let reason = if slug.is_empty() {
        Some("slug is empty")
    } else if slug.chars().any(char::is_whitespace) {
        Some("slug contains whitespace")
    } else if slug.contains(['|', '/', '\\']) {
        Some("slug contains a reserved character")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(Error::InvalidSlug {
            slug: slug.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_drops_last_segment() {
        let path: PagePath = "how-to/install/snap".parse().unwrap();
        assert_eq!(path.depth(), 3);
        assert_eq!(path.slug(), "snap");
        assert_eq!(path.parent().unwrap().to_string(), "how-to/install");
        assert!(PagePath::root("how-to").unwrap().parent().is_none());
    }

    #[test]
    fn ancestor_is_strict() {
        let parent: PagePath = "how-to".parse().unwrap();
        let child = parent.child("install").unwrap();
        assert!(parent.is_ancestor_of(&child));
        assert!(!child.is_ancestor_of(&parent));
        assert!(!parent.is_ancestor_of(&parent));
    }

    #[test]
    fn rejects_bad_slugs() {
        assert_eq!(PagePath::new(Vec::<String>::new()), Err(Error::EmptyPath));
        assert!(PagePath::root("has space").is_err());
        assert!(PagePath::root("pipe|d").is_err());
        assert!("a//b".parse::<PagePath>().is_err());
    }

    #[test]
    fn serializes_as_display_string() {
        let path: PagePath = "reference/api".parse().unwrap();
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"reference/api\"");
    }
}
