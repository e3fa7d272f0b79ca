//! External resource references and the locations they resolve against.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where a document (or one of its resources) lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Location {
    File(PathBuf),
    Url(String),
}

impl Location {
    /// Interpret text as a URL when it carries a scheme, otherwise as a path.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if is_remote(text) {
            Self::Url(text.to_string())
        } else {
            Self::File(PathBuf::from(text))
        }
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Url(_))
    }

    /// The directory (or code base) containing this location.
    #[must_use]
    pub fn parent(&self) -> Self {
        match self {
            Self::File(path) => Self::File(
                path.parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            ),
            Self::Url(url) => {
                let cut = url.rfind('/').map_or(url.len(), |index| index + 1);
                // Keep "scheme://host/" intact when the URL has no path.
                let scheme_end = url.find("://").map_or(0, |index| index + 3);
                if cut <= scheme_end {
                    Self::Url(format!("{url}/"))
                } else {
                    Self::Url(url[..cut].to_string())
                }
            }
        }
    }

    /// Resolve `reference` against this base directory.
    ///
    /// Remote and absolute references are returned unchanged.
    #[must_use]
    pub fn join(&self, reference: &str) -> Self {
        if is_remote(reference) {
            return Self::Url(reference.to_string());
        }
        match self {
            Self::File(dir) => {
                let path = Path::new(reference);
                if path.is_absolute() {
                    Self::File(path.to_path_buf())
                } else {
                    Self::File(dir.join(path))
                }
            }
            Self::Url(base) => {
                let reference = reference.replace('\\', "/");
                if let Some(rest) = reference.strip_prefix('/') {
                    let scheme_end = base.find("://").map_or(0, |index| index + 3);
                    let host_end = base[scheme_end..]
                        .find('/')
                        .map_or(base.len(), |index| scheme_end + index);
                    Self::Url(format!("{}/{rest}", &base[..host_end]))
                } else if base.ends_with('/') {
                    Self::Url(format!("{base}{reference}"))
                } else {
                    Self::Url(format!("{base}/{reference}"))
                }
            }
        }
    }

    /// File stem of the last path segment, without extension.
    #[must_use]
    pub fn stem(&self) -> Option<String> {
        match self {
            Self::File(path) => path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned()),
            Self::Url(url) => {
                let name = url.rsplit('/').next().filter(|name| !name.is_empty())?;
                Some(name.split('.').next().unwrap_or(name).to_string())
            }
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// A resource reference exactly as written in a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceRef(String);

impl ResourceRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        is_remote(&self.0)
    }

    /// Last path segment; this is what the encoder writes after copying.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0
            .rsplit(['/', '\\'])
            .find(|segment| !segment.is_empty())
            .unwrap_or(&self.0)
    }

    /// Lowercased extension of the file name, if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        let (_, extension) = name.rsplit_once('.')?;
        Some(extension.to_ascii_lowercase())
    }

    #[must_use]
    pub fn resolve(&self, base: &Location) -> Location {
        base.join(&self.0)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

fn is_remote(text: &str) -> bool {
    let lower = text.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("ftp://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_join_is_relative_to_directory() {
        let base = Location::File(PathBuf::from("/pages/intro.page")).parent();
        assert_eq!(
            base.join("atom.gif"),
            Location::File(PathBuf::from("/pages/atom.gif"))
        );
    }

    #[test]
    fn url_join_and_parent() {
        let page = Location::parse("http://example.org/tutorial/part1/page.cml");
        let base = page.parent();
        assert_eq!(
            base,
            Location::Url("http://example.org/tutorial/part1/".to_string())
        );
        assert_eq!(
            base.join("img/atom.gif"),
            Location::Url("http://example.org/tutorial/part1/img/atom.gif".to_string())
        );
        assert_eq!(
            base.join("/shared/logo.png"),
            Location::Url("http://example.org/shared/logo.png".to_string())
        );
    }

    #[test]
    fn remote_reference_wins_over_base() {
        let base = Location::File(PathBuf::from("/pages"));
        assert_eq!(
            base.join("https://cdn.example.org/x.png"),
            Location::Url("https://cdn.example.org/x.png".to_string())
        );
    }

    #[test]
    fn file_name_strips_directories() {
        assert_eq!(ResourceRef::new("images/sub/atom.GIF").file_name(), "atom.GIF");
        assert_eq!(ResourceRef::new("C:\\pages\\clip.wav").file_name(), "clip.wav");
        assert_eq!(
            ResourceRef::new("images/sub/atom.GIF").extension().as_deref(),
            Some("gif")
        );
    }

    #[test]
    fn stem_of_file_and_url() {
        assert_eq!(
            Location::File(PathBuf::from("/a/lesson.page")).stem().as_deref(),
            Some("lesson")
        );
        assert_eq!(
            Location::parse("http://h/x/lesson.page").stem().as_deref(),
            Some("lesson")
        );
    }
}
