use crate::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Where a piece of media comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A file on the local filesystem. Always absolute.
    LocalFile(PathBuf),
    /// A network stream; there is no local origin to copy or delete.
    RemoteStream(Url),
}

impl Locator {
    /// Validates that `path` names an existing regular file.
    pub fn local(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let canonical = path
            .canonicalize()
            .map_err(|err| Error::InvalidSource(format!("{}: {err}", path.display())))?;
        if !canonical.is_file() {
            return Err(Error::InvalidSource(format!(
                "{} is not a file",
                path.display()
            )));
        }
        Ok(Locator::LocalFile(canonical))
    }

    /// Parses user-entered text as a media URL.
    ///
    /// `file:` URLs resolve to [`Locator::LocalFile`]; every other scheme needs a host.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let text = text.trim();
        let url =
            Url::parse(text).map_err(|err| Error::InvalidSource(format!("{text:?}: {err}")))?;

        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| Error::InvalidSource(format!("{text:?}: not a local path")))?;
            return Self::local(path);
        }

        if !url.has_host() {
            return Err(Error::InvalidSource(format!("{text:?}: missing host")));
        }
        Ok(Locator::RemoteStream(url))
    }

    /// The local file backing this media, if any.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Locator::LocalFile(path) => Some(path),
            Locator::RemoteStream(_) => None,
        }
    }

    /// URI handed to the media engine.
    pub fn uri(&self) -> Result<Url, Error> {
        match self {
            Locator::LocalFile(path) => Url::from_file_path(path).map_err(|_| Error::Uri),
            Locator::RemoteStream(url) => Ok(url.clone()),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::LocalFile(path) => write!(f, "{}", path.display()),
            Locator::RemoteStream(url) => write!(f, "{url}"),
        }
    }
}
