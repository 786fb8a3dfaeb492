//! Resolving a request's PDF source to a local file.
//!
//! Local paths are used in place. URLs are downloaded into a temporary file
//! that lives exactly as long as the [`ResolvedSource`] guard.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Url;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{PdflensError, Result, SourceError};
use crate::models::SourceInfo;
use crate::models::config::DownloadConfig;

/// Where a request's PDF lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Path(PathBuf),
    Url(String),
}

impl SourceSpec {
    /// Build from the optional request fields; exactly one must be set.
    pub fn from_parts(file_path: Option<&str>, url: Option<&str>) -> Result<Self> {
        match (file_path, url) {
            (Some(_), Some(_)) => Err(PdflensError::InvalidArgument(
                "provide either file_path or url, not both".to_string(),
            )),
            (None, None) => Err(PdflensError::InvalidArgument(
                "either file_path or url must be provided".to_string(),
            )),
            (Some(path), None) => Ok(SourceSpec::Path(PathBuf::from(path))),
            (None, Some(url)) => Ok(SourceSpec::Url(url.to_string())),
        }
    }
}

/// Downloads a URL into a writer.
pub trait Fetcher: Send + Sync {
    /// Stream the body of `url` into `sink`, returning the number of bytes written.
    fn fetch(&self, url: &Url, sink: &mut dyn Write) -> std::result::Result<u64, SourceError>;
}

/// Blocking HTTP fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    max_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| PdflensError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url, sink: &mut dyn Write) -> std::result::Result<u64, SourceError> {
        let download_error = |reason: String| SourceError::Download {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| download_error(e.to_string()))?;

        if !response.status().is_success() {
            return Err(download_error(format!("HTTP {}", response.status())));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(download_error(format!(
                    "response of {} bytes exceeds limit of {} bytes",
                    length, self.max_bytes
                )));
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.contains("pdf") && !url.path().to_ascii_lowercase().ends_with(".pdf") {
            warn!("URL may not point to a PDF (content-type: {:?})", content_type);
        }

        let written = copy_limited(response, sink, self.max_bytes)
            .map_err(|e| download_error(e.to_string()))?;
        if written > self.max_bytes {
            return Err(download_error(format!(
                "response exceeds limit of {} bytes",
                self.max_bytes
            )));
        }

        Ok(written)
    }
}

/// A local PDF path, plus the temporary file backing it when downloaded.
///
/// Dropping the guard deletes the temporary file.
#[derive(Debug)]
pub struct ResolvedSource {
    path: PathBuf,
    info: SourceInfo,
    temp: Option<NamedTempFile>,
}

impl ResolvedSource {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &SourceInfo {
        &self.info
    }
}

impl Drop for ResolvedSource {
    fn drop(&mut self) {
        if self.temp.is_some() {
            debug!("Removing downloaded copy {}", self.path.display());
        }
    }
}

/// Turns a [`SourceSpec`] into a [`ResolvedSource`].
#[derive(Clone)]
pub struct SourceResolver {
    fetcher: Arc<dyn Fetcher>,
    temp_dir: Option<PathBuf>,
}

impl SourceResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            temp_dir: None,
        }
    }

    /// Create downloads in `dir` instead of the OS temp directory.
    pub fn with_temp_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.temp_dir = dir;
        self
    }

    pub fn resolve(&self, source: &SourceSpec) -> Result<ResolvedSource> {
        match source {
            SourceSpec::Path(path) => self.resolve_path(path),
            SourceSpec::Url(url) => self.resolve_url(url),
        }
    }

    fn resolve_path(&self, path: &Path) -> Result<ResolvedSource> {
        let file = std::fs::File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SourceError::FileNotFound(path.to_path_buf()),
            _ => SourceError::Unreadable {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let metadata = file
            .metadata()
            .ok()
            .filter(|m| m.is_file())
            .ok_or_else(|| SourceError::FileNotFound(path.to_path_buf()))?;

        debug!("Resolved local file {}", path.display());
        Ok(ResolvedSource {
            path: path.to_path_buf(),
            info: SourceInfo {
                file_path: Some(path.display().to_string()),
                url: None,
                size_bytes: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            },
            temp: None,
        })
    }

    fn resolve_url(&self, raw: &str) -> Result<ResolvedSource> {
        let url = Url::parse(raw)
            .map_err(|e| PdflensError::InvalidArgument(format!("invalid URL {:?}: {}", raw, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PdflensError::InvalidArgument(format!(
                "unsupported URL scheme: {}",
                url.scheme()
            )));
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("pdflens-").suffix(".pdf");
        let mut temp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(SourceError::TempFile)?;

        info!("Downloading {}", url);
        let size = self.fetcher.fetch(&url, temp.as_file_mut())?;
        temp.as_file_mut().flush().map_err(SourceError::TempFile)?;
        debug!("Downloaded {} bytes to {}", size, temp.path().display());

        Ok(ResolvedSource {
            path: temp.path().to_path_buf(),
            info: SourceInfo {
                file_path: None,
                url: Some(raw.to_string()),
                size_bytes: size,
                modified: None,
            },
            temp: Some(temp),
        })
    }
}

/// Copy at most `max_bytes + 1` bytes so an oversized body is detectable.
fn copy_limited(reader: impl Read, sink: &mut dyn Write, max_bytes: u64) -> std::io::Result<u64> {
    std::io::copy(&mut reader.take(max_bytes + 1), sink)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    /// Serves fixed bytes, or fails like a 404.
    pub(crate) struct StaticFetcher(pub Option<Vec<u8>>);

    impl Fetcher for StaticFetcher {
        fn fetch(&self, url: &Url, sink: &mut dyn Write) -> std::result::Result<u64, SourceError> {
            match &self.0 {
                Some(body) => {
                    sink.write_all(body)?;
                    Ok(body.len() as u64)
                }
                None => Err(SourceError::Download {
                    url: url.to_string(),
                    reason: "HTTP 404 Not Found".to_string(),
                }),
            }
        }
    }

    fn resolver(body: Option<Vec<u8>>, dir: &Path) -> SourceResolver {
        SourceResolver::new(Arc::new(StaticFetcher(body))).with_temp_dir(Some(dir.to_path_buf()))
    }

    #[test]
    fn test_spec_requires_exactly_one_source() {
        assert!(matches!(
            SourceSpec::from_parts(Some("a.pdf"), Some("https://x/a.pdf")),
            Err(PdflensError::InvalidArgument(_))
        ));
        assert!(matches!(
            SourceSpec::from_parts(None, None),
            Err(PdflensError::InvalidArgument(_))
        ));
        assert_eq!(
            SourceSpec::from_parts(Some("a.pdf"), None).unwrap(),
            SourceSpec::Path(PathBuf::from("a.pdf"))
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolver(None, dir.path())
            .resolve(&SourceSpec::Path(dir.path().join("nope.pdf")))
            .unwrap_err();
        assert!(matches!(err, PdflensError::Source(SourceError::FileNotFound(_))));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolver(None, dir.path())
            .resolve(&SourceSpec::Path(dir.path().to_path_buf()))
            .unwrap_err();
        assert!(matches!(err, PdflensError::Source(SourceError::FileNotFound(_))));
    }

    #[test]
    fn test_unopenable_file_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("doc.pdf");
        std::fs::write(&file, b"%PDF-1.5").unwrap();

        // A regular file used as a directory component fails with ENOTDIR.
        let err = resolver(None, dir.path())
            .resolve(&SourceSpec::Path(file.join("inner.pdf")))
            .unwrap_err();
        assert!(matches!(err, PdflensError::Source(SourceError::Unreadable { .. })));
        assert_eq!(err.kind(), ErrorKind::SourceError);
    }

    #[test]
    fn test_local_file_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.5").unwrap();

        let resolved = resolver(None, dir.path()).resolve(&SourceSpec::Path(path.clone())).unwrap();
        assert_eq!(resolved.path(), path.as_path());
        assert_eq!(resolved.info().size_bytes, 8);
        assert!(resolved.info().modified.is_some());
        assert!(resolved.temp.is_none());
    }

    #[test]
    fn test_download_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolver(Some(b"%PDF-1.7 body".to_vec()), dir.path())
            .resolve(&SourceSpec::Url("https://example.com/a.pdf".to_string()))
            .unwrap();

        assert!(resolved.temp.is_some());
        assert_eq!(std::fs::read(resolved.path()).unwrap(), b"%PDF-1.7 body");
        assert_eq!(resolved.info().url.as_deref(), Some("https://example.com/a.pdf"));

        let path = resolved.path().to_path_buf();
        drop(resolved);
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_download_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolver(None, dir.path())
            .resolve(&SourceSpec::Url("https://example.com/missing.pdf".to_string()))
            .unwrap_err();

        assert!(matches!(err, PdflensError::Source(SourceError::Download { .. })));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_invalid_urls() {
        let dir = tempfile::tempdir().unwrap();
        let r = resolver(None, dir.path());
        assert!(matches!(
            r.resolve(&SourceSpec::Url("not a url".to_string())),
            Err(PdflensError::InvalidArgument(_))
        ));
        assert!(matches!(
            r.resolve(&SourceSpec::Url("ftp://example.com/a.pdf".to_string())),
            Err(PdflensError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_copy_limited() {
        let mut out = Vec::new();
        let n = copy_limited(&b"0123456789"[..], &mut out, 4).unwrap();
        assert_eq!(n, 5);
    }
}
