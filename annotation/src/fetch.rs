//! Remote dataset retrieval.
//!
//! A dataset named by an `http(s)` URL is downloaded once into a cache
//! directory, under the last segment of the URL path. Later runs reuse the
//! cached copy. A single blocking attempt is made; anything other than a
//! success status is fatal.

use std::path::{Path, PathBuf};

use tracing::info;
use url::Url;

use crate::error::{Error, Result};

/// Fallback cache name for URLs whose path has no final segment.
const DEFAULT_CACHE_NAME: &str = "dataset";

/// Returns true if `identifier` should be fetched rather than opened.
#[must_use]
pub fn is_remote(identifier: &str) -> bool {
    let lower = identifier.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// The file name a URL is cached under.
#[must_use]
pub fn cache_name(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map_or_else(|| DEFAULT_CACHE_NAME.to_owned(), str::to_owned)
}

/// Returns the local copy of `url`, downloading it into `cache_dir` first if
/// it is not already there.
///
/// # Errors
///
/// [`Error::Fetch`] for an unparsable URL, a transport failure or a
/// non-success status; [`Error::Io`] if the cache file cannot be written.
pub fn fetch_cached(url: &str, cache_dir: &Path) -> Result<PathBuf> {
    let fetch_error = |reason: String| Error::Fetch {
        url: url.to_owned(),
        reason,
    };
    let parsed = Url::parse(url.trim()).map_err(|e| fetch_error(e.to_string()))?;
    let target = cache_dir.join(cache_name(&parsed));
    if target.is_file() {
        info!(cache = %target.display(), "using cached dataset");
        return Ok(target);
    }

    info!(%url, "retrieving dataset");
    let response = reqwest::blocking::get(parsed).map_err(|e| fetch_error(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(fetch_error(format!("server answered {status}")));
    }
    let body = response.bytes().map_err(|e| fetch_error(e.to_string()))?;

    std::fs::create_dir_all(cache_dir).map_err(|e| Error::io(cache_dir, e))?;
    std::fs::write(&target, &body).map_err(|e| Error::io(&target, e))?;
    info!(cache = %target.display(), bytes = body.len(), "cached dataset");
    Ok(target)
}
