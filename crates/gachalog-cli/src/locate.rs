//! Finds the authorization URL the game client leaves on disk.
//!
//! The client logs its data directory on "Warmup file" lines. Under that
//! directory the in-game browser's cache holds one URL per gacha page it
//! opened; the last one is the freshest and the only one likely to still
//! carry a valid signature. Older clients wrote the URL straight into the log.

use std::fs;
use std::path::{Path, PathBuf};

use gachalog_core::LocatorConfig;
use regex::Regex;
use regex::bytes::Regex as BytesRegex;
use tracing::{info, warn};

/// `<home>/AppData/LocalLow/miHoYo/原神`
pub fn default_log_dir() -> Option<PathBuf> {
    let home = std::env::var_os("USERPROFILE").or_else(|| std::env::var_os("HOME"))?;
    Some(
        PathBuf::from(home)
            .join("AppData")
            .join("LocalLow")
            .join("miHoYo")
            .join("原神"),
    )
}

/// Search `log_dir` if one could be resolved.
///
/// Having no directory at all is a miss like any other: empty string.
pub fn locate_in(log_dir: Option<PathBuf>, config: &LocatorConfig) -> String {
    match log_dir {
        Some(dir) => locate_auth_url(&dir, config),
        None => {
            warn!("cannot find the game log directory; pass --log-dir or --auth-url");
            String::new()
        }
    }
}

/// Search the log directory for an authorization URL.
///
/// Returns an empty string when nothing is found; every miss is logged.
pub fn locate_auth_url(log_dir: &Path, config: &LocatorConfig) -> String {
    let log_path = log_dir.join(&config.log_file);
    let log = match fs::read(&log_path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            warn!(path = %log_path.display(), error = %e, "cannot read game log");
            return String::new();
        }
    };

    match find_data_dir(&log, &config.data_dir_marker) {
        Some(data_dir) => {
            let cache_path = Path::new(&data_dir).join(&config.cache_file);
            match fs::read(&cache_path) {
                Ok(cache) => {
                    if let Some(url) = find_cache_url(&cache, &config.region_marker) {
                        info!(path = %cache_path.display(), "found authorization URL in web cache");
                        return url;
                    }
                    warn!(path = %cache_path.display(), "no authorization URL in web cache");
                }
                Err(e) => warn!(path = %cache_path.display(), error = %e, "cannot read web cache"),
            }
        }
        None => info!(path = %log_path.display(), "no data directory in log, trying legacy format"),
    }

    if let Some(url) = find_legacy_url(&log, &config.legacy_url_prefix) {
        info!(path = %log_path.display(), "found authorization URL in game log");
        return url;
    }

    warn!("no authorization URL found");
    String::new()
}

/// The data directory named on the last "Warmup file" line.
pub fn find_data_dir(log: &str, marker: &str) -> Option<String> {
    let re = Regex::new(&format!(r"Warmup file (.+?{})", regex::escape(marker))).ok()?;
    re.captures_iter(log).last().map(|c| c[1].to_string())
}

/// The last URL in the cache blob that ends with `marker`.
///
/// The cache is binary, so matching runs on bytes and a URL may only
/// contain printable ASCII.
pub fn find_cache_url(cache: &[u8], marker: &str) -> Option<String> {
    let re = BytesRegex::new(&format!(r"https://[!-~]+?{}", regex::escape(marker))).ok()?;
    re.find_iter(cache)
        .last()
        .map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
}

/// The last full URL with `prefix` written directly into the log.
pub fn find_legacy_url(log: &str, prefix: &str) -> Option<String> {
    let re = Regex::new(&format!(r"{}\S*", regex::escape(prefix))).ok()?;
    re.find_iter(log).last().map(|m| m.as_str().to_string())
}
