//! Shared configuration, passed explicitly to each component.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::record::FieldPolicy;

pub const DEFAULT_CONFIG_API: &str =
    "https://hk4e-api.mihoyo.com/event/gacha_info/api/getConfigList";
pub const DEFAULT_LOG_API: &str = "https://hk4e-api.mihoyo.com/event/gacha_info/api/getGachaLog";

/// The endpoint caps pages at 20 records.
pub const PAGE_SIZE: u32 = 20;
pub const REQUEST_DELAY: Duration = Duration::from_millis(500);

/// Pool names used when the config endpoint gives us nothing.
pub const DEFAULT_POOLS: &[&str] = &["常驻祈愿", "新手祈愿", "武器活动祈愿", "角色活动祈愿"];

/// `rank_type` value that resets the pity counter.
pub const TOP_RANK: &str = "3";

#[derive(Debug, Clone)]
pub struct GachaConfig {
    pub api: ApiConfig,
    pub store: StoreConfig,
    pub locator: LocatorConfig,
    /// Pools to load when enumeration is skipped or comes back empty.
    pub pools: Vec<String>,
    pub top_rank: String,
    /// Union each fetch with what is already on disk instead of overwriting.
    pub merge: bool,
}

impl Default for GachaConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            store: StoreConfig::default(),
            locator: LocatorConfig::default(),
            pools: DEFAULT_POOLS.iter().map(|s| s.to_string()).collect(),
            top_rank: TOP_RANK.to_string(),
            merge: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub config_url: String,
    pub log_url: String,
    pub page_size: u32,
    pub request_delay: Duration,
    pub field_policy: FieldPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            config_url: DEFAULT_CONFIG_API.to_string(),
            log_url: DEFAULT_LOG_API.to_string(),
            page_size: PAGE_SIZE,
            request_delay: REQUEST_DELAY,
            field_policy: FieldPolicy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub out_dir: PathBuf,
    pub file_prefix: String,
    pub report_file: String,
    pub field_policy: FieldPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
            file_prefix: "GachaLog".to_string(),
            report_file: "data.xlsx".to_string(),
            field_policy: FieldPolicy::default(),
        }
    }
}

impl StoreConfig {
    /// `<out_dir>/GachaLog<pool>.json`
    pub fn pool_path(&self, pool: &str) -> PathBuf {
        self.out_dir.join(format!("{}{}.json", self.file_prefix, pool))
    }

    pub fn report_path(&self) -> PathBuf {
        self.out_dir.join(&self.report_file)
    }
}

/// Where the game client leaves its authorization URL.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
    pub log_file: String,
    /// Relative to the game data directory.
    pub cache_file: PathBuf,
    /// Suffix of the data directory named on the log's "Warmup file" lines.
    pub data_dir_marker: String,
    /// Query fragment that ends an authorization URL in the web cache.
    pub region_marker: String,
    /// Prefix of the URL older clients wrote straight into the log.
    pub legacy_url_prefix: String,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            log_file: "output_log.txt".to_string(),
            cache_file: Path::new("webCaches")
                .join("Cache")
                .join("Cache_Data")
                .join("data_2"),
            data_dir_marker: "YuanShen_Data".to_string(),
            region_marker: "game_biz=hk4e_cn".to_string(),
            legacy_url_prefix: "https://webstatic.mihoyo.com/".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_vendor_contract() {
        let cfg = GachaConfig::default();
        assert_eq!(cfg.api.page_size, 20);
        assert_eq!(cfg.api.request_delay, Duration::from_millis(500));
        assert_eq!(cfg.pools.len(), 4);
        assert_eq!(cfg.top_rank, "3");
        assert!(!cfg.merge);
    }

    #[test]
    fn pool_files_are_prefixed() {
        let store = StoreConfig {
            out_dir: PathBuf::from("out"),
            ..StoreConfig::default()
        };
        assert_eq!(
            store.pool_path("角色活动祈愿"),
            Path::new("out").join("GachaLog角色活动祈愿.json")
        );
        assert_eq!(store.report_path(), Path::new("out").join("data.xlsx"));
    }
}
