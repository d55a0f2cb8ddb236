use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use gachalog_core::config::{DEFAULT_CONFIG_API, DEFAULT_LOG_API};
use gachalog_core::{FieldPolicy, GachaConfig};

mod display;
mod locate;
mod pipeline;

/// Export gacha draw history to per-pool JSON logs and a spreadsheet.
#[derive(Parser, Debug)]
#[command(name = "gachalog", version, about)]
struct Cli {
    /// Directory holding the game client's output_log.txt.
    #[arg(long, env = "GACHALOG_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Use this authorization URL instead of searching the game logs.
    #[arg(long, env = "GACHALOG_AUTH_URL")]
    auth_url: Option<String>,

    /// Where the JSON logs and data.xlsx are written.
    #[arg(short, long, env = "GACHALOG_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Merge fetched records into the saved logs instead of replacing them.
    #[arg(long)]
    merge: bool,

    /// Rebuild the report from saved logs without calling the API.
    #[arg(long, conflicts_with = "auth_url")]
    offline: bool,

    /// Keep fetching the remaining pools when one fails.
    #[arg(long)]
    keep_going: bool,

    /// What to do with non-string fields in draw records.
    #[arg(long, value_enum, default_value = "coerce")]
    field_policy: Policy,

    #[arg(long, env = "GACHALOG_CONFIG_API", default_value = DEFAULT_CONFIG_API, hide = true)]
    config_api: String,

    #[arg(long, env = "GACHALOG_LOG_API", default_value = DEFAULT_LOG_API, hide = true)]
    log_api: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Policy {
    Coerce,
    Strict,
}

impl From<Policy> for FieldPolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::Coerce => FieldPolicy::Coerce,
            Policy::Strict => FieldPolicy::Strict,
        }
    }
}

impl Cli {
    fn config(&self) -> GachaConfig {
        let mut config = GachaConfig::default();
        config.api.config_url = self.config_api.clone();
        config.api.log_url = self.log_api.clone();
        config.api.field_policy = self.field_policy.into();
        config.store.out_dir = self.out_dir.clone();
        config.store.field_policy = self.field_policy.into();
        config.merge = self.merge;
        config
    }

    fn auth_url(&self, config: &GachaConfig) -> String {
        if self.offline {
            return String::new();
        }
        match &self.auth_url {
            Some(url) => url.clone(),
            None => locate::locate_in(
                self.log_dir.clone().or_else(locate::default_log_dir),
                &config.locator,
            ),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    tracing::info!("gachalog v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = cli.config();
    let opts = pipeline::RunOptions {
        auth_url: cli.auth_url(&config),
        offline: cli.offline,
        keep_going: cli.keep_going,
    };

    let summary = pipeline::run(&config, &opts).await?;
    display::print_summary(&summary.logs, &config.top_rank);
    display::print_failures(&summary.failed);
    tracing::info!(
        fetched = summary.fetched.len(),
        failed = summary.failed.len(),
        report = %summary.report.display(),
        "done"
    );
    Ok(())
}
