//! The run itself: enumerate pools → fetch each → persist → reload → report.

use std::path::PathBuf;

use anyhow::Context;
use gachalog_core::{GachaConfig, PoolDescriptor, merge_history};
use gachalog_store::{JsonStore, PoolLog, build_sheets, write_report};
use gachalog_sync::{AuthorizedQuery, GachaClient};
use tracing::warn;

pub struct RunOptions {
    pub auth_url: String,
    /// Skip the API and rebuild the report from saved logs.
    pub offline: bool,
    /// Log a failed pool and carry on instead of aborting the run.
    pub keep_going: bool,
}

pub struct RunSummary {
    pub fetched: Vec<String>,
    /// Pool name and the error that stopped it.
    pub failed: Vec<(String, String)>,
    pub logs: Vec<PoolLog>,
    pub report: PathBuf,
}

pub async fn run(config: &GachaConfig, opts: &RunOptions) -> anyhow::Result<RunSummary> {
    let store = JsonStore::new(config.store.clone());
    let mut fetched = Vec::new();
    let mut failed = Vec::new();

    let names = if opts.offline {
        config.pools.clone()
    } else {
        let pools = fetch_all(config, &store, opts, &mut fetched, &mut failed).await?;
        if pools.is_empty() {
            warn!("no pools enumerated, falling back to the default pool list");
            config.pools.clone()
        } else {
            pools.into_iter().map(|p| p.name).collect()
        }
    };

    let logs = store.load_pools(&names);
    let sheets = build_sheets(&logs, &config.top_rank);
    let report = config.store.report_path();
    write_report(&report, &sheets).with_context(|| format!("writing {}", report.display()))?;
    println!("Report written to {}", report.display());

    Ok(RunSummary {
        fetched,
        failed,
        logs,
        report,
    })
}

async fn fetch_all(
    config: &GachaConfig,
    store: &JsonStore,
    opts: &RunOptions,
    fetched: &mut Vec<String>,
    failed: &mut Vec<(String, String)>,
) -> anyhow::Result<Vec<PoolDescriptor>> {
    let client = GachaClient::new(&config.api);
    let query = match AuthorizedQuery::parse(&opts.auth_url) {
        Ok(query) => query,
        Err(e) => {
            warn!(error = %e, "unusable authorization URL, continuing without it");
            AuthorizedQuery::default()
        }
    };
    if query.is_empty() {
        warn!("authorization URL is empty; the API will reject every request");
    }

    let pools = client
        .pool_types(&query)
        .await
        .context("fetching pool types")?;

    for pool in &pools {
        println!("Start fetching pool {}", pool.name);
        match refresh_pool(config, store, &client, &query, pool).await {
            Ok(saved) => {
                if let Some(path) = saved {
                    println!("Data stored in {}", path.display());
                }
                fetched.push(pool.name.clone());
            }
            Err(e) if opts.keep_going => {
                let reason = format!("{e:#}");
                warn!(pool = %pool.name, error = %reason, "pool failed, keeping the saved log");
                failed.push((pool.name.clone(), reason));
            }
            Err(e) => return Err(e).with_context(|| format!("refreshing pool {}", pool.name)),
        }
    }
    println!("End fetching");

    Ok(pools)
}

/// Fetch one pool, merge if asked, and persist. Nothing is written on error.
async fn refresh_pool(
    config: &GachaConfig,
    store: &JsonStore,
    client: &GachaClient,
    query: &AuthorizedQuery,
    pool: &PoolDescriptor,
) -> anyhow::Result<Option<PathBuf>> {
    let records = client
        .fetch_history(query, &pool.key, |page| println!("\tFetching page {page}"))
        .await
        .context("fetching history")?;

    let records = if config.merge {
        match store.load_existing(&pool.name).context("reading saved log to merge")? {
            Some(existing) => merge_history(records, existing),
            None => records,
        }
    } else {
        records
    };

    store.save_pool(&pool.name, &records).context("saving log")
}
