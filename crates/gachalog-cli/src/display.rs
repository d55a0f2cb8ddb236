//! End-of-run summary cards, one per pool.

use gachalog_core::summarize;
use gachalog_store::PoolLog;

pub fn print_summary(logs: &[PoolLog], top_rank: &str) {
    println!();
    for log in logs {
        print_pool_card(log, top_rank);
    }
}

fn print_pool_card(log: &PoolLog, top_rank: &str) {
    println!("=== {} ===", log.name);
    let Some(records) = log.records.as_deref() else {
        println!("  (no data)");
        println!();
        return;
    };

    let summary = summarize(records, top_rank);
    println!("  {:<16} {}", "draws", summary.draws);
    println!("  {:<16} {}", "pity", summary.pity);
    match summary.last_top {
        Some(r) => println!("  {:<16} {} ({})", "last top-tier", r.name, r.time),
        None => println!("  {:<16} -", "last top-tier"),
    }
    if let Some(latest) = records.first() {
        println!("  {:<16} {}", "latest draw", latest.time);
    }
    println!();
}

/// Pools that could not be fetched this run.
pub fn print_failures(failed: &[(String, String)]) {
    if failed.is_empty() {
        return;
    }
    eprintln!("Some pools were not refreshed:");
    for (pool, error) in failed {
        eprintln!("  {pool}: {error}");
    }
}
