//! Running draw counters for a pool's history.
//!
//! The endpoint returns records newest-first. The report wants them oldest
//! first, each annotated with two counters:
//!
//! - `total`: draws before this one, so the oldest record is 0.
//! - `pity`: draws since the last highest-tier item. The counter is written
//!   for the current row before it is reset, so a highest-tier draw carries
//!   its own non-zero pity and the row after it reads 0.

use crate::record::DrawRecord;

/// A record in chronological position with its derived counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallyRow<'a> {
    pub record: &'a DrawRecord,
    pub total: u32,
    pub pity: u32,
}

/// Where a pool currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSummary<'a> {
    pub draws: usize,
    /// Pity the next draw would be written with.
    pub pity: u32,
    pub last_top: Option<&'a DrawRecord>,
}

/// Walk a newest-first history oldest to newest, computing counters.
pub fn tally<'a>(newest_first: &'a [DrawRecord], top_rank: &str) -> Vec<TallyRow<'a>> {
    let mut rows = Vec::with_capacity(newest_first.len());
    let mut total = 0;
    let mut pity = 0;

    for record in newest_first.iter().rev() {
        rows.push(TallyRow {
            record,
            total,
            pity,
        });
        total += 1;
        pity += 1;
        if record.is_rank(top_rank) {
            pity = 0;
        }
    }
    rows
}

pub fn summarize<'a>(newest_first: &'a [DrawRecord], top_rank: &str) -> PoolSummary<'a> {
    let last_top = newest_first.iter().find(|r| r.is_rank(top_rank));
    let pity = match newest_first.iter().position(|r| r.is_rank(top_rank)) {
        Some(idx) => idx as u32,
        None => newest_first.len() as u32,
    };
    PoolSummary {
        draws: newest_first.len(),
        pity,
        last_top,
    }
}
