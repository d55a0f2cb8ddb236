//! Spreadsheet report: one sheet per pool, draws in chronological order.

#[cfg(feature = "xlsx")]
use std::path::Path;

use gachalog_core::tally;
#[cfg(feature = "xlsx")]
use rust_xlsxwriter::{Format, Workbook};
#[cfg(feature = "xlsx")]
use tracing::info;

use crate::PoolLog;
#[cfg(feature = "xlsx")]
use crate::StoreError;

/// Column titles: time, name, category, rarity, total draws, draws since
/// the last highest-tier item.
pub const HEADERS: [&str; 6] = ["时间", "名称", "类别", "星级", "总次数", "保底内"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Count(u32),
}

/// In-memory layout of one worksheet. `rows[0]` is the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetModel {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl SheetModel {
    /// Data rows, without the header.
    pub fn records(&self) -> &[Vec<Cell>] {
        &self.rows[1..]
    }
}

/// Lay out one sheet per pool, in the order given.
///
/// Pools with no data still get a sheet with just the header row.
pub fn build_sheets(pools: &[PoolLog], top_rank: &str) -> Vec<SheetModel> {
    pools
        .iter()
        .map(|pool| {
            let records = pool.records.as_deref().unwrap_or_default();
            let mut rows = Vec::with_capacity(records.len() + 1);
            rows.push(HEADERS.iter().map(|h| Cell::Text(h.to_string())).collect());

            for row in tally(records, top_rank) {
                let r = row.record;
                rows.push(vec![
                    Cell::Text(r.time.clone()),
                    Cell::Text(r.name.clone()),
                    Cell::Text(r.item_type.clone()),
                    Cell::Text(r.rank_type.clone()),
                    Cell::Count(row.total),
                    Cell::Count(row.pity),
                ]);
            }

            SheetModel {
                name: pool.name.clone(),
                rows,
            }
        })
        .collect()
}

/// Write the sheets to a fresh workbook at `path`, replacing any existing file.
#[cfg(feature = "xlsx")]
pub fn write_report(path: &Path, sheets: &[SheetModel]) -> Result<(), StoreError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let last = sheets.len().saturating_sub(1);

    for (idx, model) in sheets.iter().enumerate() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(&model.name)?;

        for (r, row) in model.rows.iter().enumerate() {
            let r = r as u32;
            for (c, cell) in row.iter().enumerate() {
                let c = c as u16;
                match cell {
                    Cell::Text(s) if r == 0 => sheet.write_string_with_format(r, c, s, &bold)?,
                    Cell::Text(s) => sheet.write_string(r, c, s)?,
                    Cell::Count(n) => sheet.write_number(r, c, *n)?,
                };
            }
        }

        if idx == last {
            sheet.set_active(true);
        }
    }

    workbook.save(path)?;
    info!(path = %path.display(), sheets = sheets.len(), "wrote report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[cfg(feature = "xlsx")]
    use calamine::{Data, Reader, Xlsx, open_workbook};
    use gachalog_core::DrawRecord;

    fn record(id: &str, rank: &str) -> DrawRecord {
        DrawRecord {
            time: format!("2021-03-01 12:00:{id:0>2}"),
            name: format!("item-{id}"),
            item_type: "武器".into(),
            rank_type: rank.into(),
            id: id.into(),
            extra: BTreeMap::new(),
        }
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn rows_are_chronological_with_counters() {
        // Newest first, as the endpoint returns them.
        let pools = vec![PoolLog {
            name: "TestPool".into(),
            records: Some(vec![record("2", "3"), record("1", "1")]),
        }];

        let sheets = build_sheets(&pools, "3");

        assert_eq!(sheets.len(), 1);
        let sheet = &sheets[0];
        assert_eq!(sheet.name, "TestPool");
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0], HEADERS.map(text).to_vec());
        assert_eq!(
            sheet.rows[1],
            [
                text("2021-03-01 12:00:01"),
                text("item-1"),
                text("武器"),
                text("1"),
                Cell::Count(0),
                Cell::Count(0)
            ]
        );
        assert_eq!(sheet.rows[2][0], text("2021-03-01 12:00:02"));
        assert_eq!(sheet.rows[2][4], Cell::Count(1));
        assert_eq!(sheet.rows[2][5], Cell::Count(1));
    }

    #[test]
    fn pity_column_resets_after_top_rank() {
        let pools = vec![PoolLog {
            name: "p".into(),
            records: Some(vec![
                record("4", "1"),
                record("3", "1"),
                record("2", "3"),
                record("1", "1"),
            ]),
        }];
        let sheet = &build_sheets(&pools, "3")[0];
        let pity: Vec<&Cell> = sheet.records().iter().map(|row| &row[5]).collect();
        assert_eq!(
            pity,
            [&Cell::Count(0), &Cell::Count(1), &Cell::Count(0), &Cell::Count(1)]
        );
    }

    #[test]
    fn pools_without_data_get_header_only() {
        let pools = vec![
            PoolLog {
                name: "新手祈愿".into(),
                records: None,
            },
            PoolLog {
                name: "常驻祈愿".into(),
                records: Some(Vec::new()),
            },
        ];
        let sheets = build_sheets(&pools, "3");
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name, "新手祈愿");
        assert_eq!(sheets[0].rows.len(), 1);
        assert!(sheets[1].records().is_empty());
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn writes_workbook_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("data.xlsx");
        let pools = vec![
            PoolLog {
                name: "角色活动祈愿".into(),
                records: Some(vec![record("2", "3"), record("1", "1")]),
            },
            PoolLog {
                name: "武器活动祈愿".into(),
                records: None,
            },
        ];

        write_report(&path, &build_sheets(&pools, "3")).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), ["角色活动祈愿", "武器活动祈愿"]);

        let range = workbook.worksheet_range("角色活动祈愿").unwrap();
        assert_eq!(range.start(), Some((0, 0)));
        assert_eq!(range.end(), Some((2, 5)));
        let row = |r: u32| -> Vec<Data> { (0..6).filter_map(|c| range.get_value((r, c)).cloned()).collect() };
        let s = |v: &str| Data::String(v.into());
        assert_eq!(row(0), HEADERS.map(s));
        assert_eq!(
            row(1),
            [s("2021-03-01 12:00:01"), s("item-1"), s("武器"), s("1"), Data::Float(0.0), Data::Float(0.0)]
        );
        assert_eq!(
            row(2),
            [s("2021-03-01 12:00:02"), s("item-2"), s("武器"), s("3"), Data::Float(1.0), Data::Float(1.0)]
        );

        let empty = workbook.worksheet_range("武器活动祈愿").unwrap();
        assert_eq!(empty.height(), 1);
        assert_eq!(empty.get_value((0, 3)), Some(&s("星级")));
    }

    #[cfg(feature = "xlsx")]
    #[test]
    fn rejects_invalid_sheet_names() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sheets = build_sheets(
            &[PoolLog {
                name: "bad[name]".into(),
                records: None,
            }],
            "3",
        );
        let err = write_report(&tmp.path().join("data.xlsx"), &sheets).unwrap_err();
        assert!(matches!(err, StoreError::Xlsx(_)));
    }
}
