//! Merging a month of new rows into the cumulative summary table.

use std::collections::HashSet;

use log::{debug, info, warn};

use crate::config::*;
use crate::schema::SummaryRow;

/// The cumulative summary table: at most one row per (panel, month).
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SummaryTable {
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn new() -> SummaryTable {
        SummaryTable { rows: Vec::new() }
    }

    /// Builds a table, rejecting duplicate (panel, month) keys.
    pub fn from_rows(rows: Vec<SummaryRow>) -> Result<SummaryTable, ProfileError> {
        check_unique(&rows)?;
        Ok(SummaryTable { rows })
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, panel: Panel, month: Month) -> Option<&SummaryRow> {
        self.rows.iter().find(|r| r.key() == (panel, month))
    }

    /// The months present in the table, sorted.
    pub fn months(&self) -> Vec<Month> {
        let mut res: Vec<Month> = self.rows.iter().map(|r| r.month).collect();
        res.sort();
        res.dedup();
        res
    }

    pub fn latest_month(&self) -> Option<Month> {
        self.rows.iter().map(|r| r.month).max()
    }
}

fn check_unique(rows: &[SummaryRow]) -> Result<(), ProfileError> {
    let mut seen: HashSet<(Panel, Month)> = HashSet::new();
    for r in rows.iter() {
        if !seen.insert(r.key()) {
            return Err(ProfileError::DuplicateKey {
                panel: r.panel,
                month: r.month,
            });
        }
    }
    Ok(())
}

/// Merges the rows of a month into the summary table.
///
/// Arguments:
/// * `existing` the current table, if any. A missing table is treated as empty.
/// * `month` the month being loaded. Every row of the batch must belong to it.
/// * `batch` the new rows, at most one per panel
/// * `policy` which existing rows of the month are replaced
///
/// The rows that survive keep their order, and the batch is appended after them.
/// Rows of other months are never touched, so merging the same batch twice gives
/// the same table.
pub fn merge(
    existing: Option<SummaryTable>,
    month: Month,
    batch: Vec<SummaryRow>,
    policy: MergePolicy,
) -> Result<SummaryTable, ProfileError> {
    if batch.is_empty() {
        return Err(ProfileError::EmptyBatch);
    }
    if let Some(r) = batch.iter().find(|r| r.month != month) {
        return Err(ProfileError::BatchMonthMismatch {
            expected: month,
            found: r.month,
        });
    }
    check_unique(&batch)?;

    let existing_rows = match existing {
        Some(t) => t.rows,
        None => {
            info!("merge: no existing summary, creating a new one");
            Vec::new()
        }
    };
    let new_panels: HashSet<Panel> = batch.iter().map(|r| r.panel).collect();

    let mut rows: Vec<SummaryRow> = Vec::with_capacity(existing_rows.len() + batch.len());
    let mut replaced = 0;
    for r in existing_rows.into_iter() {
        let drop = match policy {
            MergePolicy::ReplaceMonth => r.month == month,
            MergePolicy::ReplacePanelMonth => r.month == month && new_panels.contains(&r.panel),
        };
        if drop {
            if !new_panels.contains(&r.panel) {
                warn!(
                    "merge: row of panel {} for {} is dropped and not replaced by this batch",
                    r.panel, month
                );
            }
            debug!("merge: replacing row {:?}", r.key());
            replaced += 1;
        } else {
            rows.push(r);
        }
    }
    info!(
        "merge: month {}: {} existing rows replaced, {} new rows",
        month,
        replaced,
        batch.len()
    );
    rows.extend(batch);
    SummaryTable::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(m: u32) -> Month {
        Month::new(2025, m).unwrap()
    }

    fn row(panel: Panel, m: u32, total: u64) -> SummaryRow {
        let mut r = SummaryRow::zeroed(panel, month(m));
        r.set("Total_Respondents_Count", total);
        r
    }

    fn keys(t: &SummaryTable) -> Vec<(Panel, Month, u64)> {
        t.rows().iter().map(|r| (r.panel, r.month, r.total())).collect()
    }

    #[test]
    fn replaces_whole_month() {
        let existing = SummaryTable::from_rows(vec![
            row(Panel::Ds, 5, 10),
            row(Panel::Ms, 5, 20),
            row(Panel::Ds, 6, 30),
            row(Panel::Ms, 6, 40),
        ])
        .unwrap();
        let res = merge(
            Some(existing),
            month(6),
            vec![row(Panel::Ms, 6, 41)],
            MergePolicy::ReplaceMonth,
        )
        .unwrap();
        assert_eq!(
            keys(&res),
            vec![
                (Panel::Ds, month(5), 10),
                (Panel::Ms, month(5), 20),
                (Panel::Ms, month(6), 41),
            ]
        );
    }

    #[test]
    fn replaces_panel_month_only() {
        let existing = SummaryTable::from_rows(vec![
            row(Panel::Ds, 6, 30),
            row(Panel::Ms, 6, 40),
        ])
        .unwrap();
        let res = merge(
            Some(existing),
            month(6),
            vec![row(Panel::Ms, 6, 41)],
            MergePolicy::ReplacePanelMonth,
        )
        .unwrap();
        assert_eq!(
            keys(&res),
            vec![(Panel::Ds, month(6), 30), (Panel::Ms, month(6), 41)]
        );
    }

    #[test]
    fn creates_missing_table() {
        let res = merge(
            None,
            month(6),
            vec![row(Panel::Ds, 6, 1), row(Panel::Ms, 6, 2)],
            MergePolicy::DEFAULT,
        )
        .unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res.latest_month(), Some(month(6)));
    }

    #[test]
    fn merging_twice_is_stable() {
        let batch = vec![row(Panel::Ds, 6, 1), row(Panel::Ms, 6, 2)];
        let existing = SummaryTable::from_rows(vec![row(Panel::Ds, 5, 9)]).unwrap();
        for policy in [MergePolicy::ReplaceMonth, MergePolicy::ReplacePanelMonth] {
            let once = merge(Some(existing.clone()), month(6), batch.clone(), policy).unwrap();
            let twice = merge(Some(once.clone()), month(6), batch.clone(), policy).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn rejects_bad_batches() {
        assert_eq!(
            merge(None, month(6), vec![], MergePolicy::DEFAULT),
            Err(ProfileError::EmptyBatch)
        );
        assert_eq!(
            merge(None, month(6), vec![row(Panel::Ds, 7, 1)], MergePolicy::DEFAULT),
            Err(ProfileError::BatchMonthMismatch {
                expected: month(6),
                found: month(7)
            })
        );
        assert_eq!(
            merge(
                None,
                month(6),
                vec![row(Panel::Ds, 6, 1), row(Panel::Ds, 6, 2)],
                MergePolicy::DEFAULT
            ),
            Err(ProfileError::DuplicateKey {
                panel: Panel::Ds,
                month: month(6)
            })
        );
    }

    #[test]
    fn table_rejects_duplicates() {
        assert!(SummaryTable::from_rows(vec![row(Panel::Ds, 6, 1), row(Panel::Ds, 6, 1)]).is_err());
        let t = SummaryTable::from_rows(vec![row(Panel::Ms, 6, 1), row(Panel::Ds, 4, 1)]).unwrap();
        assert_eq!(t.months(), vec![month(4), month(6)]);
        assert!(t.get(Panel::Ds, month(4)).is_some());
        assert!(t.get(Panel::Ds, month(6)).is_none());
    }
}
