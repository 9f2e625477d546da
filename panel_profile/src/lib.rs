mod config;
use log::{debug, info, warn};

use std::collections::{BTreeMap, HashMap};

pub use crate::config::*;

pub mod builder;
pub mod manual;
pub mod mapping;
pub mod merge;
pub mod report;
pub mod schema;

pub use crate::merge::{merge, SummaryTable};
pub use crate::schema::SummaryRow;

use crate::mapping::Classifier;

/// The summary row of one panel for one month, with the data quality statistics
/// gathered while building it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Aggregation {
    pub row: SummaryRow,
    pub quality: QualityReport,
}

// Running totals of a single dimension.
#[derive(Default)]
struct DimensionTally {
    counts: BTreeMap<Category, u64>,
    classified: u64,
    excluded: u64,
    unmapped: HashMap<String, u64>,
}

/// Aggregates per-respondent records.
///
/// Each record contributes one observation with a weight of 1 to each dimension.
pub fn aggregate(
    panel: Panel,
    month: Month,
    respondents: &[RespondentRecord],
) -> Result<Aggregation, ProfileError> {
    info!(
        "aggregate: panel {} month {}: {} respondents",
        panel,
        month,
        respondents.len()
    );
    let observations: Vec<(Dimension, Observation)> = respondents
        .iter()
        .flat_map(|r| {
            Dimension::ALL.iter().map(move |d| {
                (
                    *d,
                    Observation {
                        raw: r.value(*d).map(|s| s.to_string()),
                        count: 1,
                    },
                )
            })
        })
        .collect();
    aggregate_observations(panel, month, &observations)
}

/// Aggregates weighted observations into one summary row.
///
/// Arguments:
/// * `panel` and `month` the key of the row
/// * `observations` raw answers per dimension, each with the number of
/// respondents who gave it. The observations of a dimension do not need to be
/// grouped or unique.
///
/// Fails with [`ProfileError::CountOverflow`] when the weights of a dimension do
/// not fit in a `u64`.
///
/// The total of the row is the weight of all the gender observations. The
/// observations that fall in a category without a column are not counted in the
/// dimension, so the columns of a dimension may add up to less than the total.
pub fn aggregate_observations(
    panel: Panel,
    month: Month,
    observations: &DimensionObservations,
) -> Result<Aggregation, ProfileError> {
    let classifier = Classifier::new(panel);
    let mut tallies: BTreeMap<Dimension, DimensionTally> = Dimension::ALL
        .iter()
        .map(|d| (*d, DimensionTally::default()))
        .collect();
    let mut total: u64 = 0;

    for (dimension, obs) in observations.iter() {
        if obs.count == 0 {
            continue;
        }
        let add = |acc: &mut u64| -> Result<(), ProfileError> {
            *acc = acc
                .checked_add(obs.count)
                .ok_or(ProfileError::CountOverflow {
                    panel,
                    dimension: *dimension,
                })?;
            Ok(())
        };
        if *dimension == Dimension::Gender {
            add(&mut total)?;
        }
        let c = classifier.classify(*dimension, obs.raw.as_deref());
        let tally = tallies.entry(*dimension).or_default();
        if !c.matched {
            let key = obs.raw.clone().unwrap_or_default();
            add(tally.unmapped.entry(key).or_insert(0))?;
        }
        if c.tag.suffix().is_some() {
            add(&mut tally.classified)?;
        } else {
            add(&mut tally.excluded)?;
        }
        add(tally.counts.entry(c.tag).or_insert(0))?;
    }

    let mut pairs: Vec<(String, u64)> = vec![(schema::TOTAL_COLUMN.to_string(), total)];
    let mut quality = QualityReport::default();
    for (dimension, tally) in tallies.into_iter() {
        for (category, count) in tally.counts.iter() {
            if let Some(col) = schema::category_column(dimension, *category) {
                pairs.push((col, *count));
            }
        }
        let mut unmapped: Vec<(String, u64)> = tally.unmapped.into_iter().collect();
        unmapped.sort_by(|(n1, c1), (n2, c2)| c2.cmp(c1).then_with(|| n1.cmp(n2)));
        for (value, count) in unmapped.iter() {
            warn!(
                "aggregate: panel {} {}: value {:?} ({} respondents) is not mapped, counted as {}",
                panel,
                dimension,
                value,
                count,
                dimension.sink().label()
            );
        }
        debug!(
            "aggregate: {}: classified {} excluded {} counts {:?}",
            dimension, tally.classified, tally.excluded, tally.counts
        );
        quality.dimensions.push((
            dimension,
            DimensionQuality {
                classified: tally.classified,
                excluded: tally.excluded,
                unmapped,
            },
        ));
    }

    let (row, unknown) = SummaryRow::reindexed(panel, month, pairs);
    // Every produced column comes from the schema.
    debug_assert!(unknown.is_empty(), "columns outside the schema: {:?}", unknown);
    info!(
        "aggregate: panel {} month {}: total {} respondents, {} unmapped",
        panel,
        month,
        row.total(),
        quality.unmapped_total()
    );
    Ok(Aggregation { row, quality })
}
