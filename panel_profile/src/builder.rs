pub use crate::config::*;

use crate::{aggregate_observations, Aggregation};

/// A builder for collecting the observations of one panel for one month.
///
/// ```
/// use panel_profile::builder::Builder;
/// use panel_profile::{Dimension, ProfileError};
///
/// let mut builder = Builder::new("DS", "2025-06")?;
/// builder.add_observation(Dimension::Gender, Some("Male"), 120);
/// builder.add_observation(Dimension::Gender, Some("Female"), 130);
///
/// let agg = builder.build()?;
/// assert_eq!(agg.row.total(), 250);
/// # Ok::<(), ProfileError>(())
/// ```
pub struct Builder {
    pub(crate) _panel: Panel,
    pub(crate) _month: Month,
    pub(crate) _observations: Vec<(Dimension, Observation)>,
}

impl Builder {
    /// Validates the panel identifier and the month.
    pub fn new(panel: &str, month: &str) -> Result<Builder, ProfileError> {
        Ok(Builder::with_key(Panel::parse(panel)?, Month::parse(month)?))
    }

    pub fn with_key(panel: Panel, month: Month) -> Builder {
        Builder {
            _panel: panel,
            _month: month,
            _observations: Vec::new(),
        }
    }

    /// Adds one respondent: one observation of weight 1 per dimension.
    pub fn add_respondent(&mut self, respondent: &RespondentRecord) {
        for d in Dimension::ALL {
            self.add_observation(d, respondent.value(d), 1);
        }
    }

    /// Adds a raw answer with the number of respondents who gave it.
    pub fn add_observation(&mut self, dimension: Dimension, raw: Option<&str>, count: u64) {
        self._observations.push((
            dimension,
            Observation {
                raw: raw.map(|s| s.to_string()),
                count,
            },
        ));
    }

    pub fn len(&self) -> usize {
        self._observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self._observations.is_empty()
    }

    /// Classifies and counts the observations collected so far.
    pub fn build(&self) -> Result<Aggregation, ProfileError> {
        aggregate_observations(self._panel, self._month, &self._observations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_key() {
        assert_eq!(
            Builder::new("XX", "2025-06").err(),
            Some(ProfileError::InvalidPanel("XX".to_string()))
        );
        assert!(matches!(
            Builder::new("MS", "2025-06-15"),
            Err(ProfileError::InvalidMonth(_))
        ));
    }

    #[test]
    fn respondents_and_observations_mix() {
        let mut b = Builder::new("ms", "202506").unwrap();
        b.add_respondent(&RespondentRecord {
            gender: Some("ชาย".to_string()),
            cars_at_home: Some("1".to_string()),
            ..RespondentRecord::default()
        });
        b.add_observation(Dimension::Gender, Some("หญิง"), 2);
        assert_eq!(b.len(), Dimension::ALL.len() + 1);
        let agg = b.build().unwrap();
        assert_eq!(agg.row.total(), 3);
        assert_eq!(agg.row.get("Gender_Male_Count"), Some(1));
        assert_eq!(agg.row.get("Cars_At_Home_1_Count"), Some(1));
        assert_eq!(agg.row.month, Month::new(2025, 6).unwrap());
    }
}
