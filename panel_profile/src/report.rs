/*!
Calculations for the reporting views.

Everything here is derived from a loaded [`SummaryTable`] each time it is
requested. None of it is stored in the summary file.
*/

use log::debug;

use crate::config::*;
use crate::merge::SummaryTable;
use crate::schema::SummaryRow;

/// The composite figures displayed for each summary row.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct DerivedMetrics {
    /// Total respondents.
    pub overall: u64,
    /// Respondents aged 60 and over.
    pub silver_gen: u64,
    /// Respondents with at least one car at home.
    pub auto: u64,
    /// Upcountry respondents: every known region outside Greater Bangkok.
    pub upc: u64,
}

impl DerivedMetrics {
    pub fn of(row: &SummaryRow) -> DerivedMetrics {
        let silver_gen = row.count_of(Dimension::Age, Category::Age(AgeBand::Age60To69))
            + row.count_of(Dimension::Age, Category::Age(AgeBand::Age70To99));
        let auto = CarsAtHome::ALL
            .iter()
            .filter(|c| c.owns_car())
            .map(|c| row.count_of(Dimension::CarsAtHome, Category::Cars(*c)))
            .sum();
        let upc = Region::ALL
            .iter()
            .filter(|r| r.is_upcountry())
            .map(|r| row.count_of(Dimension::Region, Category::Region(*r)))
            .sum();
        DerivedMetrics {
            overall: row.total(),
            silver_gen,
            auto,
            upc,
        }
    }

    pub fn sum<'a, I: IntoIterator<Item = &'a SummaryRow>>(rows: I) -> DerivedMetrics {
        let mut res = DerivedMetrics::default();
        for r in rows {
            let m = DerivedMetrics::of(r);
            res.overall += m.overall;
            res.silver_gen += m.silver_gen;
            res.auto += m.auto;
            res.upc += m.upc;
        }
        res
    }

    pub fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Overall => self.overall,
            Metric::SilverGen => self.silver_gen,
            Metric::Auto => self.auto,
            Metric::Upc => self.upc,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Metric {
    Overall,
    SilverGen,
    Auto,
    Upc,
}

impl Metric {
    pub const ALL: [Metric; 4] = [Metric::Overall, Metric::SilverGen, Metric::Auto, Metric::Upc];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Overall => "Overall",
            Metric::SilverGen => "Silver Gen",
            Metric::Auto => "Auto",
            Metric::Upc => "UPC",
        }
    }
}

/// Selection of the rows to display.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Filter {
    /// All panels when not set.
    pub panel: Option<Panel>,
    /// The latest month with data when not set.
    pub month: Option<Month>,
}

impl Filter {
    /// The rows of the panel, for the chosen month or for all months.
    pub fn matching<'a>(&self, table: &'a SummaryTable) -> Vec<&'a SummaryRow> {
        table
            .rows()
            .iter()
            .filter(|r| self.panel.map_or(true, |p| r.panel == p))
            .filter(|r| self.month.map_or(true, |m| r.month == m))
            .collect()
    }

    /// The rows of a single month: the chosen one, or the latest among the
    /// rows of the panel.
    pub fn select<'a>(&self, table: &'a SummaryTable) -> Selection<'a> {
        let candidates: Vec<&SummaryRow> = table
            .rows()
            .iter()
            .filter(|r| self.panel.map_or(true, |p| r.panel == p))
            .collect();
        let month = self
            .month
            .or_else(|| candidates.iter().map(|r| r.month).max());
        let rows = match month {
            Some(m) => candidates.into_iter().filter(|r| r.month == m).collect(),
            None => Vec::new(),
        };
        debug!("select: filter {:?} -> month {:?}", self, month);
        Selection { month, rows }
    }
}

/// The rows shown for one month.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    pub month: Option<Month>,
    pub rows: Vec<&'a SummaryRow>,
}

impl<'a> Selection<'a> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Sum of the derived metrics over the selection.
pub fn key_metrics(selection: &Selection) -> DerivedMetrics {
    DerivedMetrics::sum(selection.rows.iter().cloned())
}

/// Metrics of one panel in the selection, if it has data.
pub fn panel_snapshot(selection: &Selection, panel: Panel) -> Option<DerivedMetrics> {
    let rows: Vec<&SummaryRow> = selection
        .rows
        .iter()
        .filter(|r| r.panel == panel)
        .cloned()
        .collect();
    if rows.is_empty() {
        None
    } else {
        Some(DerivedMetrics::sum(rows))
    }
}

/// Metrics of all the panels of the selection together.
pub fn combined(selection: &Selection) -> Option<DerivedMetrics> {
    if selection.is_empty() {
        None
    } else {
        Some(key_metrics(selection))
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum Trend {
    /// Relative increase in percent, unknown when the previous value is 0.
    Increasing(Option<f64>),
    Decreasing(Option<f64>),
    Stable,
}

impl Trend {
    pub fn between(previous: u64, current: u64) -> Trend {
        let pct = |delta: u64| {
            if previous == 0 {
                None
            } else {
                Some(delta as f64 * 100.0 / previous as f64)
            }
        };
        if current > previous {
            Trend::Increasing(pct(current - previous))
        } else if current < previous {
            Trend::Decreasing(pct(previous - current))
        } else {
            Trend::Stable
        }
    }

    pub fn render(&self) -> String {
        match self {
            Trend::Increasing(Some(p)) => format!("📈 (+{:.1}%)", p),
            Trend::Increasing(None) => "📈".to_string(),
            Trend::Decreasing(Some(p)) => format!("📉 (-{:.1}%)", p),
            Trend::Decreasing(None) => "📉".to_string(),
            Trend::Stable => "➡️ (0%)".to_string(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Scope {
    Panel(Panel),
    Combined,
}

impl Scope {
    pub fn label(&self) -> &'static str {
        match self {
            Scope::Panel(p) => p.display_name(),
            Scope::Combined => "Combined",
        }
    }
}

/// One value of the monthly comparison.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct ComparisonCell {
    pub value: Option<u64>,
    /// Against the previous month, when both months have data.
    pub trend: Option<Trend>,
}

impl ComparisonCell {
    pub fn render(&self) -> String {
        match (self.value, self.trend) {
            (None, _) => "-".to_string(),
            (Some(v), None) => format_count(v),
            (Some(v), Some(t)) => format!("{} {}", format_count(v), t.render()),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct MonthlyComparison {
    pub scope: Scope,
    pub year: i32,
    pub months: Vec<Month>,
    /// One row per metric, one cell per month.
    pub rows: Vec<(Metric, Vec<ComparisonCell>)>,
}

/// Compares the metrics month by month over a calendar year.
pub fn monthly_comparison(table: &SummaryTable, scope: Scope, year: i32) -> MonthlyComparison {
    let months = Month::year_months(year);
    let per_month: Vec<Option<DerivedMetrics>> = months
        .iter()
        .map(|m| {
            let rows: Vec<&SummaryRow> = table
                .rows()
                .iter()
                .filter(|r| r.month == *m)
                .filter(|r| match scope {
                    Scope::Panel(p) => r.panel == p,
                    Scope::Combined => true,
                })
                .collect();
            if rows.is_empty() {
                None
            } else {
                Some(DerivedMetrics::sum(rows))
            }
        })
        .collect();

    let rows = Metric::ALL
        .iter()
        .map(|metric| {
            let values: Vec<Option<u64>> = per_month
                .iter()
                .map(|dm| dm.map(|d| d.get(*metric)))
                .collect();
            let cells = values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    let previous = if i == 0 { None } else { values[i - 1] };
                    let trend = match (previous, v) {
                        (Some(p), Some(c)) => Some(Trend::between(p, *c)),
                        _ => None,
                    };
                    ComparisonCell { value: *v, trend }
                })
                .collect();
            (*metric, cells)
        })
        .collect();

    MonthlyComparison {
        scope,
        year,
        months,
        rows,
    }
}

/// Counts of each category of a dimension, per panel, over the selection.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Distribution {
    pub dimension: Dimension,
    /// The categories shown: every category with a column, except the sink.
    pub categories: Vec<Category>,
    /// Per panel present in the selection, one count per category.
    pub panels: Vec<(Panel, Vec<u64>)>,
    /// All panels together.
    pub totals: Vec<u64>,
}

pub fn distribution(selection: &Selection, dimension: Dimension) -> Distribution {
    let categories: Vec<Category> = dimension
        .categories()
        .into_iter()
        .filter(|c| !c.is_sink() && c.suffix().is_some())
        .collect();
    let mut panels: Vec<(Panel, Vec<u64>)> = Vec::new();
    for panel in Panel::ALL {
        let rows: Vec<&&SummaryRow> = selection.rows.iter().filter(|r| r.panel == panel).collect();
        if rows.is_empty() {
            continue;
        }
        let counts = categories
            .iter()
            .map(|c| rows.iter().map(|r| r.count_of(dimension, *c)).sum())
            .collect();
        panels.push((panel, counts));
    }
    let totals = (0..categories.len())
        .map(|i| panels.iter().map(|(_, counts)| counts[i]).sum())
        .collect();
    Distribution {
        dimension,
        categories,
        panels,
        totals,
    }
}

/// The percentage of each count within the counts, all 0 when they add up to 0.
pub fn shares(counts: &[u64]) -> Vec<f64> {
    let total: f64 = counts.iter().map(|c| *c as f64).sum();
    counts
        .iter()
        .map(|c| if total > 0.0 { *c as f64 * 100.0 / total } else { 0.0 })
        .collect()
}

/// Summary figures of the selection. Rates are in percent.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct Highlights {
    pub car_ownership_rate: f64,
    pub households_with_cars: u64,
    pub no_car_households: u64,
    /// Female respondents per 100 male respondents.
    pub female_male_ratio: f64,
    pub silver_gen_rate: f64,
    pub young_adult_rate: f64,
    pub bangkok_rate: f64,
    pub upc_rate: f64,
}

fn rate(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 * 100.0 / den as f64
    }
}

pub fn highlights(selection: &Selection) -> Highlights {
    let metrics = key_metrics(selection);
    let total = metrics.overall;
    let sum_of = |dimension: Dimension, category: Category| -> u64 {
        selection
            .rows
            .iter()
            .map(|r| r.count_of(dimension, category))
            .sum()
    };
    let male = sum_of(Dimension::Gender, Category::Gender(Gender::Male));
    let female = sum_of(Dimension::Gender, Category::Gender(Gender::Female));
    let bangkok = sum_of(
        Dimension::Region,
        Category::Region(Region::BangkokMetropolitan),
    );
    Highlights {
        car_ownership_rate: rate(metrics.auto, total),
        households_with_cars: metrics.auto,
        no_car_households: sum_of(Dimension::CarsAtHome, Category::Cars(CarsAtHome::Zero)),
        female_male_ratio: rate(female, male),
        silver_gen_rate: rate(metrics.silver_gen, total),
        young_adult_rate: rate(
            sum_of(Dimension::Age, Category::Age(AgeBand::Age20To29)),
            total,
        ),
        bangkok_rate: rate(bangkok, total),
        upc_rate: rate(metrics.upc, total),
    }
}

/// Formats a count with thousands separators: `12,345`.
pub fn format_count(v: u64) -> String {
    let digits = v.to_string();
    let mut res = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            res.push(',');
        }
        res.push(c);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(m: u32) -> Month {
        Month::new(2025, m).unwrap()
    }

    fn row(panel: Panel, m: u32, counts: &[(&str, u64)]) -> SummaryRow {
        SummaryRow::reindexed(panel, month(m), counts.iter().cloned()).0
    }

    fn table() -> SummaryTable {
        SummaryTable::from_rows(vec![
            row(
                Panel::Ds,
                5,
                &[
                    ("Total_Respondents_Count", 100),
                    ("Age_60_69_Count", 10),
                    ("Age_70_99_Count", 5),
                    ("Cars_At_Home_0_Count", 40),
                    ("Cars_At_Home_1_Count", 30),
                    ("Cars_At_Home_2_Count", 20),
                    ("Cars_At_Home_3_Or_More_Count", 10),
                    ("Region_Bangkok_Metropolitan_Count", 50),
                    ("Region_North_Count", 20),
                    ("Region_West_Count", 5),
                    ("Region_Unspecified_Count", 25),
                ],
            ),
            row(
                Panel::Ms,
                6,
                &[
                    ("Total_Respondents_Count", 200),
                    ("Gender_Male_Count", 80),
                    ("Gender_Female_Count", 120),
                    ("Age_20_29_Count", 50),
                    ("Cars_At_Home_1_Count", 100),
                    ("Region_Bangkok_Metropolitan_Count", 100),
                    ("Region_South_Count", 100),
                ],
            ),
            row(Panel::Ds, 6, &[("Total_Respondents_Count", 110)]),
        ])
        .unwrap()
    }

    #[test]
    fn derived_metrics() {
        let t = table();
        let m = DerivedMetrics::of(t.get(Panel::Ds, month(5)).unwrap());
        assert_eq!(
            m,
            DerivedMetrics {
                overall: 100,
                silver_gen: 15,
                auto: 60,
                upc: 25,
            }
        );
    }

    #[test]
    fn latest_month_by_default() {
        let t = table();
        let sel = Filter::default().select(&t);
        assert_eq!(sel.month, Some(month(6)));
        assert_eq!(sel.rows.len(), 2);
        assert_eq!(key_metrics(&sel).overall, 310);
        assert_eq!(panel_snapshot(&sel, Panel::Ms).unwrap().upc, 100);
        assert_eq!(combined(&sel).unwrap().overall, 310);

        let ds_may = Filter {
            panel: Some(Panel::Ds),
            month: Some(month(5)),
        }
        .select(&t);
        assert_eq!(ds_may.rows.len(), 1);
        assert_eq!(panel_snapshot(&ds_may, Panel::Ms), None);

        let nothing = Filter {
            panel: None,
            month: Some(month(1)),
        }
        .select(&t);
        assert!(nothing.is_empty());
        assert_eq!(combined(&nothing), None);

        let all_ds = Filter {
            panel: Some(Panel::Ds),
            month: None,
        };
        assert_eq!(all_ds.matching(&t).len(), 2);
    }

    #[test]
    fn trends() {
        assert_eq!(Trend::between(100, 110), Trend::Increasing(Some(10.0)));
        assert_eq!(Trend::between(200, 150), Trend::Decreasing(Some(25.0)));
        assert_eq!(Trend::between(7, 7), Trend::Stable);
        assert_eq!(Trend::between(0, 5), Trend::Increasing(None));
        assert_eq!(Trend::between(100, 110).render(), "📈 (+10.0%)");
        assert_eq!(Trend::Stable.render(), "➡️ (0%)");
    }

    #[test]
    fn monthly_comparison_for_panel() {
        let t = table();
        let c = monthly_comparison(&t, Scope::Panel(Panel::Ds), 2025);
        assert_eq!(c.months.len(), 12);
        let (metric, cells) = &c.rows[0];
        assert_eq!(*metric, Metric::Overall);
        assert_eq!(cells[3].render(), "-");
        assert_eq!(cells[4].value, Some(100));
        assert_eq!(cells[4].trend, None);
        assert_eq!(cells[5].trend, Some(Trend::Increasing(Some(10.0))));
        assert_eq!(cells[5].render(), "110 📈 (+10.0%)");
        assert_eq!(cells[6].value, None);

        let combined = monthly_comparison(&t, Scope::Combined, 2025);
        assert_eq!(combined.rows[0].1[5].value, Some(310));
    }

    #[test]
    fn distribution_without_sinks() {
        let t = table();
        let sel = Filter::default().select(&t);
        let d = distribution(&sel, Dimension::Region);
        assert_eq!(d.categories.len(), 7);
        assert!(!d.categories.contains(&Category::Region(Region::Unspecified)));
        assert_eq!(d.panels.len(), 2);
        assert_eq!(d.totals[0], 100);
        let g = distribution(&sel, Dimension::Gender);
        assert_eq!(g.categories.len(), 2);
        assert_eq!(g.totals, vec![80, 120]);
        assert_eq!(shares(&g.totals), vec![40.0, 60.0]);
        assert_eq!(shares(&[0, 0]), vec![0.0, 0.0]);
    }

    #[test]
    fn latest_month_of_the_chosen_panel() {
        let t = SummaryTable::from_rows(vec![
            row(Panel::Ms, 6, &[("Total_Respondents_Count", 200)]),
            row(Panel::Ds, 6, &[("Total_Respondents_Count", 110)]),
            row(Panel::Ds, 7, &[("Total_Respondents_Count", 120)]),
        ])
        .unwrap();
        assert_eq!(t.latest_month(), Some(month(7)));

        // Without a panel, the latest month of the whole table.
        let all = Filter::default().select(&t);
        assert_eq!(all.month, Some(month(7)));
        assert_eq!(all.rows.len(), 1);
        assert_eq!(panel_snapshot(&all, Panel::Ms), None);

        // With a panel, the latest month of that panel, not of the table.
        let ms = Filter {
            panel: Some(Panel::Ms),
            month: None,
        }
        .select(&t);
        assert_eq!(ms.month, Some(month(6)));
        assert_eq!(key_metrics(&ms).overall, 200);
    }

    #[test]
    fn highlight_rates() {
        let t = table();
        let sel = Filter {
            panel: Some(Panel::Ms),
            month: None,
        }
        .select(&t);
        let h = highlights(&sel);
        assert_eq!(h.car_ownership_rate, 50.0);
        assert_eq!(h.households_with_cars, 100);
        assert_eq!(h.female_male_ratio, 150.0);
        assert_eq!(h.young_adult_rate, 25.0);
        assert_eq!(h.bangkok_rate, 50.0);
        assert_eq!(h.upc_rate, 50.0);

        let empty = Filter {
            panel: None,
            month: Some(month(2)),
        }
        .select(&t);
        assert_eq!(highlights(&empty), Highlights::default());
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }
}
