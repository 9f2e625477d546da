// ********* Identifiers ***********

use std::error::Error;
use std::fmt::Display;

use chrono::{Datelike, NaiveDate};

/// The independent sources of survey respondents.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Panel {
    /// Pre-tabulated exports: one count file per dimension.
    Ds,
    /// Per-respondent exports.
    Ms,
}

impl Panel {
    pub const ALL: [Panel; 2] = [Panel::Ds, Panel::Ms];

    /// Parses a panel identifier. Case and surrounding whitespace are ignored.
    pub fn parse(s: &str) -> Result<Panel, ProfileError> {
        match s.trim().to_uppercase().as_str() {
            "DS" => Ok(Panel::Ds),
            "MS" => Ok(Panel::Ms),
            _ => Err(ProfileError::InvalidPanel(s.to_string())),
        }
    }

    /// The identifier stored in the Panel_Source column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Panel::Ds => "DS",
            Panel::Ms => "MS",
        }
    }

    /// The prefix used in the names of the files of this panel.
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Panel::Ds => "ds",
            Panel::Ms => "ms",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Panel::Ds => "Asian Panel",
            Panel::Ms => "Meow Panel",
        }
    }
}

impl Display for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A calendar month, stored as its first day.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct Month(NaiveDate);

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Month, ProfileError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Month)
            .ok_or_else(|| ProfileError::InvalidMonth(format!("{:04}-{:02}", year, month)))
    }

    /// Parses a month.
    ///
    /// Accepted forms: `2025-06-01`, `2025-06`, `202506` and the timestamp
    /// form `2025-06-01 00:00:00` found in older summary files.
    /// A full date must fall on the first day of the month.
    pub fn parse(s: &str) -> Result<Month, ProfileError> {
        let invalid = || ProfileError::InvalidMonth(s.to_string());
        let mut parts = s.split_whitespace();
        let date_part = parts.next().ok_or_else(invalid)?;
        match (parts.next(), parts.next()) {
            (None, _) => {}
            (Some("00:00:00"), None) => {}
            _ => return Err(invalid()),
        }

        if let Ok(d) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
            return if d.day() == 1 {
                Ok(Month(d))
            } else {
                Err(invalid())
            };
        }
        if !date_part.is_ascii() {
            return Err(invalid());
        }
        let (year_s, month_s) = match date_part.len() {
            7 if date_part.as_bytes()[4] == b'-' => (&date_part[..4], &date_part[5..]),
            6 => (&date_part[..4], &date_part[4..]),
            _ => return Err(invalid()),
        };
        if !year_s.chars().chain(month_s.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year: i32 = year_s.parse().map_err(|_| invalid())?;
        let month: u32 = month_s.parse().map_err(|_| invalid())?;
        Month::new(year, month).map_err(|_| invalid())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// The `YYYYMM` code used in file names.
    pub fn code(&self) -> String {
        format!("{:04}{:02}", self.year(), self.month())
    }

    /// Short label such as `Jun 25`.
    pub fn label(&self) -> String {
        self.0.format("%b %y").to_string()
    }

    pub fn previous(&self) -> Month {
        if self.month() == 1 {
            Month(NaiveDate::from_ymd_opt(self.year() - 1, 12, 1).unwrap_or(self.0))
        } else {
            Month(NaiveDate::from_ymd_opt(self.year(), self.month() - 1, 1).unwrap_or(self.0))
        }
    }

    /// The twelve months of a calendar year, in order.
    pub fn year_months(year: i32) -> Vec<Month> {
        (1..=12)
            .filter_map(|m| NaiveDate::from_ymd_opt(year, m, 1))
            .map(Month)
            .collect()
    }
}

impl Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

// ********* Dimensions and categories ***********

/// A demographic question that gets counted.
///
/// Income is asked twice (personal and household) and both answers map onto the
/// same SES bands.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Dimension {
    Gender,
    Age,
    PersonalIncome,
    HouseholdIncome,
    Occupation,
    Employment,
    Region,
    CarsAtHome,
    CarOwner,
}

impl Dimension {
    pub const ALL: [Dimension; 9] = [
        Dimension::Gender,
        Dimension::Age,
        Dimension::PersonalIncome,
        Dimension::HouseholdIncome,
        Dimension::Occupation,
        Dimension::Employment,
        Dimension::Region,
        Dimension::CarsAtHome,
        Dimension::CarOwner,
    ];

    /// The prefix of the count columns of this dimension.
    pub fn column_prefix(&self) -> &'static str {
        match self {
            Dimension::Gender => "Gender",
            Dimension::Age => "Age",
            Dimension::PersonalIncome => "SES_Personal",
            Dimension::HouseholdIncome => "SES_Household",
            Dimension::Occupation => "Occupation",
            Dimension::Employment => "Employment",
            Dimension::Region => "Region",
            Dimension::CarsAtHome => "Cars_At_Home",
            Dimension::CarOwner => "Car_Owner",
        }
    }

    /// Short name, used in file names and configuration keys.
    pub fn name(&self) -> &'static str {
        match self {
            Dimension::Gender => "gender",
            Dimension::Age => "age",
            Dimension::PersonalIncome => "personal_income",
            Dimension::HouseholdIncome => "household_income",
            Dimension::Occupation => "occupation",
            Dimension::Employment => "employment",
            Dimension::Region => "region",
            Dimension::CarsAtHome => "cars",
            Dimension::CarOwner => "car_owner",
        }
    }

    pub fn parse_name(s: &str) -> Option<Dimension> {
        Dimension::ALL.iter().find(|d| d.name() == s.trim()).cloned()
    }

    /// All the categories of this dimension, sink included.
    pub fn categories(&self) -> Vec<Category> {
        match self {
            Dimension::Gender => Gender::ALL.iter().map(|c| Category::Gender(*c)).collect(),
            Dimension::Age => AgeBand::ALL.iter().map(|c| Category::Age(*c)).collect(),
            Dimension::PersonalIncome | Dimension::HouseholdIncome => {
                SesBand::ALL.iter().map(|c| Category::Ses(*c)).collect()
            }
            Dimension::Occupation => OccupationClass::ALL
                .iter()
                .map(|c| Category::Occupation(*c))
                .collect(),
            Dimension::Employment => EmploymentClass::ALL
                .iter()
                .map(|c| Category::Employment(*c))
                .collect(),
            Dimension::Region => Region::ALL.iter().map(|c| Category::Region(*c)).collect(),
            Dimension::CarsAtHome => CarsAtHome::ALL.iter().map(|c| Category::Cars(*c)).collect(),
            Dimension::CarOwner => CarOwnerRelation::ALL
                .iter()
                .map(|c| Category::CarOwner(*c))
                .collect(),
        }
    }

    /// The category any value falls back to.
    pub fn sink(&self) -> Category {
        match self {
            Dimension::Gender => Category::Gender(Gender::Unspecified),
            Dimension::Age => Category::Age(AgeBand::Unspecified),
            Dimension::PersonalIncome | Dimension::HouseholdIncome => {
                Category::Ses(SesBand::Unspecified)
            }
            Dimension::Occupation => Category::Occupation(OccupationClass::Unspecified),
            Dimension::Employment => Category::Employment(EmploymentClass::Unspecified),
            Dimension::Region => Category::Region(Region::Unspecified),
            Dimension::CarsAtHome => Category::Cars(CarsAtHome::Unspecified),
            Dimension::CarOwner => Category::CarOwner(CarOwnerRelation::DontKnow),
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// The suffix of a category is the middle part of its column name
// (`Gender_<suffix>_Count`). A category without a suffix has no column: the
// responses that land there are excluded from the dimension.

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Gender {
    Male,
    Female,
    Unspecified,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Unspecified];

    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Gender::Male => Some("Male"),
            Gender::Female => Some("Female"),
            Gender::Unspecified => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unspecified => "Unspecified",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum AgeBand {
    Age18To19,
    Age20To29,
    Age30To39,
    Age40To49,
    Age50To59,
    Age60To69,
    Age70To99,
    Unspecified,
}

impl AgeBand {
    pub const ALL: [AgeBand; 8] = [
        AgeBand::Age18To19,
        AgeBand::Age20To29,
        AgeBand::Age30To39,
        AgeBand::Age40To49,
        AgeBand::Age50To59,
        AgeBand::Age60To69,
        AgeBand::Age70To99,
        AgeBand::Unspecified,
    ];

    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            AgeBand::Age18To19 => Some("18_19"),
            AgeBand::Age20To29 => Some("20_29"),
            AgeBand::Age30To39 => Some("30_39"),
            AgeBand::Age40To49 => Some("40_49"),
            AgeBand::Age50To59 => Some("50_59"),
            AgeBand::Age60To69 => Some("60_69"),
            AgeBand::Age70To99 => Some("70_99"),
            AgeBand::Unspecified => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBand::Age18To19 => "18-19",
            AgeBand::Age20To29 => "20-29",
            AgeBand::Age30To39 => "30-39",
            AgeBand::Age40To49 => "40-49",
            AgeBand::Age50To59 => "50-59",
            AgeBand::Age60To69 => "60-69",
            AgeBand::Age70To99 => "70+",
            AgeBand::Unspecified => "Unspecified",
        }
    }
}

/// Socio-economic status band, derived from an income bracket.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum SesBand {
    A,
    BPlus,
    B,
    CPlus,
    C,
    D,
    E,
    Unspecified,
}

impl SesBand {
    pub const ALL: [SesBand; 8] = [
        SesBand::A,
        SesBand::BPlus,
        SesBand::B,
        SesBand::CPlus,
        SesBand::C,
        SesBand::D,
        SesBand::E,
        SesBand::Unspecified,
    ];

    pub fn suffix(&self) -> Option<&'static str> {
        Some(match self {
            SesBand::A => "A",
            SesBand::BPlus => "B_Plus",
            SesBand::B => "B",
            SesBand::CPlus => "C_Plus",
            SesBand::C => "C",
            SesBand::D => "D",
            SesBand::E => "E",
            SesBand::Unspecified => "Unspecified",
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            SesBand::A => "A",
            SesBand::BPlus => "B+",
            SesBand::B => "B",
            SesBand::CPlus => "C+",
            SesBand::C => "C",
            SesBand::D => "D",
            SesBand::E => "E",
            SesBand::Unspecified => "Unspecified",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum OccupationClass {
    Government,
    Professional,
    CommercialService,
    Student,
    GeneralLabor,
    Unemployed,
    Housewife,
    Others,
    Unspecified,
}

impl OccupationClass {
    pub const ALL: [OccupationClass; 9] = [
        OccupationClass::Government,
        OccupationClass::Professional,
        OccupationClass::CommercialService,
        OccupationClass::Student,
        OccupationClass::GeneralLabor,
        OccupationClass::Unemployed,
        OccupationClass::Housewife,
        OccupationClass::Others,
        OccupationClass::Unspecified,
    ];

    pub fn suffix(&self) -> Option<&'static str> {
        Some(match self {
            OccupationClass::Government => "Government",
            OccupationClass::Professional => "Professional",
            OccupationClass::CommercialService => "Commercial_Service",
            OccupationClass::Student => "Student",
            OccupationClass::GeneralLabor => "General_Labor",
            OccupationClass::Unemployed => "Unemployed",
            OccupationClass::Housewife => "Housewife",
            OccupationClass::Others => "Others",
            OccupationClass::Unspecified => "Unspecified",
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            OccupationClass::Government => "Government",
            OccupationClass::Professional => "Professional",
            OccupationClass::CommercialService => "Commercial / Service",
            OccupationClass::Student => "Student",
            OccupationClass::GeneralLabor => "General Labor",
            OccupationClass::Unemployed => "Unemployed",
            OccupationClass::Housewife => "Housewife",
            OccupationClass::Others => "Others",
            OccupationClass::Unspecified => "Unspecified",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum EmploymentClass {
    /// Employed by someone else, 30 hours or more per week.
    EmployedFullTime,
    /// Employed by someone else, less than 30 hours per week.
    EmployedPartTime,
    SelfEmployed,
    NotEmployedLooking,
    Student,
    Housewife,
    NotEmployedOther,
    Unspecified,
}

impl EmploymentClass {
    pub const ALL: [EmploymentClass; 8] = [
        EmploymentClass::EmployedFullTime,
        EmploymentClass::EmployedPartTime,
        EmploymentClass::SelfEmployed,
        EmploymentClass::NotEmployedLooking,
        EmploymentClass::Student,
        EmploymentClass::Housewife,
        EmploymentClass::NotEmployedOther,
        EmploymentClass::Unspecified,
    ];

    pub fn suffix(&self) -> Option<&'static str> {
        Some(match self {
            EmploymentClass::EmployedFullTime => "Employed_Someone_Else_More_30_Hrs",
            EmploymentClass::EmployedPartTime => "Employed_Someone_Else_Less_30_Hrs",
            EmploymentClass::SelfEmployed => "Self_Employed",
            EmploymentClass::NotEmployedLooking => "Not_Employed_Looking",
            EmploymentClass::Student => "Student",
            EmploymentClass::Housewife => "Housewife",
            EmploymentClass::NotEmployedOther => "Not_Employed_Other",
            EmploymentClass::Unspecified => "Unspecified",
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            EmploymentClass::EmployedFullTime => "Employed (30+ hrs)",
            EmploymentClass::EmployedPartTime => "Employed (<30 hrs)",
            EmploymentClass::SelfEmployed => "Self-employed",
            EmploymentClass::NotEmployedLooking => "Looking for work",
            EmploymentClass::Student => "Student",
            EmploymentClass::Housewife => "Housewife",
            EmploymentClass::NotEmployedOther => "Not employed (other)",
            EmploymentClass::Unspecified => "Unspecified",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Region {
    BangkokMetropolitan,
    Central,
    Northeast,
    North,
    East,
    West,
    South,
    Unspecified,
}

impl Region {
    pub const ALL: [Region; 8] = [
        Region::BangkokMetropolitan,
        Region::Central,
        Region::Northeast,
        Region::North,
        Region::East,
        Region::West,
        Region::South,
        Region::Unspecified,
    ];

    pub fn suffix(&self) -> Option<&'static str> {
        Some(match self {
            Region::BangkokMetropolitan => "Bangkok_Metropolitan",
            Region::Central => "Central",
            Region::Northeast => "Northeast",
            Region::North => "North",
            Region::East => "East",
            Region::West => "West",
            Region::South => "South",
            Region::Unspecified => "Unspecified",
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Region::BangkokMetropolitan => "Bangkok Metro",
            Region::Central => "Central",
            Region::Northeast => "Northeast",
            Region::North => "North",
            Region::East => "East",
            Region::West => "West",
            Region::South => "South",
            Region::Unspecified => "Unspecified",
        }
    }

    /// Upcountry: everything outside Greater Bangkok.
    pub fn is_upcountry(&self) -> bool {
        !matches!(self, Region::BangkokMetropolitan | Region::Unspecified)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum CarsAtHome {
    Zero,
    One,
    Two,
    ThreeOrMore,
    Unspecified,
}

impl CarsAtHome {
    pub const ALL: [CarsAtHome; 5] = [
        CarsAtHome::Zero,
        CarsAtHome::One,
        CarsAtHome::Two,
        CarsAtHome::ThreeOrMore,
        CarsAtHome::Unspecified,
    ];

    pub fn suffix(&self) -> Option<&'static str> {
        Some(match self {
            CarsAtHome::Zero => "0",
            CarsAtHome::One => "1",
            CarsAtHome::Two => "2",
            CarsAtHome::ThreeOrMore => "3_Or_More",
            CarsAtHome::Unspecified => "Unspecified",
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            CarsAtHome::Zero => "0 Cars",
            CarsAtHome::One => "1 Car",
            CarsAtHome::Two => "2 Cars",
            CarsAtHome::ThreeOrMore => "3+ Cars",
            CarsAtHome::Unspecified => "Unspecified",
        }
    }

    pub fn owns_car(&self) -> bool {
        matches!(
            self,
            CarsAtHome::One | CarsAtHome::Two | CarsAtHome::ThreeOrMore
        )
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum CarOwnerRelation {
    Yourself,
    Spouse,
    Parent,
    Child,
    Grandparents,
    BrothersSisters,
    Others,
    DontKnow,
}

impl CarOwnerRelation {
    pub const ALL: [CarOwnerRelation; 8] = [
        CarOwnerRelation::Yourself,
        CarOwnerRelation::Spouse,
        CarOwnerRelation::Parent,
        CarOwnerRelation::Child,
        CarOwnerRelation::Grandparents,
        CarOwnerRelation::BrothersSisters,
        CarOwnerRelation::Others,
        CarOwnerRelation::DontKnow,
    ];

    pub fn suffix(&self) -> Option<&'static str> {
        Some(match self {
            CarOwnerRelation::Yourself => "Yourself",
            CarOwnerRelation::Spouse => "Spouse",
            CarOwnerRelation::Parent => "Parent",
            CarOwnerRelation::Child => "Child",
            CarOwnerRelation::Grandparents => "Grandparents",
            CarOwnerRelation::BrothersSisters => "Brothers_Sisters",
            CarOwnerRelation::Others => "Others",
            CarOwnerRelation::DontKnow => "Dont_Know",
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            CarOwnerRelation::Yourself => "Yourself",
            CarOwnerRelation::Spouse => "Spouse",
            CarOwnerRelation::Parent => "Parent",
            CarOwnerRelation::Child => "Child",
            CarOwnerRelation::Grandparents => "Grandparents",
            CarOwnerRelation::BrothersSisters => "Brothers and sisters",
            CarOwnerRelation::Others => "Others",
            CarOwnerRelation::DontKnow => "Don't know",
        }
    }
}

/// A canonical category, in any of the dimensions.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Category {
    Gender(Gender),
    Age(AgeBand),
    Ses(SesBand),
    Occupation(OccupationClass),
    Employment(EmploymentClass),
    Region(Region),
    Cars(CarsAtHome),
    CarOwner(CarOwnerRelation),
}

impl Category {
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Category::Gender(c) => c.suffix(),
            Category::Age(c) => c.suffix(),
            Category::Ses(c) => c.suffix(),
            Category::Occupation(c) => c.suffix(),
            Category::Employment(c) => c.suffix(),
            Category::Region(c) => c.suffix(),
            Category::Cars(c) => c.suffix(),
            Category::CarOwner(c) => c.suffix(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Gender(c) => c.label(),
            Category::Age(c) => c.label(),
            Category::Ses(c) => c.label(),
            Category::Occupation(c) => c.label(),
            Category::Employment(c) => c.label(),
            Category::Region(c) => c.label(),
            Category::Cars(c) => c.label(),
            Category::CarOwner(c) => c.label(),
        }
    }

    pub fn is_sink(&self) -> bool {
        matches!(
            self,
            Category::Gender(Gender::Unspecified)
                | Category::Age(AgeBand::Unspecified)
                | Category::Ses(SesBand::Unspecified)
                | Category::Occupation(OccupationClass::Unspecified)
                | Category::Employment(EmploymentClass::Unspecified)
                | Category::Region(Region::Unspecified)
                | Category::Cars(CarsAtHome::Unspecified)
                | Category::CarOwner(CarOwnerRelation::DontKnow)
        )
    }
}

// ********* Input data structures ***********

/// A raw answer with the number of respondents who gave it.
///
/// Per-respondent exports produce observations with a count of 1; pre-tabulated
/// exports carry the count of their row.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Observation {
    pub raw: Option<String>,
    pub count: u64,
}

/// Weighted raw answers, each tagged with its dimension.
pub type DimensionObservations = [(Dimension, Observation)];

/// One respondent, with the raw answer to each counted question.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RespondentRecord {
    pub id: Option<String>,
    pub gender: Option<String>,
    pub age: Option<String>,
    pub personal_income: Option<String>,
    pub household_income: Option<String>,
    pub occupation: Option<String>,
    pub employment: Option<String>,
    pub region: Option<String>,
    pub cars_at_home: Option<String>,
    pub car_owner: Option<String>,
}

impl RespondentRecord {
    pub fn value(&self, dimension: Dimension) -> Option<&str> {
        match dimension {
            Dimension::Gender => self.gender.as_deref(),
            Dimension::Age => self.age.as_deref(),
            Dimension::PersonalIncome => self.personal_income.as_deref(),
            Dimension::HouseholdIncome => self.household_income.as_deref(),
            Dimension::Occupation => self.occupation.as_deref(),
            Dimension::Employment => self.employment.as_deref(),
            Dimension::Region => self.region.as_deref(),
            Dimension::CarsAtHome => self.cars_at_home.as_deref(),
            Dimension::CarOwner => self.car_owner.as_deref(),
        }
    }

    pub fn set(&mut self, dimension: Dimension, value: Option<String>) {
        let slot = match dimension {
            Dimension::Gender => &mut self.gender,
            Dimension::Age => &mut self.age,
            Dimension::PersonalIncome => &mut self.personal_income,
            Dimension::HouseholdIncome => &mut self.household_income,
            Dimension::Occupation => &mut self.occupation,
            Dimension::Employment => &mut self.employment,
            Dimension::Region => &mut self.region,
            Dimension::CarsAtHome => &mut self.cars_at_home,
            Dimension::CarOwner => &mut self.car_owner,
        };
        *slot = value;
    }
}

// ******** Output data structures *********

/// Classification statistics for one dimension.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct DimensionQuality {
    /// Responses counted in one of the columns of the dimension.
    pub classified: u64,
    /// Responses that fell in a category without a column.
    pub excluded: u64,
    /// Raw values that no rule matched, with their weight. Sorted by decreasing weight.
    pub unmapped: Vec<(String, u64)>,
}

impl DimensionQuality {
    pub fn unmapped_total(&self) -> u64 {
        self.unmapped.iter().map(|(_, c)| c).sum()
    }
}

/// Data quality statistics of an aggregation run.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct QualityReport {
    pub dimensions: Vec<(Dimension, DimensionQuality)>,
}

impl QualityReport {
    pub fn get(&self, dimension: Dimension) -> Option<&DimensionQuality> {
        self.dimensions
            .iter()
            .find(|(d, _)| *d == dimension)
            .map(|(_, q)| q)
    }

    pub fn unmapped_total(&self) -> u64 {
        self.dimensions.iter().map(|(_, q)| q.unmapped_total()).sum()
    }
}

/// Errors that prevent the library from completing an operation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ProfileError {
    InvalidPanel(String),
    InvalidMonth(String),
    /// A row of the batch to merge belongs to another month.
    BatchMonthMismatch { expected: Month, found: Month },
    /// The same (panel, month) appears twice.
    DuplicateKey { panel: Panel, month: Month },
    EmptyBatch,
    /// The counts of a dimension add up to more than a `u64` can hold.
    CountOverflow { panel: Panel, dimension: Dimension },
}

impl Error for ProfileError {}

impl Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::InvalidPanel(s) => write!(f, "unknown panel identifier {:?}", s),
            ProfileError::InvalidMonth(s) => {
                write!(f, "invalid month {:?} (expected YYYY-MM or YYYY-MM-01)", s)
            }
            ProfileError::BatchMonthMismatch { expected, found } => write!(
                f,
                "batch for month {} contains a row for month {}",
                expected, found
            ),
            ProfileError::DuplicateKey { panel, month } => {
                write!(f, "duplicate summary row for panel {} month {}", panel, month)
            }
            ProfileError::EmptyBatch => write!(f, "no rows to merge"),
            ProfileError::CountOverflow { panel, dimension } => write!(
                f,
                "the {} counts of panel {} are too large to add up",
                dimension, panel
            ),
        }
    }
}

// ********* Configuration **********

/// How the rows of an existing month are treated when a new batch comes in.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MergePolicy {
    /// Every existing row of the month is dropped, whatever its panel.
    /// Re-running a single panel discards the other panels of that month.
    ReplaceMonth,
    /// Only the existing rows with the same (panel, month) as a new row are dropped.
    ReplacePanelMonth,
}

impl MergePolicy {
    pub const DEFAULT: MergePolicy = MergePolicy::ReplaceMonth;
}
