//! Mapping of raw survey answers onto canonical categories.
//!
//! Each panel phrases its answers differently (English labels for DS, mostly
//! Thai labels and numeric answers for MS). A mapping table is an ordered list of
//! rules: the first rule that matches decides the category, and a value that no
//! rule matches falls into the sink of the table.
//!
//! Values are normalized before matching: surrounding whitespace is removed,
//! letters are lowercased and any run of whitespace (including line breaks) is
//! collapsed into a single space. Rule patterns are normalized the same way.

use crate::config::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Pattern {
    /// The value is exactly this label.
    Exact(&'static str),
    /// The value contains this fragment.
    Contains(&'static str),
    /// The value is an integer (or an integral float) in this inclusive range.
    Between(i64, i64),
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Rule<T> {
    pub pattern: Pattern,
    pub tag: T,
}

#[derive(Debug)]
pub struct MappingTable<T: 'static> {
    pub rules: &'static [Rule<T>],
    pub sink: T,
}

/// The outcome of classifying one value.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Classification<T> {
    pub tag: T,
    /// False when no rule matched and the value fell into the sink.
    pub matched: bool,
}

pub fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

fn parse_integral(s: &str) -> Option<i64> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        _ => None,
    }
}

#[derive(Debug, Clone)]
enum CompiledPattern {
    Exact(String),
    Contains(String),
    Between(i64, i64),
}

impl CompiledPattern {
    fn new(p: &Pattern) -> CompiledPattern {
        match p {
            Pattern::Exact(s) => CompiledPattern::Exact(normalize(s)),
            Pattern::Contains(s) => CompiledPattern::Contains(normalize(s)),
            Pattern::Between(lo, hi) => CompiledPattern::Between(*lo, *hi),
        }
    }

    fn matches(&self, normalized: &str) -> bool {
        match self {
            CompiledPattern::Exact(s) => s == normalized,
            CompiledPattern::Contains(s) => !s.is_empty() && normalized.contains(s.as_str()),
            CompiledPattern::Between(lo, hi) => {
                matches!(parse_integral(normalized), Some(i) if *lo <= i && i <= *hi)
            }
        }
    }
}

/// A mapping table with its patterns normalized once.
#[derive(Debug, Clone)]
pub struct CompiledTable<T> {
    rules: Vec<(CompiledPattern, T)>,
    sink: T,
}

impl<T: Copy + 'static> CompiledTable<T> {
    pub fn new(table: &MappingTable<T>) -> CompiledTable<T> {
        CompiledTable {
            rules: table
                .rules
                .iter()
                .map(|r| (CompiledPattern::new(&r.pattern), r.tag))
                .collect(),
            sink: table.sink,
        }
    }

    /// A missing value is classified as the empty string.
    pub fn classify(&self, raw: Option<&str>) -> Classification<T> {
        let normalized = raw.map(normalize).unwrap_or_default();
        for (p, tag) in self.rules.iter() {
            if p.matches(&normalized) {
                return Classification {
                    tag: *tag,
                    matched: true,
                };
            }
        }
        Classification {
            tag: self.sink,
            matched: false,
        }
    }
}

/// The mapping tables of one panel.
#[derive(Debug)]
pub struct PanelTables {
    pub gender: MappingTable<Gender>,
    pub age: MappingTable<AgeBand>,
    /// Shared by personal and household income.
    pub income: MappingTable<SesBand>,
    pub occupation: MappingTable<OccupationClass>,
    pub employment: MappingTable<EmploymentClass>,
    pub region: MappingTable<Region>,
    pub cars: MappingTable<CarsAtHome>,
    pub car_owner: MappingTable<CarOwnerRelation>,
}

pub fn tables(panel: Panel) -> &'static PanelTables {
    match panel {
        Panel::Ds => &DS_TABLES,
        Panel::Ms => &MS_TABLES,
    }
}

/// All the tables of a panel, compiled.
#[derive(Debug, Clone)]
pub struct Classifier {
    panel: Panel,
    gender: CompiledTable<Gender>,
    age: CompiledTable<AgeBand>,
    income: CompiledTable<SesBand>,
    occupation: CompiledTable<OccupationClass>,
    employment: CompiledTable<EmploymentClass>,
    region: CompiledTable<Region>,
    cars: CompiledTable<CarsAtHome>,
    car_owner: CompiledTable<CarOwnerRelation>,
}

fn wrap<T>(c: Classification<T>, f: fn(T) -> Category) -> Classification<Category> {
    Classification {
        tag: f(c.tag),
        matched: c.matched,
    }
}

impl Classifier {
    pub fn new(panel: Panel) -> Classifier {
        let t = tables(panel);
        Classifier {
            panel,
            gender: CompiledTable::new(&t.gender),
            age: CompiledTable::new(&t.age),
            income: CompiledTable::new(&t.income),
            occupation: CompiledTable::new(&t.occupation),
            employment: CompiledTable::new(&t.employment),
            region: CompiledTable::new(&t.region),
            cars: CompiledTable::new(&t.cars),
            car_owner: CompiledTable::new(&t.car_owner),
        }
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn classify(&self, dimension: Dimension, raw: Option<&str>) -> Classification<Category> {
        match dimension {
            Dimension::Gender => wrap(self.gender.classify(raw), Category::Gender),
            Dimension::Age => wrap(self.age.classify(raw), Category::Age),
            Dimension::PersonalIncome | Dimension::HouseholdIncome => {
                wrap(self.income.classify(raw), Category::Ses)
            }
            Dimension::Occupation => wrap(self.occupation.classify(raw), Category::Occupation),
            Dimension::Employment => wrap(self.employment.classify(raw), Category::Employment),
            Dimension::Region => wrap(self.region.classify(raw), Category::Region),
            Dimension::CarsAtHome => wrap(self.cars.classify(raw), Category::Cars),
            Dimension::CarOwner => wrap(self.car_owner.classify(raw), Category::CarOwner),
        }
    }
}

/// Maps a single raw value to its category.
///
/// Compiles the tables of the panel on every call: use a `Classifier` to map
/// many values.
pub fn map(dimension: Dimension, raw: Option<&str>, panel: Panel) -> Category {
    Classifier::new(panel).classify(dimension, raw).tag
}

const fn exact<T>(s: &'static str, tag: T) -> Rule<T> {
    Rule {
        pattern: Pattern::Exact(s),
        tag,
    }
}

const fn contains<T>(s: &'static str, tag: T) -> Rule<T> {
    Rule {
        pattern: Pattern::Contains(s),
        tag,
    }
}

const fn between<T>(lo: i64, hi: i64, tag: T) -> Rule<T> {
    Rule {
        pattern: Pattern::Between(lo, hi),
        tag,
    }
}

// ********* DS tables ***********

static DS_GENDER: [Rule<Gender>; 2] = [
    exact("Male", Gender::Male),
    exact("Female", Gender::Female),
];

static DS_AGE: [Rule<AgeBand>; 8] = [
    exact("18-19", AgeBand::Age18To19),
    exact("20-29", AgeBand::Age20To29),
    exact("30-39", AgeBand::Age30To39),
    exact("40-49", AgeBand::Age40To49),
    exact("50-59", AgeBand::Age50To59),
    exact("60-69", AgeBand::Age60To69),
    exact("70-99", AgeBand::Age70To99),
    exact("I do not want to answer", AgeBand::Unspecified),
];

// The 100,000 - 149,999 bracket is B+ here, while MS counts 100,000 - 200,000 as A.
static DS_INCOME: [Rule<SesBand>; 11] = [
    contains("150,000 THB or higher", SesBand::A),
    contains("100,000 THB or higher", SesBand::A),
    contains("100,000 - 149,999 THB", SesBand::BPlus),
    contains("75,000 - 99,999 THB", SesBand::BPlus),
    contains("50,000 - 74,999 THB", SesBand::BPlus),
    contains("50,000 - 99,999 THB", SesBand::BPlus),
    contains("30,000 - 49,999 THB", SesBand::B),
    contains("20,000 - 29,999 THB", SesBand::CPlus),
    contains("10,000 - 19,999 THB", SesBand::C),
    contains("5,000 - 9,999 THB", SesBand::D),
    contains("Less than 5,000 THB", SesBand::E),
];

static DS_OCCUPATION: [Rule<OccupationClass>; 9] = [
    exact(
        "Government worker (excluding Teacher)",
        OccupationClass::Government,
    ),
    exact("Teacher", OccupationClass::Government),
    exact("Official of association", OccupationClass::Professional),
    exact(
        "Self-owned business (Commercial service)",
        OccupationClass::CommercialService,
    ),
    exact(
        "Specialist (legal or management related, ex. lawyer, tax accountant)",
        OccupationClass::Professional,
    ),
    exact(
        "Specialist (medical worker, ex. doctor)",
        OccupationClass::Professional,
    ),
    exact("Specialist (engineer, etc.)", OccupationClass::GeneralLabor),
    exact("Others", OccupationClass::Others),
    exact("Have not answered yet", OccupationClass::Unspecified),
];

static DS_EMPLOYMENT: [Rule<EmploymentClass>; 13] = [
    exact(
        "Employed by someone else, working 30 hours or more per week",
        EmploymentClass::EmployedFullTime,
    ),
    exact(
        "Employed part-time by someone else, working less than 30 hours per week",
        EmploymentClass::EmployedPartTime,
    ),
    exact(
        "Self-employed, working outside your home",
        EmploymentClass::SelfEmployed,
    ),
    exact(
        "Self-employed, working in our home",
        EmploymentClass::SelfEmployed,
    ),
    exact("Middle school student", EmploymentClass::Student),
    exact("High school student", EmploymentClass::Student),
    exact("University student", EmploymentClass::Student),
    exact("Graduate student", EmploymentClass::Student),
    exact("Retired", EmploymentClass::NotEmployedOther),
    exact("Housewife", EmploymentClass::Housewife),
    exact(
        "Not currently employed",
        EmploymentClass::NotEmployedLooking,
    ),
    exact("Others", EmploymentClass::NotEmployedOther),
    exact("Have not answered yet", EmploymentClass::Unspecified),
];

static DS_REGION: [Rule<Region>; 7] = [
    exact("Bangkok Metropolitan", Region::BangkokMetropolitan),
    exact("Sub-Central", Region::Central),
    exact("Northern", Region::North),
    exact("Northeastern", Region::Northeast),
    exact("Eastern", Region::East),
    exact("Western", Region::West),
    exact("Southern", Region::South),
];

static DS_CARS: [Rule<CarsAtHome>; 4] = [
    exact("0", CarsAtHome::Zero),
    exact("1", CarsAtHome::One),
    exact("2", CarsAtHome::Two),
    exact("3 or more", CarsAtHome::ThreeOrMore),
];

static DS_CAR_OWNER: [Rule<CarOwnerRelation>; 8] = [
    exact("Yourself", CarOwnerRelation::Yourself),
    exact("Spouse", CarOwnerRelation::Spouse),
    exact("Parent", CarOwnerRelation::Parent),
    exact("Child", CarOwnerRelation::Child),
    exact("Grand parents", CarOwnerRelation::Grandparents),
    exact("Brothers and sisters", CarOwnerRelation::BrothersSisters),
    exact("Others", CarOwnerRelation::Others),
    exact("Don't Know", CarOwnerRelation::DontKnow),
];

static DS_TABLES: PanelTables = PanelTables {
    gender: MappingTable {
        rules: &DS_GENDER,
        sink: Gender::Unspecified,
    },
    age: MappingTable {
        rules: &DS_AGE,
        sink: AgeBand::Unspecified,
    },
    income: MappingTable {
        rules: &DS_INCOME,
        sink: SesBand::Unspecified,
    },
    occupation: MappingTable {
        rules: &DS_OCCUPATION,
        sink: OccupationClass::Unspecified,
    },
    employment: MappingTable {
        rules: &DS_EMPLOYMENT,
        sink: EmploymentClass::Unspecified,
    },
    region: MappingTable {
        rules: &DS_REGION,
        sink: Region::Unspecified,
    },
    cars: MappingTable {
        rules: &DS_CARS,
        sink: CarsAtHome::Unspecified,
    },
    car_owner: MappingTable {
        rules: &DS_CAR_OWNER,
        sink: CarOwnerRelation::DontKnow,
    },
};

// ********* MS tables ***********

static MS_GENDER: [Rule<Gender>; 4] = [
    exact("Male", Gender::Male),
    exact("Female", Gender::Female),
    exact("ชาย", Gender::Male),
    exact("หญิง", Gender::Female),
];

static MS_AGE: [Rule<AgeBand>; 7] = [
    between(18, 19, AgeBand::Age18To19),
    between(20, 29, AgeBand::Age20To29),
    between(30, 39, AgeBand::Age30To39),
    between(40, 49, AgeBand::Age40To49),
    between(50, 59, AgeBand::Age50To59),
    between(60, 69, AgeBand::Age60To69),
    between(70, 99, AgeBand::Age70To99),
];

static MS_INCOME: [Rule<SesBand>; 19] = [
    contains("100,000 THB or higher", SesBand::A),
    contains("100,000 - 200,000 THB", SesBand::A),
    contains("200,001 - 300,000 THB", SesBand::A),
    contains("50,000 - 99,999 THB", SesBand::BPlus),
    contains("50,001 - 75,000 THB", SesBand::BPlus),
    contains("70,000 - 79,999 THB", SesBand::BPlus),
    contains("60,000 - 69,999 THB", SesBand::BPlus),
    contains("30,000 - 49,999 THB", SesBand::B),
    contains("40,000 - 49,999 THB", SesBand::B),
    contains("20,000 - 29,999 THB", SesBand::CPlus),
    contains("10,000 - 19,999 THB", SesBand::C),
    contains("10,000 - 14,999 THB", SesBand::C),
    contains("5,000 - 9,999 THB", SesBand::D),
    contains("<10,000 THB", SesBand::D),
    contains("Less than 5,000 THB", SesBand::E),
    contains("Don't know", SesBand::Unspecified),
    contains("I do not want to answer", SesBand::Unspecified),
    contains("Have not answered yet", SesBand::Unspecified),
    contains("ไม่ระบุ", SesBand::Unspecified),
];

static MS_OCCUPATION: [Rule<OccupationClass>; 14] = [
    exact("ข้าราชการ/พนักงานรัฐวิสาหกิจ", OccupationClass::Government),
    exact("พนักงานบริษัท", OccupationClass::Professional),
    exact("พนักงานบริษัท/ลูกจ้างเอกชน", OccupationClass::Professional),
    exact("พนักงานประจำโรงงาน", OccupationClass::GeneralLabor),
    exact("นักเรียน/นักศึกษา", OccupationClass::Student),
    exact("แม่บ้าน/พ่อบ้าน", OccupationClass::Housewife),
    exact("เกษตรกร/ประมง", OccupationClass::GeneralLabor),
    exact("รับจ้างทั่วไป", OccupationClass::GeneralLabor),
    exact("ไม่ได้ทำงาน/เกษียณ", OccupationClass::Unemployed),
    exact("ว่างงาน", OccupationClass::Unemployed),
    exact("ผู้ประกอบอาชีพอิสระ", OccupationClass::Others),
    exact(
        "กลุ่มอาชีพ รายได้ไม่ประจำ เช่น \nฟรีแลนซ์ , อาชีพอิสระ",
        OccupationClass::Others,
    ),
    exact("อื่นๆ", OccupationClass::Others),
    exact("ไม่ระบุ", OccupationClass::Unspecified),
];

static MS_EMPLOYMENT: [Rule<EmploymentClass>; 7] = [
    exact(
        "ทำงานเต็มเวลา (30 ชั่วโมงขึ้นไป/สัปดาห์)",
        EmploymentClass::EmployedFullTime,
    ),
    exact(
        "ทำงานนอกเวลา (น้อยกว่า 30 ชั่วโมง/สัปดาห์)",
        EmploymentClass::EmployedPartTime,
    ),
    exact("เจ้าของกิจการ/ทำงานอิสระ", EmploymentClass::SelfEmployed),
    exact("นักเรียน/นักศึกษา", EmploymentClass::Student),
    exact("แม่บ้าน/พ่อบ้าน", EmploymentClass::Housewife),
    exact("ว่างงาน/กำลังหางาน", EmploymentClass::NotEmployedLooking),
    exact("เกษียณ", EmploymentClass::NotEmployedOther),
];

static MS_REGION: [Rule<Region>; 81] = [
    exact("กรุงเทพมหานคร", Region::BangkokMetropolitan),
    exact("สมุทรปราการ", Region::BangkokMetropolitan),
    exact("นนทบุรี", Region::BangkokMetropolitan),
    exact("ปทุมธานี", Region::BangkokMetropolitan),
    exact("นครปฐม", Region::BangkokMetropolitan),
    exact("สมุทรสาคร", Region::BangkokMetropolitan),
    exact("กาญจนบุรี", Region::Central),
    exact("ชัยนาท", Region::Central),
    exact("นครนายก", Region::Central),
    exact("พระนครศรีอยุธยา", Region::Central),
    exact("ลพบุรี", Region::Central),
    exact("สระบุรี", Region::Central),
    exact("สิงห์บุรี", Region::Central),
    exact("อ่างทอง", Region::Central),
    exact("ราชบุรี", Region::Central),
    exact("สุพรรณบุรี", Region::Central),
    exact("สมุทรสงคราม", Region::Central),
    exact("เชียงใหม่", Region::North),
    exact("เชียงราย", Region::North),
    exact("ลำปาง", Region::North),
    exact("ลำพูน", Region::North),
    exact("แม่ฮ่องสอน", Region::North),
    exact("น่าน", Region::North),
    exact("พะเยา", Region::North),
    exact("แพร่", Region::North),
    exact("อุตรดิตถ์", Region::North),
    exact("ตาก", Region::North),
    exact("สุโขทัย", Region::North),
    exact("พิษณุโลก", Region::North),
    exact("พิจิตร", Region::North),
    exact("กำแพงเพชร", Region::North),
    exact("เพชรบูรณ์", Region::North),
    exact("นครสวรรค์", Region::North),
    exact("อุทัยธานี", Region::North),
    exact("ขอนแก่น", Region::Northeast),
    exact("นครราชสีมา", Region::Northeast),
    exact("กาฬสินธุ์", Region::Northeast),
    exact("ชัยภูมิ", Region::Northeast),
    exact("นครพนม", Region::Northeast),
    exact("บึงกาฬ", Region::Northeast),
    exact("บุรีรัมย์", Region::Northeast),
    exact("มหาสารคาม", Region::Northeast),
    exact("มุกดาหาร", Region::Northeast),
    exact("ยโสธร", Region::Northeast),
    exact("ร้อยเอ็ด", Region::Northeast),
    exact("เลย", Region::Northeast),
    exact("ศรีสะเกษ", Region::Northeast),
    exact("สกลนคร", Region::Northeast),
    exact("สุรินทร์", Region::Northeast),
    exact("หนองคาย", Region::Northeast),
    exact("หนองบัวลำภู", Region::Northeast),
    exact("อำนาจเจริญ", Region::Northeast),
    exact("อุดรธานี", Region::Northeast),
    exact("อุบลราชธานี", Region::Northeast),
    exact("ชลบุรี", Region::East),
    exact("จันทบุรี", Region::East),
    exact("ฉะเชิงเทรา", Region::East),
    exact("ตราด", Region::East),
    exact("ปราจีนบุรี", Region::East),
    exact("ระยอง", Region::East),
    exact("สระแก้ว", Region::East),
    exact("เพชรบุรี", Region::West),
    exact("ประจวบคีรีขันธ์", Region::West),
    exact("กระบี่", Region::South),
    exact("ชุมพร", Region::South),
    exact("ตรัง", Region::South),
    exact("นครศรีธรรมราช", Region::South),
    exact("นราธิวาส", Region::South),
    exact("ปัตตานี", Region::South),
    exact("พังงา", Region::South),
    exact("พัทลุง", Region::South),
    exact("ภูเก็ต", Region::South),
    exact("ยะลา", Region::South),
    exact("ระนอง", Region::South),
    exact("สงขลา", Region::South),
    exact("สตูล", Region::South),
    exact("สุราษฎร์ธานี", Region::South),
    exact("ไม่ระบุ", Region::Unspecified),
    exact("อื่นๆ", Region::Unspecified),
    exact("Unknown", Region::Unspecified),
    exact("", Region::Unspecified),
];

static MS_CARS: [Rule<CarsAtHome>; 7] = [
    exact("3 or more", CarsAtHome::ThreeOrMore),
    exact("ไม่มี", CarsAtHome::Zero),
    exact("ไม่ระบุ", CarsAtHome::Unspecified),
    between(0, 0, CarsAtHome::Zero),
    between(1, 1, CarsAtHome::One),
    between(2, 2, CarsAtHome::Two),
    between(3, i64::MAX, CarsAtHome::ThreeOrMore),
];

static MS_CAR_OWNER: [Rule<CarOwnerRelation>; 10] = [
    exact("ตนเอง", CarOwnerRelation::Yourself),
    exact("คู่สมรส", CarOwnerRelation::Spouse),
    exact("บิดา/มารดา", CarOwnerRelation::Parent),
    exact("บุตร", CarOwnerRelation::Child),
    exact("ปู่ย่า/ตายาย", CarOwnerRelation::Grandparents),
    exact("พี่น้อง", CarOwnerRelation::BrothersSisters),
    exact("อื่นๆ", CarOwnerRelation::Others),
    exact("ไม่ทราบ", CarOwnerRelation::DontKnow),
    exact("ไม่มี", CarOwnerRelation::DontKnow),
    exact("ไม่ระบุ", CarOwnerRelation::DontKnow),
];

static MS_TABLES: PanelTables = PanelTables {
    gender: MappingTable {
        rules: &MS_GENDER,
        sink: Gender::Unspecified,
    },
    age: MappingTable {
        rules: &MS_AGE,
        sink: AgeBand::Unspecified,
    },
    income: MappingTable {
        rules: &MS_INCOME,
        sink: SesBand::Unspecified,
    },
    occupation: MappingTable {
        rules: &MS_OCCUPATION,
        sink: OccupationClass::Unspecified,
    },
    employment: MappingTable {
        rules: &MS_EMPLOYMENT,
        sink: EmploymentClass::Unspecified,
    },
    region: MappingTable {
        rules: &MS_REGION,
        sink: Region::Unspecified,
    },
    cars: MappingTable {
        rules: &MS_CARS,
        sink: CarsAtHome::Unspecified,
    },
    car_owner: MappingTable {
        rules: &MS_CAR_OWNER,
        sink: CarOwnerRelation::DontKnow,
    },
};
