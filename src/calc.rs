use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_FACILITATOR: &str = "TBA";

/// Subjects taught to the cohort. `subjects` order is display order; anything
/// not in `core_subjects` is an elective.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectCatalog {
    pub subjects: Vec<String>,
    #[serde(default)]
    pub core_subjects: BTreeSet<String>,
    #[serde(default)]
    pub facilitators: BTreeMap<String, String>,
}

impl SubjectCatalog {
    pub fn is_core(&self, subject: &str) -> bool {
        self.core_subjects.contains(subject)
    }

    /// Drops core and facilitator entries for subjects the catalog does not
    /// list. Returns true when anything was removed.
    pub fn retain_listed(&mut self) -> bool {
        let before = self.core_subjects.len() + self.facilitators.len();
        let listed: BTreeSet<&str> = self.subjects.iter().map(|s| s.as_str()).collect();
        self.core_subjects.retain(|s| listed.contains(s.as_str()));
        self.facilitators.retain(|s, _| listed.contains(s.as_str()));
        before != self.core_subjects.len() + self.facilitators.len()
    }

    pub fn facilitator(&self, subject: &str) -> &str {
        self.facilitators
            .get(subject)
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_FACILITATOR)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStudentRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub scores: BTreeMap<String, i64>,
}

impl RawStudentRecord {
    /// Missing subjects count as a score of 0.
    pub fn score(&self, subject: &str) -> i64 {
        self.scores.get(subject).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    pub subject: String,
    pub mean: f64,
    pub std_dev: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStatistics {
    pub subjects: Vec<SubjectStats>,
}

impl ClassStatistics {
    pub fn get(&self, subject: &str) -> Option<&SubjectStats> {
        self.subjects.iter().find(|s| s.subject == subject)
    }

    /// (mean, std_dev) for a subject, 0/0 when the subject was never computed.
    pub fn mean_and_std_dev(&self, subject: &str) -> (f64, f64) {
        self.get(subject)
            .map(|s| (s.mean, s.std_dev))
            .unwrap_or((0.0, 0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A1,
    B2,
    B3,
    C4,
    C5,
    C6,
    D7,
    E8,
    F9,
}

/// Lower bound of each band as a multiple of the standard deviation, checked
/// top-down. Anything below the last bound is F9.
const GRADE_BANDS: [(f64, Grade); 8] = [
    (1.645, Grade::A1),
    (1.036, Grade::B2),
    (0.524, Grade::B3),
    (0.0, Grade::C4),
    (-0.524, Grade::C5),
    (-1.036, Grade::C6),
    (-1.645, Grade::D7),
    (-2.326, Grade::E8),
];

impl Grade {
    pub const ALL: [Grade; 9] = [
        Grade::A1,
        Grade::B2,
        Grade::B3,
        Grade::C4,
        Grade::C5,
        Grade::C6,
        Grade::D7,
        Grade::E8,
        Grade::F9,
    ];

    /// 1 = best, 9 = worst.
    pub fn value(self) -> u32 {
        match self {
            Grade::A1 => 1,
            Grade::B2 => 2,
            Grade::B3 => 3,
            Grade::C4 => 4,
            Grade::C5 => 5,
            Grade::C6 => 6,
            Grade::D7 => 7,
            Grade::E8 => 8,
            Grade::F9 => 9,
        }
    }

    pub fn remark(self) -> &'static str {
        match self {
            Grade::A1 => "Excellent",
            Grade::B2 => "Very Good",
            Grade::B3 => "Good",
            Grade::C4 | Grade::C5 | Grade::C6 => "Credit",
            Grade::D7 | Grade::E8 => "Pass",
            Grade::F9 => "Fail",
        }
    }

    /// D7, E8 and F9 are reported as critical weaknesses.
    pub fn is_critical(self) -> bool {
        self.value() >= 7
    }

    fn cutoff_label(self) -> String {
        match GRADE_BANDS.iter().find(|(_, g)| *g == self) {
            Some((k, _)) if *k > 0.0 => format!("Score ≥ Mean + {:.3}σ", k),
            Some((k, _)) if *k < 0.0 => format!("Score ≥ Mean − {:.3}σ", -k),
            Some(_) => "Score ≥ Mean".to_string(),
            None => "Score < Mean − 2.326σ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Distinction,
    Merit,
    Pass,
    Fail,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Distinction,
        Category::Merit,
        Category::Pass,
        Category::Fail,
    ];

    /// Bands are inclusive on their upper end.
    pub fn from_aggregate(aggregate: u32) -> Self {
        if aggregate <= 10 {
            Category::Distinction
        } else if aggregate <= 20 {
            Category::Merit
        } else if aggregate <= 36 {
            Category::Pass
        } else {
            Category::Fail
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Distinction => "Distinction",
            Category::Merit => "Merit",
            Category::Pass => "Pass",
            Category::Fail => "Fail",
        }
    }

    pub fn range_label(self) -> &'static str {
        match self {
            Category::Distinction => "06 - 10",
            Category::Merit => "11 - 20",
            Category::Pass => "21 - 36",
            Category::Fail => "37 +",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedSubject {
    pub subject: String,
    pub score: i64,
    pub grade: Grade,
    pub grade_value: u32,
    pub remark: String,
    pub facilitator: String,
    pub z_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WeaknessKind {
    Critical,
    LowerScores,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Weakness {
    pub kind: WeaknessKind,
    pub subjects: Vec<String>,
    pub narrative: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedStudent {
    pub id: i64,
    pub name: String,
    pub subjects: Vec<GradedSubject>,
    pub total_score: i64,
    pub best_six_aggregate: u32,
    pub best_core_subjects: Vec<GradedSubject>,
    pub best_elective_subjects: Vec<GradedSubject>,
    pub category: Category,
    pub weakness: Weakness,
    pub overall_remark: String,
    pub rank: usize,
}

const BEST_CORE_COUNT: usize = 4;
const BEST_ELECTIVE_COUNT: usize = 2;
const LOWER_SCORE_COUNT: usize = 2;

pub fn compute_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n, not n-1).
pub fn compute_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_sq / values.len() as f64).sqrt()
}

pub fn compute_class_statistics(
    cohort: &[RawStudentRecord],
    catalog: &SubjectCatalog,
) -> ClassStatistics {
    let subjects = catalog
        .subjects
        .iter()
        .map(|subject| {
            let scores: Vec<f64> = cohort.iter().map(|s| s.score(subject) as f64).collect();
            let mean = compute_mean(&scores);
            let std_dev = compute_std_dev(&scores, mean);
            SubjectStats {
                subject: subject.clone(),
                mean,
                std_dev,
            }
        })
        .collect();
    ClassStatistics { subjects }
}

pub fn classify(score: f64, mean: f64, std_dev: f64) -> Grade {
    // Every student scored the same.
    if std_dev == 0.0 {
        return Grade::C4;
    }
    let diff = score - mean;
    for (k, grade) in GRADE_BANDS {
        if diff >= k * std_dev {
            return grade;
        }
    }
    Grade::F9
}

pub fn z_score(score: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev == 0.0 {
        0.0
    } else {
        (score - mean) / std_dev
    }
}

fn grade_subject(
    student: &RawStudentRecord,
    subject: &str,
    stats: &ClassStatistics,
    catalog: &SubjectCatalog,
) -> GradedSubject {
    let score = student.score(subject);
    let (mean, std_dev) = stats.mean_and_std_dev(subject);
    let grade = classify(score as f64, mean, std_dev);
    GradedSubject {
        subject: subject.to_string(),
        score,
        grade,
        grade_value: grade.value(),
        remark: grade.remark().to_string(),
        facilitator: catalog.facilitator(subject).to_string(),
        z_score: z_score(score as f64, mean, std_dev),
    }
}

/// Best grade first, higher raw score breaks grade ties. `sort_by` is stable,
/// so catalog order decides exact ties.
fn best_of(mut subjects: Vec<GradedSubject>, take: usize) -> Vec<GradedSubject> {
    subjects.sort_by(|a, b| {
        a.grade_value
            .cmp(&b.grade_value)
            .then_with(|| b.score.cmp(&a.score))
    });
    subjects.truncate(take);
    subjects
}

/// "A", "A and B", "A, B and C".
fn join_subject_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

pub fn identify_weakness(subjects: &[GradedSubject]) -> Weakness {
    let critical: Vec<String> = subjects
        .iter()
        .filter(|s| s.grade.is_critical())
        .map(|s| s.subject.clone())
        .collect();
    if !critical.is_empty() {
        let narrative = format!(
            "Critical weaknesses in {}; these subjects require urgent remedial attention.",
            join_subject_names(&critical)
        );
        return Weakness {
            kind: WeaknessKind::Critical,
            subjects: critical,
            narrative,
        };
    }

    let mut by_score: Vec<&GradedSubject> = subjects.iter().collect();
    by_score.sort_by_key(|s| s.score);
    let lowest: Vec<String> = by_score
        .iter()
        .take(LOWER_SCORE_COUNT)
        .map(|s| s.subject.clone())
        .collect();
    let narrative = if lowest.is_empty() {
        "No graded subjects.".to_string()
    } else {
        format!(
            "Relatively lower scores in {}; more practice is recommended in these subjects.",
            join_subject_names(&lowest)
        )
    };
    Weakness {
        kind: WeaknessKind::LowerScores,
        subjects: lowest,
        narrative,
    }
}

pub fn overall_remark(aggregate: u32, category: Category, weakness: &Weakness) -> String {
    format!(
        "Student achieved an aggregate of {}. {} performance. {}",
        aggregate,
        category.as_str(),
        weakness.narrative
    )
}

fn process_student(
    student: &RawStudentRecord,
    stats: &ClassStatistics,
    catalog: &SubjectCatalog,
) -> ProcessedStudent {
    let subjects: Vec<GradedSubject> = catalog
        .subjects
        .iter()
        .map(|subject| grade_subject(student, subject, stats, catalog))
        .collect();
    let total_score = subjects
        .iter()
        .fold(0i64, |acc, s| acc.saturating_add(s.score));

    let (cores, electives): (Vec<GradedSubject>, Vec<GradedSubject>) = subjects
        .iter()
        .cloned()
        .partition(|s| catalog.is_core(&s.subject));
    let best_core_subjects = best_of(cores, BEST_CORE_COUNT);
    let best_elective_subjects = best_of(electives, BEST_ELECTIVE_COUNT);

    let best_six_aggregate = best_core_subjects
        .iter()
        .chain(best_elective_subjects.iter())
        .map(|s| s.grade_value)
        .sum();
    let category = Category::from_aggregate(best_six_aggregate);
    let weakness = identify_weakness(&subjects);
    let overall_remark = overall_remark(best_six_aggregate, category, &weakness);

    ProcessedStudent {
        id: student.id,
        name: student.name.clone(),
        subjects,
        total_score,
        best_six_aggregate,
        best_core_subjects,
        best_elective_subjects,
        category,
        weakness,
        overall_remark,
        rank: 0,
    }
}

pub fn process_students(
    cohort: &[RawStudentRecord],
    stats: &ClassStatistics,
    catalog: &SubjectCatalog,
) -> Vec<ProcessedStudent> {
    let mut processed: Vec<ProcessedStudent> = cohort
        .iter()
        .map(|s| process_student(s, stats, catalog))
        .collect();

    // Stable: equal totals keep input order.
    processed.sort_by(|a, b| b.total_score.cmp(&a.total_score));
    for (i, p) in processed.iter_mut().enumerate() {
        p.rank = i + 1;
    }
    processed
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category: Category,
    pub aggregate_range: &'static str,
    pub count: usize,
}

pub fn category_counts(students: &[ProcessedStudent]) -> Vec<CategoryCount> {
    Category::ALL
        .iter()
        .map(|&category| CategoryCount {
            category,
            aggregate_range: category.range_label(),
            count: students.iter().filter(|s| s.category == category).count(),
        })
        .collect()
}

pub fn class_average_aggregate(students: &[ProcessedStudent]) -> f64 {
    let aggregates: Vec<f64> = students
        .iter()
        .map(|s| s.best_six_aggregate as f64)
        .collect();
    compute_mean(&aggregates)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBand {
    pub grade: Grade,
    pub value: u32,
    pub remark: &'static str,
    pub cutoff: String,
}

pub fn grading_key() -> Vec<GradeBand> {
    Grade::ALL
        .iter()
        .map(|&grade| GradeBand {
            grade,
            value: grade.value(),
            remark: grade.remark(),
            cutoff: grade.cutoff_label(),
        })
        .collect()
}
