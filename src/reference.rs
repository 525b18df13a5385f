use crate::calc::{RawStudentRecord, SubjectCatalog};
use crate::dataset::Dataset;

const SUBJECTS: [&str; 10] = [
    "English Language",
    "Mathematics",
    "Science",
    "Social Studies",
    "Career Technology",
    "Creative Arts and Designing",
    "Ghana Language (Twi)",
    "Religious and Moral Education",
    "Computing",
    "French",
];

const CORE_SUBJECTS: [&str; 4] = [
    "Mathematics",
    "English Language",
    "Social Studies",
    "Science",
];

const FACILITATORS: [(&str, &str); 10] = [
    ("Science", "SIR JOSHUA"),
    ("Computing", "SIR ISAAC"),
    ("Mathematics", "SIR SAMMY"),
    ("Religious and Moral Education", "MADAM JANE"),
    ("Creative Arts and Designing", "MADAM NORTEY"),
    ("French", "SIR CHARLES"),
    ("Social Studies", "SIR ASHMIE"),
    ("English Language", "MADAM NANCY"),
    ("Ghana Language (Twi)", "MADAM RITA"),
    ("Career Technology", "SIR JOSHUA"),
];

// Scores are listed in SUBJECTS order.
const STUDENTS: [(i64, &str, [i64; 10]); 26] = [
    (1, "MASOUD HARUNA", [73, 70, 84, 86, 84, 80, 72, 100, 71, 88]),
    (2, "OFFEI OSEI EDMUND", [76, 69, 79, 84, 76, 81, 90, 97, 73, 71]),
    (3, "FRIMPONG CHARLES", [71, 75, 81, 90, 81, 82, 85, 91, 72, 65]),
    (4, "ADDY GODWILL", [64, 63, 89, 85, 80, 82, 69, 88, 67, 64]),
    (5, "SEDOFIA HEPHZIBA", [68, 63, 66, 84, 91, 77, 68, 98, 61, 79]),
    (6, "HAMMOND EMMANUELLA", [65, 60, 69, 84, 84, 83, 81, 96, 63, 60]),
    (7, "AGYEMANG DANIEL", [56, 66, 72, 91, 88, 72, 71, 93, 65, 69]),
    (8, "ADAMS LATIFA", [61, 55, 73, 70, 91, 79, 78, 99, 64, 69]),
    (9, "NAZAR REGINA", [63, 47, 66, 84, 82, 78, 83, 92, 56, 58]),
    (10, "EUGEINA MILLS", [67, 54, 64, 82, 84, 72, 70, 96, 56, 65]),
    (11, "BENTIL BAABA", [64, 53, 64, 80, 90, 74, 69, 94, 53, 64]),
    (12, "KPEKPO COMFORT", [64, 54, 68, 73, 80, 71, 75, 96, 62, 64]),
    (13, "KANZONI GRACIOUS", [55, 56, 72, 78, 84, 76, 57, 90, 60, 58]),
    (14, "CUDJOE FLORENCE", [68, 35, 75, 65, 90, 71, 80, 92, 60, 63]),
    (15, "ANIAPAM MARNAL", [67, 42, 52, 73, 91, 72, 58, 95, 57, 58]),
    (16, "BINMEY JOSEPHINE", [58, 46, 61, 77, 85, 76, 77, 90, 57, 66]),
    (17, "SHAIBU FARIDA", [61, 49, 62, 71, 74, 71, 68, 92, 57, 68]),
    (18, "OWUSU ISAAC", [51, 33, 49, 73, 81, 64, 77, 86, 50, 62]),
    (19, "ANANE FELICITY", [45, 48, 45, 62, 81, 70, 73, 91, 54, 58]),
    (20, "ANDANI SULLEYMAN", [51, 25, 33, 64, 82, 68, 63, 87, 52, 75]),
    (21, "ANIAPAM ALHAJI", [47, 42, 49, 60, 84, 47, 54, 94, 50, 43]),
    (22, "YELEBI ALI FAWAZ", [39, 41, 52, 54, 78, 64, 62, 94, 44, 60]),
    (23, "YAKUBU NAAHIMA", [40, 23, 41, 51, 73, 76, 76, 88, 40, 70]),
    (24, "KISSI OSEI KELVIN", [48, 26, 45, 56, 67, 64, 68, 90, 54, 52]),
    (25, "YAJUBU NIHAAD", [44, 25, 42, 59, 66, 59, 76, 93, 40, 68]),
    (26, "BOTCHWAY KATURAH", [37, 26, 50, 53, 72, 67, 59, 82, 35, 63]),
];

/// The Basic Nine mock examination cohort the sidecar ships with.
pub fn reference_dataset() -> Dataset {
    let catalog = SubjectCatalog {
        subjects: SUBJECTS.iter().map(|s| s.to_string()).collect(),
        core_subjects: CORE_SUBJECTS.iter().map(|s| s.to_string()).collect(),
        facilitators: FACILITATORS
            .iter()
            .map(|(s, f)| (s.to_string(), f.to_string()))
            .collect(),
    };
    let students = STUDENTS
        .iter()
        .map(|(id, name, scores)| RawStudentRecord {
            id: *id,
            name: name.to_string(),
            scores: SUBJECTS
                .iter()
                .zip(scores.iter())
                .map(|(s, v)| (s.to_string(), *v))
                .collect(),
        })
        .collect();
    Dataset { catalog, students }
}
