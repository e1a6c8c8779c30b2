use serde::{Deserialize, Serialize};

/// One row per graduated individual. Serde field names are the CSV column
/// names; duplicate rows in the source are preserved, not deduplicated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraduateRecord {
    pub program: String,
    pub full_name: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub first_given_name: String,
    pub second_given_name: String,
    pub graduation_year: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderLabel {
    Female,
    Male,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramStats {
    pub program: String,
    pub total: usize,
    pub female: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearCount {
    pub year: i32,
    pub female: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Totals {
    pub total_graduates: usize,
    pub total_female: usize,
    pub female_percentage: f64,
    pub active_programs: usize,
}

/// Everything the stats stage computes. The report renders these numbers
/// without recomputing anything.
#[derive(Debug, Clone)]
pub struct Summary {
    pub totals: Totals,
    /// All programs, zero-row ones included.
    pub per_program: Vec<ProgramStats>,
    /// Zero-row programs omitted; sorted by the ranking order.
    pub ranking: Vec<ProgramStats>,
    pub per_year: Vec<YearCount>,
    /// Programs whose subset table was absent at aggregation time.
    pub missing_subsets: Vec<String>,
}
