use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::Context;
use log::{info, warn};

use crate::models::{GraduateRecord, ProgramStats, Summary, Totals, YearCount};
use crate::report;
use crate::store;

pub const SUMMARY_FILE: &str = "resumen_8m.json";
pub const PER_PROGRAM_FILE: &str = "estadisticas_por_carrera.csv";
pub const RANKING_FILE: &str = "ranking_porcentaje_mujeres.csv";
pub const PER_YEAR_FILE: &str = "mujeres_por_anio.csv";
pub const REPORT_FILE: &str = "reporte_8m.txt";

/// One program's inputs to aggregation.
pub struct ProgramTables {
    pub program: String,
    pub full: Vec<GraduateRecord>,
    /// None when the subset table was absent; the program is then excluded
    /// from every figure and flagged in the report.
    pub subset: Option<Vec<GraduateRecord>>,
}

/// Round half-up to two decimals. Percentages are non-negative, so f64's
/// round (half away from zero) is half-up here. The choice is user-facing:
/// the headline percentage must reproduce exactly across runs.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percentage(female: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(100.0 * female as f64 / total as f64)
    }
}

/// Ranking order: percentage desc, absolute female count desc, program asc.
/// A strict total order, so the ranking is reproducible.
fn ranking_order(a: &ProgramStats, b: &ProgramStats) -> Ordering {
    b.percentage
        .partial_cmp(&a.percentage)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.female.cmp(&a.female))
        .then_with(|| a.program.cmp(&b.program))
}

/// Compute the whole summary from per-program tables. Programs with zero
/// recorded graduates stay in the per-program rows for visibility but are
/// excluded from totals, ranking and per-year figures.
pub fn compute_summary(inputs: &[ProgramTables]) -> Summary {
    let mut missing_subsets = Vec::new();
    let mut per_program = Vec::new();
    let mut total_graduates = 0usize;
    let mut total_female = 0usize;
    let mut active_programs = 0usize;
    let mut years: BTreeSet<i32> = BTreeSet::new();
    let mut female_by_year: BTreeMap<i32, usize> = BTreeMap::new();

    for input in inputs {
        let subset = match &input.subset {
            Some(subset) => subset,
            None => {
                missing_subsets.push(input.program.clone());
                continue;
            }
        };
        let total = input.full.len();
        let female = subset.len();
        per_program.push(ProgramStats {
            program: input.program.clone(),
            total,
            female,
            percentage: percentage(female, total),
        });
        if total == 0 {
            continue;
        }
        total_graduates += total;
        total_female += female;
        active_programs += 1;
        years.extend(input.full.iter().map(|r| r.graduation_year));
        for record in subset {
            *female_by_year.entry(record.graduation_year).or_insert(0) += 1;
        }
    }

    per_program.sort_by(|a, b| a.program.cmp(&b.program));
    missing_subsets.sort();

    let mut ranking: Vec<ProgramStats> = per_program
        .iter()
        .filter(|p| p.total > 0)
        .cloned()
        .collect();
    ranking.sort_by(ranking_order);

    // Year axis comes from the full tables, so a year with zero female
    // graduates still shows up with count 0.
    let per_year = years
        .into_iter()
        .map(|year| YearCount {
            year,
            female: female_by_year.get(&year).copied().unwrap_or(0),
        })
        .collect();

    Summary {
        totals: Totals {
            total_graduates,
            total_female,
            female_percentage: percentage(total_female, total_graduates),
            active_programs,
        },
        per_program,
        ranking,
        per_year,
        missing_subsets,
    }
}

fn write_stats_csv(path: &Path, rows: &[ProgramStats]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Stats stage: read every (full, subset) table pair, compute the summary,
/// regenerate all analysis artifacts.
pub fn run(out_dir: &Path, analysis_dir: &Path) -> anyhow::Result<()> {
    let tables = store::list_program_tables(out_dir)?;
    anyhow::ensure!(
        !tables.is_empty(),
        "no program tables in {}; run the scrape stage first",
        out_dir.display()
    );

    let mut inputs = Vec::with_capacity(tables.len());
    for (program, path) in &tables {
        let full = store::read_table(path)?;
        let subset_path = store::subset_path(out_dir, program);
        let subset = if subset_path.exists() {
            Some(store::read_table(&subset_path)?)
        } else {
            warn!("{program}: subset table {} missing", subset_path.display());
            None
        };
        inputs.push(ProgramTables {
            program: program.clone(),
            full,
            subset,
        });
    }

    let summary = compute_summary(&inputs);

    fs::create_dir_all(analysis_dir)
        .with_context(|| format!("failed to create {}", analysis_dir.display()))?;

    let totals_path = analysis_dir.join(SUMMARY_FILE);
    fs::write(&totals_path, serde_json::to_string_pretty(&summary.totals)?)
        .with_context(|| format!("failed to write {}", totals_path.display()))?;

    write_stats_csv(&analysis_dir.join(PER_PROGRAM_FILE), &summary.per_program)?;
    write_stats_csv(&analysis_dir.join(RANKING_FILE), &summary.ranking)?;

    let per_year_path = analysis_dir.join(PER_YEAR_FILE);
    let mut writer = csv::Writer::from_path(&per_year_path)
        .with_context(|| format!("failed to create {}", per_year_path.display()))?;
    for row in &summary.per_year {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let report_path = analysis_dir.join(REPORT_FILE);
    fs::write(&report_path, report::render(&summary))
        .with_context(|| format!("failed to write {}", report_path.display()))?;

    info!(
        "{} graduates, {} female ({:.2}%) across {} active programs",
        summary.totals.total_graduates,
        summary.totals.total_female,
        summary.totals.female_percentage,
        summary.totals.active_programs
    );
    info!("analysis artifacts written to {}", analysis_dir.display());
    Ok(())
}
