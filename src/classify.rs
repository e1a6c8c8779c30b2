use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::Context;
use log::info;

use crate::models::{GenderLabel, GraduateRecord};
use crate::names::{self, GenderDictionary, NameClassifier};
use crate::store;

pub const FEMALE_LIST_FILE: &str = "nombres_mujeres.txt";
pub const DICTIONARY_FILE: &str = "diccionario_nombres.json";

/// Distinct normalized first given names across a set of records. Empty
/// normalizations are excluded (they can never classify as anything).
pub fn distinct_first_names(records: &[GraduateRecord]) -> BTreeSet<String> {
    records
        .iter()
        .map(|r| names::normalize_name(&r.first_given_name))
        .filter(|n| !n.is_empty())
        .collect()
}

/// The female subset of one program table: rows whose normalized first
/// given name maps to female. Input order is preserved, so identical
/// inputs and dictionary reproduce identical tables.
pub fn filter_female(
    records: &[GraduateRecord],
    dictionary: &GenderDictionary,
) -> Vec<GraduateRecord> {
    records
        .iter()
        .filter(|r| {
            dictionary.get(&names::normalize_name(&r.first_given_name))
                == Some(&GenderLabel::Female)
        })
        .cloned()
        .collect()
}

/// Persist the dictionary twice: the sorted female-name list (a derived
/// view) and the full name->label mapping.
pub fn save_dictionary(dictionary: &GenderDictionary, dict_dir: &Path) -> anyhow::Result<()> {
    let female = names::female_names(dictionary);
    let list_path = dict_dir.join(FEMALE_LIST_FILE);
    let mut list = female.join("\n");
    if !list.is_empty() {
        list.push('\n');
    }
    fs::write(&list_path, list)
        .with_context(|| format!("failed to write {}", list_path.display()))?;

    let json_path = dict_dir.join(DICTIONARY_FILE);
    let json = serde_json::to_string_pretty(dictionary)?;
    fs::write(&json_path, json)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    info!(
        "saved {} names ({} female) to {} and {}",
        dictionary.len(),
        female.len(),
        json_path.display(),
        list_path.display()
    );
    Ok(())
}

/// Classifier stage: build the dictionary from every collected table, save
/// it, then write each program's `mujeres_{program}.csv` subset.
pub fn run(
    out_dir: &Path,
    dict_dir: &Path,
    classifier: &dyn NameClassifier,
) -> anyhow::Result<()> {
    let tables = store::list_program_tables(out_dir)?;
    anyhow::ensure!(
        !tables.is_empty(),
        "no program tables in {}; run the scrape stage first",
        out_dir.display()
    );

    let mut per_program = Vec::with_capacity(tables.len());
    let mut unique = BTreeSet::new();
    for (program, path) in &tables {
        let records = store::read_table(path)?;
        unique.extend(distinct_first_names(&records));
        per_program.push((program.clone(), records));
    }
    info!(
        "collected {} distinct first names from {} program tables",
        unique.len(),
        per_program.len()
    );

    let dictionary = names::build_dictionary(&unique, classifier);
    fs::create_dir_all(dict_dir)
        .with_context(|| format!("failed to create {}", dict_dir.display()))?;
    save_dictionary(&dictionary, dict_dir)?;

    let mut total_female = 0usize;
    for (program, records) in &per_program {
        let subset = filter_female(records, &dictionary);
        let path = store::subset_path(out_dir, program);
        store::write_table(&path, &subset)?;
        info!("{program}: {} female rows -> {}", subset.len(), path.display());
        total_female += subset.len();
    }
    info!("{total_female} female rows across all programs");
    Ok(())
}
