use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context;
use log::warn;
use serde::Deserialize;

use crate::models::GenderLabel;

/// Normalized first name -> label. BTreeMap so serialization and iteration
/// order are deterministic; built once per run, read-only afterwards.
pub type GenderDictionary = BTreeMap<String, GenderLabel>;

/// Lookup key for a first name: trimmed, case-folded, diacritics stripped.
/// "María" and "MARIA" normalize to the same key, "maria".
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .map(fold_diacritic)
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        _ => c,
    }
}

/// The name-classification oracle. The pipeline only ever sees this trait,
/// so tests substitute a deterministic stub.
pub trait NameClassifier {
    fn classify(&self, normalized_name: &str) -> anyhow::Result<GenderLabel>;
}

#[derive(Debug, Deserialize)]
struct LexiconRow {
    name: String,
    label: GenderLabel,
}

/// Production oracle: a name->label lexicon loaded from a CSV file with
/// columns `name,label`. Names not in the lexicon classify as unknown.
pub struct LexiconClassifier {
    entries: BTreeMap<String, GenderLabel>,
}

impl LexiconClassifier {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open lexicon {}", path.display()))?;
        let mut entries = BTreeMap::new();
        for result in reader.deserialize() {
            let row: LexiconRow =
                result.with_context(|| format!("malformed row in lexicon {}", path.display()))?;
            entries.insert(normalize_name(&row.name), row.label);
        }
        Ok(LexiconClassifier { entries })
    }
}

impl NameClassifier for LexiconClassifier {
    fn classify(&self, normalized_name: &str) -> anyhow::Result<GenderLabel> {
        Ok(self
            .entries
            .get(normalized_name)
            .copied()
            .unwrap_or(GenderLabel::Unknown))
    }
}

/// Run every distinct normalized name through the oracle. An oracle failure
/// for one name downgrades that name to unknown; it never aborts the run.
pub fn build_dictionary(
    names: &BTreeSet<String>,
    classifier: &dyn NameClassifier,
) -> GenderDictionary {
    let mut dictionary = GenderDictionary::new();
    for name in names {
        if name.is_empty() {
            continue;
        }
        let label = match classifier.classify(name) {
            Ok(label) => label,
            Err(e) => {
                warn!("classification failed for {name:?}, treating as unknown: {e}");
                GenderLabel::Unknown
            }
        };
        dictionary.insert(name.clone(), label);
    }
    dictionary
}

/// Female-labeled names, sorted. A derived view of the dictionary, not an
/// independent source of truth.
pub fn female_names(dictionary: &GenderDictionary) -> Vec<String> {
    dictionary
        .iter()
        .filter(|(_, label)| **label == GenderLabel::Female)
        .map(|(name, _)| name.clone())
        .collect()
}
