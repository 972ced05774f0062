use serde::{Deserialize, Serialize};
use shared::{Severity, Urgency};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One treatment as stored in the catalog. Translation maps are sparse:
/// only languages with an actual translation appear as keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreatmentRecord {
    pub method: String,
    pub description: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub method_translations: HashMap<String, String>,
    #[serde(default)]
    pub description_translations: HashMap<String, String>,
    #[serde(default)]
    pub steps_translations: HashMap<String, Vec<String>>,
}

/// Disease metadata keyed by language where localized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiseaseRecord {
    #[serde(default)]
    pub name: HashMap<String, String>,
    #[serde(default)]
    pub symptoms: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub prevention: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub treatments: Vec<TreatmentRecord>,
}

/// The static disease/treatment catalog, keyed by "{crop}_{disease}".
/// Loaded once at startup and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    records: HashMap<String, DiseaseRecord>,
}

impl KnowledgeBase {
    pub fn new(records: HashMap<String, DiseaseRecord>) -> Self {
        Self { records }
    }

    /// Loads the disease catalog and the treatment catalog and merges them
    /// into one table; treatments embed in their disease record. A missing
    /// or malformed file degrades to an empty table instead of failing.
    pub fn load(disease_db_path: &Path, treatments_db_path: &Path) -> Self {
        let mut records: HashMap<String, DiseaseRecord> = read_json(disease_db_path);
        let treatments: HashMap<String, Vec<TreatmentRecord>> = read_json(treatments_db_path);
        for (key, entries) in treatments {
            let record = records.entry(key).or_default();
            if record.treatments.is_empty() {
                record.treatments = entries;
            }
        }
        Self { records }
    }

    pub fn get(&self, key: &str) -> Option<&DiseaseRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn read_json<T: Default + for<'de> Deserialize<'de>>(path: &Path) -> T {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(_) => {
            log::warn!(
                "Knowledge base file not found at {}, using empty database",
                path.display()
            );
            return T::default();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Malformed knowledge base file {}: {e}", path.display());
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_files_yield_an_empty_table() {
        let kb = KnowledgeBase::load(
            Path::new("data/nope.json"),
            Path::new("data/also_nope.json"),
        );
        assert!(kb.is_empty());
    }

    #[test]
    fn malformed_file_yields_an_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"{ not json").unwrap();

        let kb = KnowledgeBase::load(&path, &dir.path().join("missing.json"));
        assert!(kb.is_empty());
    }

    #[test]
    fn treatment_catalog_merges_into_disease_records() {
        let dir = tempfile::tempdir().unwrap();
        let disease_path = dir.path().join("diseases.json");
        let treatments_path = dir.path().join("treatments.json");

        fs::write(
            &disease_path,
            r#"{"tomato_early_blight": {"name": {"en": "Early Blight"}, "severity": "medium"}}"#,
        )
        .unwrap();
        fs::write(
            &treatments_path,
            r#"{"tomato_early_blight": [{"method": "Fungicide spray", "description": "Apply weekly"}],
                "maize_common_rust": [{"method": "Resistant varieties", "description": "Plant them"}]}"#,
        )
        .unwrap();

        let kb = KnowledgeBase::load(&disease_path, &treatments_path);
        assert_eq!(kb.len(), 2);
        let blight = kb.get("tomato_early_blight").unwrap();
        assert_eq!(blight.name["en"], "Early Blight");
        assert_eq!(blight.treatments.len(), 1);
        assert_eq!(blight.treatments[0].method, "Fungicide spray");
        // treatment-only keys still become records
        assert_eq!(kb.get("maize_common_rust").unwrap().treatments.len(), 1);
    }
}
