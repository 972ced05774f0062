use super::kb::{KnowledgeBase, TreatmentRecord};
use crate::config::Settings;
use shared::{Recommendation, Severity, Treatment, Urgency};
use std::collections::HashMap;
use std::path::Path;

/// Resolves localized disease metadata and treatment recommendations from
/// the knowledge base.
pub struct RecommendationService {
    kb: KnowledgeBase,
}

impl RecommendationService {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self { kb }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let kb = KnowledgeBase::load(
            Path::new(&settings.disease_db_path),
            Path::new(&settings.treatments_db_path),
        );
        log::info!("Knowledge base loaded with {} disease records", kb.len());
        Self::new(kb)
    }

    /// Resolves a (crop, disease, language) triple. A missing record
    /// degrades to a mostly-empty result with the raw disease label as the
    /// display name; it never fails the request. Localized fields fall back
    /// to English, then to an empty value.
    pub fn resolve(&self, crop_type: &str, disease: &str, language: &str) -> Recommendation {
        let disease_id = format!("{crop_type}_{disease}");
        let Some(record) = self.kb.get(&disease_id) else {
            return Recommendation {
                disease_name: disease.to_string(),
                symptoms: Vec::new(),
                treatments: Vec::new(),
                prevention: Vec::new(),
                severity: Severity::Medium,
                urgency: Urgency::Medium,
            };
        };

        Recommendation {
            disease_name: localized(&record.name, language)
                .cloned()
                .unwrap_or_else(|| disease.to_string()),
            symptoms: localized(&record.symptoms, language)
                .cloned()
                .unwrap_or_default(),
            treatments: record
                .treatments
                .iter()
                .map(|treatment| translate_treatment(treatment, language))
                .collect(),
            prevention: localized(&record.prevention, language)
                .cloned()
                .unwrap_or_default(),
            severity: record.severity,
            urgency: record.urgency,
        }
    }
}

fn localized<'a, T>(map: &'a HashMap<String, T>, language: &str) -> Option<&'a T> {
    map.get(language).or_else(|| map.get("en"))
}

/// Overrides method, description and steps independently from the
/// treatment's own translation maps; untranslated fields keep their
/// English value. Treatments are never dropped for lacking a translation.
fn translate_treatment(record: &TreatmentRecord, language: &str) -> Treatment {
    let mut treatment = Treatment {
        method: record.method.clone(),
        description: record.description.clone(),
        steps: record.steps.clone(),
    };
    if language == "en" {
        return treatment;
    }
    if let Some(method) = record.method_translations.get(language) {
        treatment.method = method.clone();
    }
    if let Some(description) = record.description_translations.get(language) {
        treatment.description = description.clone();
    }
    if let Some(steps) = record.steps_translations.get(language) {
        treatment.steps = steps.clone();
    }
    treatment
}
