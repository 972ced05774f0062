use super::classifier::{ClassifierConfig, ImageClassifier, Preprocessing};
use super::preprocess::NormalizedImage;
use crate::config::Settings;
use crate::error::ApiError;
use shared::{CropType, Severity};
use std::str::FromStr;

pub const MAIZE_LABELS: [&str; 6] = [
    "healthy",
    "maize_streak_virus",
    "northern_leaf_blight",
    "gray_leaf_spot",
    "common_rust",
    "fall_armyworm",
];

const MAIZE_SEVERITY: [(&str, Severity); 6] = [
    ("healthy", Severity::None),
    ("maize_streak_virus", Severity::High),
    ("northern_leaf_blight", Severity::Medium),
    ("gray_leaf_spot", Severity::Medium),
    ("common_rust", Severity::Low),
    ("fall_armyworm", Severity::High),
];

pub const CASSAVA_LABELS: [&str; 5] = [
    "healthy",
    "cassava_mosaic_disease",
    "brown_streak_disease",
    "anthracnose",
    "bacterial_blight",
];

const CASSAVA_SEVERITY: [(&str, Severity); 5] = [
    ("healthy", Severity::None),
    ("cassava_mosaic_disease", Severity::High),
    ("brown_streak_disease", Severity::High),
    ("anthracnose", Severity::Medium),
    ("bacterial_blight", Severity::Medium),
];

pub const TOMATO_LABELS: [&str; 6] = [
    "healthy",
    "early_blight",
    "late_blight",
    "bacterial_spot",
    "leaf_curl",
    "septoria_leaf_spot",
];

const TOMATO_SEVERITY: [(&str, Severity); 6] = [
    ("healthy", Severity::None),
    ("early_blight", Severity::Medium),
    ("late_blight", Severity::High),
    ("bacterial_spot", Severity::Medium),
    ("leaf_curl", Severity::High),
    ("septoria_leaf_spot", Severity::Low),
];

#[derive(Debug, Clone)]
pub struct DiseasePrediction {
    pub disease: String,
    pub confidence: f32,
    pub severity: Severity,
}

/// Disease classifier specialized to one crop's label and severity tables.
#[derive(Debug)]
pub struct DiseaseClassifier {
    classifier: ImageClassifier,
}

impl DiseaseClassifier {
    fn new(
        model_path: &str,
        labels: &'static [&'static str],
        severity_map: &'static [(&'static str, Severity)],
    ) -> Self {
        Self {
            classifier: ImageClassifier::new(ClassifierConfig {
                model_path: model_path.into(),
                labels,
                severity_map,
                preprocessing: Preprocessing::Imagenet,
            }),
        }
    }

    #[allow(dead_code)]
    pub fn labels(&self) -> &'static [&'static str] {
        self.classifier.labels()
    }

    #[allow(dead_code)]
    pub fn severity_for(&self, label: &str) -> Severity {
        self.classifier.severity_for(label)
    }

    pub fn load_model(&self) {
        self.classifier.load();
    }

    pub fn predict(&self, image: &NormalizedImage) -> Result<DiseasePrediction, tch::TchError> {
        let prediction = self.classifier.predict(image)?;
        let severity = self.classifier.severity_for(&prediction.label);
        Ok(DiseasePrediction {
            disease: prediction.label,
            confidence: prediction.confidence,
            severity,
        })
    }
}

/// Registry of one disease classifier per supported crop.
pub struct DiseaseClassifiers {
    maize: DiseaseClassifier,
    cassava: DiseaseClassifier,
    tomato: DiseaseClassifier,
}

impl DiseaseClassifiers {
    pub fn new(settings: &Settings) -> Self {
        Self {
            maize: DiseaseClassifier::new(
                &settings.maize_classifier_path,
                &MAIZE_LABELS,
                &MAIZE_SEVERITY,
            ),
            cassava: DiseaseClassifier::new(
                &settings.cassava_classifier_path,
                &CASSAVA_LABELS,
                &CASSAVA_SEVERITY,
            ),
            tomato: DiseaseClassifier::new(
                &settings.tomato_classifier_path,
                &TOMATO_LABELS,
                &TOMATO_SEVERITY,
            ),
        }
    }

    /// Loads every classifier; each is independent, and a missing artifact
    /// degrades that crop's classifier without blocking the others.
    pub fn load_models(&self) {
        for (crop, classifier) in self.iter() {
            classifier.load_model();
            log::info!("{crop} disease classifier ready");
        }
    }

    pub fn classifier_for(&self, crop: CropType) -> &DiseaseClassifier {
        match crop {
            CropType::Maize => &self.maize,
            CropType::Cassava => &self.cassava,
            CropType::Tomato => &self.tomato,
        }
    }

    /// Looks up a classifier by the caller-supplied crop name. Unknown
    /// names fail with the supported set listed.
    pub fn get_classifier(&self, crop_type: &str) -> Result<&DiseaseClassifier, ApiError> {
        let crop = CropType::from_str(&crop_type.to_lowercase())
            .map_err(|_| ApiError::unknown_crop(crop_type))?;
        Ok(self.classifier_for(crop))
    }

    pub fn iter(&self) -> [(CropType, &DiseaseClassifier); 3] {
        [
            (CropType::Maize, &self.maize),
            (CropType::Cassava, &self.cassava),
            (CropType::Tomato, &self.tomato),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> DiseaseClassifiers {
        DiseaseClassifiers::new(&Settings::from_env())
    }

    #[test]
    fn label_sets_match_documented_sizes() {
        let registry = registry();
        assert_eq!(registry.classifier_for(CropType::Maize).labels().len(), 6);
        assert_eq!(registry.classifier_for(CropType::Cassava).labels().len(), 5);
        assert_eq!(registry.classifier_for(CropType::Tomato).labels().len(), 6);
    }

    #[test]
    fn severity_tables_cover_every_label() {
        for (_, classifier) in registry().iter() {
            for label in classifier.labels() {
                // every label has an explicit entry; healthy is always none
                let severity = classifier.severity_for(label);
                if *label == "healthy" {
                    assert_eq!(severity, Severity::None);
                }
            }
            assert_eq!(classifier.severity_for("no_such_disease"), Severity::Medium);
        }
    }

    #[test]
    fn get_classifier_accepts_any_case() {
        let registry = registry();
        assert!(registry.get_classifier("Tomato").is_ok());
        assert!(registry.get_classifier("maize").is_ok());
    }

    #[test]
    fn get_classifier_rejects_unknown_crops() {
        let err = registry().get_classifier("banana").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("maize") && msg.contains("cassava") && msg.contains("tomato"));
    }
}
