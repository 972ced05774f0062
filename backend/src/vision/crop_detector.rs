use super::classifier::{ClassifierConfig, ImageClassifier, Preprocessing};
use super::preprocess::NormalizedImage;
use shared::CropType;
use std::collections::HashMap;
use std::path::PathBuf;

/// Label order the crop detector was trained with.
pub const CROP_LABELS: [&str; 3] = ["maize", "cassava", "tomato"];
const CROPS: [CropType; 3] = [CropType::Maize, CropType::Cassava, CropType::Tomato];

#[derive(Debug, Clone)]
pub struct CropPrediction {
    pub crop_type: CropType,
    pub confidence: f32,
    /// All three crops with their softmax scores.
    pub crops: HashMap<String, f32>,
}

/// Detects the crop species (maize, cassava, tomato) in a normalized image.
pub struct CropDetector {
    classifier: ImageClassifier,
}

impl CropDetector {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            classifier: ImageClassifier::new(ClassifierConfig {
                model_path: model_path.into(),
                labels: &CROP_LABELS,
                severity_map: &[],
                preprocessing: Preprocessing::Mobilenet,
            }),
        }
    }

    pub fn load_model(&self) {
        self.classifier.load();
    }

    pub fn predict(&self, image: &NormalizedImage) -> Result<CropPrediction, tch::TchError> {
        let prediction = self.classifier.predict(image)?;
        let crops = CROP_LABELS
            .iter()
            .zip(&prediction.scores)
            .map(|(label, score)| (label.to_string(), *score))
            .collect();
        Ok(CropPrediction {
            crop_type: CROPS[prediction.index],
            confidence: prediction.confidence,
            crops,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn test_image() -> NormalizedImage {
        NormalizedImage {
            pixels: Array3::from_elem((224, 224, 3), 0.4),
        }
    }

    #[test]
    fn prediction_covers_all_three_crops() {
        let detector = CropDetector::new("models/does_not_exist.pt");
        let prediction = detector.predict(&test_image()).unwrap();

        assert_eq!(prediction.crops.len(), 3);
        for label in CROP_LABELS {
            assert!(prediction.crops.contains_key(label));
        }

        let max = prediction
            .crops
            .values()
            .cloned()
            .fold(f32::MIN, f32::max);
        assert_eq!(prediction.confidence, max);
        assert_eq!(
            prediction.crops[&prediction.crop_type.to_string()],
            prediction.confidence
        );
    }
}
