use crate::config::Settings;
use crate::error::ApiError;
use crate::recommend::service::RecommendationService;
use crate::vision::crop_detector::CropDetector;
use crate::vision::disease::DiseaseClassifiers;
use crate::vision::preprocess::{self, INPUT_SIZE};
use shared::{CropDetectionResponse, CropType, DetectionResponse};
use std::str::FromStr;

/// Composes normalizer, crop detector, disease registry and recommendation
/// resolver into the three detection entry points. Constructed once at
/// startup; read-only while serving.
pub struct Pipeline {
    crop_detector: CropDetector,
    disease_classifiers: DiseaseClassifiers,
    recommendations: RecommendationService,
}

impl Pipeline {
    pub fn new(settings: &Settings) -> Self {
        Self {
            crop_detector: CropDetector::new(&settings.crop_detector_path),
            disease_classifiers: DiseaseClassifiers::new(settings),
            recommendations: RecommendationService::from_settings(settings),
        }
    }

    /// Eagerly loads every model; each load is independent and a missing
    /// artifact degrades that classifier instead of failing startup.
    pub fn load_models(&self) {
        self.crop_detector.load_model();
        log::info!("Crop detector ready");
        self.disease_classifiers.load_models();
    }

    pub fn recommendations(&self) -> &RecommendationService {
        &self.recommendations
    }

    /// Crop-only detection: normalize, classify species, return the full
    /// per-class mapping.
    pub fn detect_crop(&self, image_bytes: &[u8]) -> Result<CropDetectionResponse, ApiError> {
        let image = preprocess::normalize(image_bytes, INPUT_SIZE)?;
        let prediction = self.crop_detector.predict(&image)?;
        Ok(CropDetectionResponse {
            crop_type: prediction.crop_type,
            confidence: prediction.confidence,
            crops: prediction.crops,
        })
    }

    /// Disease detection with the crop optionally supplied by the caller;
    /// when absent, the crop detector infers it from the same image.
    pub fn detect_disease(
        &self,
        image_bytes: &[u8],
        crop_type: Option<&str>,
        language: &str,
    ) -> Result<DetectionResponse, ApiError> {
        let image = preprocess::normalize(image_bytes, INPUT_SIZE)?;

        let (crop, classifier) = match crop_type {
            Some(supplied) => {
                let classifier = self.disease_classifiers.get_classifier(supplied)?;
                let crop = CropType::from_str(&supplied.to_lowercase())
                    .map_err(|_| ApiError::unknown_crop(supplied))?;
                (crop, classifier)
            }
            None => {
                let crop = self.crop_detector.predict(&image)?.crop_type;
                (crop, self.disease_classifiers.classifier_for(crop))
            }
        };
        let prediction = classifier.predict(&image)?;
        let recommendations =
            self.recommendations
                .resolve(&crop.to_string(), &prediction.disease, language);

        Ok(DetectionResponse {
            crop_type: crop,
            disease: prediction.disease,
            confidence: prediction.confidence,
            severity: prediction.severity,
            recommendations,
        })
    }

    /// Full pipeline: crop is always inferred, never caller-supplied.
    pub fn detect_full(
        &self,
        image_bytes: &[u8],
        language: &str,
    ) -> Result<DetectionResponse, ApiError> {
        self.detect_disease(image_bytes, None, language)
    }

    #[allow(dead_code)]
    pub fn disease_classifiers(&self) -> &DiseaseClassifiers {
        &self.disease_classifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;

    fn pipeline() -> Pipeline {
        Pipeline::new(&Settings::from_env())
    }

    fn leaf_png() -> Vec<u8> {
        let mut img = RgbImage::new(120, 90);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            *pixel = image::Rgb([30, (100 + x % 100) as u8, 40]);
        }
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn undecodable_bytes_abort_the_request() {
        let err = pipeline().detect_full(b"junk", "en").unwrap_err();
        assert!(err.to_string().contains("decode"));
    }

    #[test]
    fn unknown_supplied_crop_aborts_the_request() {
        let err = pipeline()
            .detect_disease(&leaf_png(), Some("banana"), "en")
            .unwrap_err();
        assert!(err.to_string().contains("Supported"));
    }

    #[test]
    fn full_detection_returns_a_complete_result() {
        let result = pipeline().detect_full(&leaf_png(), "en").unwrap();
        assert!((0.0..=1.0).contains(&result.confidence));
        let labels = pipeline()
            .disease_classifiers()
            .classifier_for(result.crop_type)
            .labels();
        assert!(labels.contains(&result.disease.as_str()));
    }

    #[test]
    fn supplied_crop_skips_species_inference() {
        let result = pipeline()
            .detect_disease(&leaf_png(), Some("cassava"), "en")
            .unwrap();
        assert_eq!(result.crop_type, CropType::Cassava);
    }
}
