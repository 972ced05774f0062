use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString};

/// Crop species the service can recognize.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CropType {
    Maize,
    Cassava,
    Tomato,
}

/// Static per-disease severity tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    #[default]
    Medium,
    High,
}

/// How quickly the grower should act, independent of severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

/// A single treatment, already resolved to the requested language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treatment {
    pub method: String,
    pub description: String,
    #[serde(default)]
    pub steps: Vec<String>,
}

/// Localized disease metadata returned alongside a detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub disease_name: String,
    pub symptoms: Vec<String>,
    pub treatments: Vec<Treatment>,
    pub prevention: Vec<String>,
    pub severity: Severity,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropDetectionResponse {
    pub crop_type: CropType,
    pub confidence: f32,
    pub crops: HashMap<String, f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub crop_type: CropType,
    pub disease: String,
    pub confidence: f32,
    pub severity: Severity,
    pub recommendations: Recommendation,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct LanguageInfo {
    pub code: &'static str,
    pub name: &'static str,
}

/// Languages the knowledge base is localized for.
pub const SUPPORTED_LANGUAGES: [LanguageInfo; 5] = [
    LanguageInfo { code: "en", name: "English" },
    LanguageInfo { code: "ha", name: "Hausa" },
    LanguageInfo { code: "yo", name: "Yoruba" },
    LanguageInfo { code: "ig", name: "Igbo" },
    LanguageInfo { code: "pidgin", name: "Pidgin English" },
];
