use std::env;

/// Runtime settings, read from the environment with code defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub database_url: String,
    pub crop_detector_path: String,
    pub maize_classifier_path: String,
    pub cassava_classifier_path: String,
    pub tomato_classifier_path: String,
    pub disease_db_path: String,
    pub treatments_db_path: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8000),
            database_url: env_or("DATABASE_URL", "sqlite://crop_doctor.db?mode=rwc"),
            crop_detector_path: env_or("CROP_DETECTOR_PATH", "models/crop_detector.pt"),
            maize_classifier_path: env_or(
                "MAIZE_CLASSIFIER_PATH",
                "models/maize_disease_classifier.pt",
            ),
            cassava_classifier_path: env_or(
                "CASSAVA_CLASSIFIER_PATH",
                "models/cassava_disease_classifier.pt",
            ),
            tomato_classifier_path: env_or(
                "TOMATO_CLASSIFIER_PATH",
                "models/tomato_disease_classifier.pt",
            ),
            disease_db_path: env_or("DISEASE_DB_PATH", "data/disease_database.json"),
            treatments_db_path: env_or("TREATMENTS_DB_PATH", "data/treatments.json"),
        }
    }
}
