use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS detection_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crop_type TEXT NOT NULL,
    disease TEXT NOT NULL,
    confidence REAL NOT NULL,
    severity TEXT NOT NULL,
    language TEXT NOT NULL DEFAULT 'en',
    created_at TEXT NOT NULL
)
"#;

/// A stored detection. The pipeline itself never writes these; callers
/// save results explicitly through the history endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DetectionHistory {
    pub id: i64,
    pub crop_type: String,
    pub disease: String,
    pub confidence: f64,
    pub severity: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDetection {
    pub crop_type: String,
    pub disease: String,
    pub confidence: f64,
    pub severity: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Clone)]
pub struct HistoryRepository {
    pool: SqlitePool,
}

impl HistoryRepository {
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        // single connection: SQLite serializes writers anyway, and an
        // in-memory database exists per connection
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn save(&self, detection: &NewDetection) -> Result<DetectionHistory, sqlx::Error> {
        let rec = sqlx::query_as::<_, DetectionHistory>(
            r#"
            INSERT INTO detection_history (crop_type, disease, confidence, severity, language, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING id, crop_type, disease, confidence, severity, language, created_at
            "#,
        )
        .bind(&detection.crop_type)
        .bind(&detection.disease)
        .bind(detection.confidence)
        .bind(&detection.severity)
        .bind(&detection.language)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(rec)
    }

    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<DetectionHistory>, sqlx::Error> {
        let recs = sqlx::query_as::<_, DetectionHistory>(
            r#"
            SELECT id, crop_type, disease, confidence, severity, language, created_at
            FROM detection_history ORDER BY id LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(recs)
    }

    pub async fn get(&self, id: i64) -> Result<Option<DetectionHistory>, sqlx::Error> {
        let rec = sqlx::query_as::<_, DetectionHistory>(
            r#"
            SELECT id, crop_type, disease, confidence, severity, language, created_at
            FROM detection_history WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rec)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM detection_history WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
