pub type DateTime = chrono::DateTime<chrono::Utc>;
