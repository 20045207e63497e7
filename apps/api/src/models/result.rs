use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output of the screening stages for one upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub code: i64,
    pub predicted_role: String,
    pub cleaned_text: String,
    pub extracted_text: String,
}

/// The unit handed from `/predict` to `/results`. Stored once, read once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub success: bool,
    pub predicted_role: String,
    pub extracted_text: String,
    /// Formatted markup, or a descriptive message when suggestions failed.
    pub genai_suggestions: String,
    pub analyzed_at: DateTime<Utc>,
}

impl ResultRecord {
    pub fn new(classification: ClassificationResult, genai_suggestions: String) -> Self {
        Self {
            success: true,
            predicted_role: classification.predicted_role,
            extracted_text: classification.extracted_text,
            genai_suggestions,
            analyzed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_with_expected_fields() {
        let record = ResultRecord::new(
            ClassificationResult {
                code: 20,
                predicted_role: "Python Developer".to_string(),
                cleaned_text: "python developer".to_string(),
                extracted_text: "Python developer".to_string(),
            },
            "<div>ok</div>".to_string(),
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["predicted_role"], "Python Developer");
        assert_eq!(value["extracted_text"], "Python developer");
        assert_eq!(value["genai_suggestions"], "<div>ok</div>");
        assert!(value.get("cleaned_text").is_none());

        let back: ResultRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
