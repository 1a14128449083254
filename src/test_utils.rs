#[cfg(test)]
pub mod fixtures {
    use std::collections::BTreeMap;

    use serde_json::Value;

    use crate::models::domain::{
        CreatedTest, GeneratedQuestion, SessionDetails, TestSettings, TimelineSection,
    };

    /// A fill-in-the-blank record as the generator would return it
    pub fn fill_in_question(text: &str) -> GeneratedQuestion {
        GeneratedQuestion {
            text: Some(text.to_string()),
            options: None,
            answer: Some("water".to_string()),
            question_type: Some("FILL_IN_THE_BLANK".to_string()),
        }
    }

    /// A single-correct MCQ with four options, answer "b"
    pub fn mcq_question(text: &str) -> GeneratedQuestion {
        let options: BTreeMap<String, String> = [
            ("a", "Oxygen"),
            ("b", "Carbon dioxide"),
            ("c", "Nitrogen"),
            ("d", "Helium"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        GeneratedQuestion {
            text: Some(text.to_string()),
            options: Some(options),
            answer: Some("b".to_string()),
            question_type: Some("MCQ_SINGLE_CORRECT".to_string()),
        }
    }

    /// A session on class "class-1" with one student and a transcript URL
    pub fn sample_session() -> SessionDetails {
        SessionDetails {
            session_id: "session-1".to_string(),
            class_id: "class-1".to_string(),
            class_name: Some("Grade 8 Science".to_string()),
            subject: Some("Biology".to_string()),
            title: "Photosynthesis".to_string(),
            start_time: Some("2024-03-01T09:00:00+00:00".to_string()),
            duration_minutes: Some(45),
            transcript_url: Some("https://files.test/session-1.vtt".to_string()),
            teacher_id: Some("teacher-1".to_string()),
            teacher_name: "Ms. Rao".to_string(),
            student_ids: vec!["student-1".to_string()],
            summary_overview: None,
        }
    }

    pub fn sample_vtt() -> &'static str {
        "WEBVTT\n\n00:00:01.000 --> 00:00:05.000\nToday we learn how plants make food from sunlight.\n\n00:00:05.500 --> 00:00:09.000\nLeaves take in carbon dioxide and release oxygen.\n"
    }

    pub fn timeline(section_ids: &[&str]) -> Vec<TimelineSection> {
        section_ids
            .iter()
            .map(|id| TimelineSection { id: id.to_string() })
            .collect()
    }

    /// A freshly created test carrying the platform's default settings
    pub fn created_test(test_id: &str) -> CreatedTest {
        CreatedTest {
            test_id: test_id.to_string(),
            settings: TestSettings {
                test_type: "UserInputOmrTest".to_string(),
                name: "Photosynthesis".to_string(),
                description: String::new(),
                max_marks: 0,
                duration: 0,
                mock_test: false,
                question_count: 0,
                marking_schemes: Value::Null,
            },
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::models::domain::Question;

    #[test]
    fn test_question_fixtures_pass_validation() {
        let mcq = Question::from_generated(1, mcq_question("Which gas?")).unwrap();
        let blank = Question::from_generated(2, fill_in_question("Plants need ____.")).unwrap();

        assert!(mcq.is_valid());
        assert!(blank.is_valid());
        assert!(blank.options.is_none());
    }

    #[test]
    fn test_sample_vtt_is_long_enough() {
        let transcript = crate::services::transcript::clean_transcript(sample_vtt(), 30).unwrap();
        assert!(transcript.starts_with("Today we learn"));
    }

    #[test]
    fn test_timeline_keeps_order() {
        let sections = timeline(&["a", "b"]);
        assert_eq!(sections[0].id, "a");
        assert_eq!(sections[1].id, "b");
    }
}
