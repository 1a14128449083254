use serde::Serialize;
use serde_json::Value;

use crate::models::domain::question::QuestionType;

pub const DEFAULT_TEST_TYPE: &str = "UserInputOmrTest";
pub const UNTITLED_TEST: &str = "Untitled Test";
pub const MARKS_PER_QUESTION: u32 = 4;
pub const MINUTES_PER_QUESTION: u32 = 3;

/// A recorded class meeting as seen by the test generator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SessionDetails {
    pub session_id: String,
    pub class_id: String,
    pub class_name: Option<String>,
    pub subject: Option<String>,
    pub title: String,
    pub start_time: Option<String>,
    pub duration_minutes: Option<u64>,
    pub transcript_url: Option<String>,
    pub teacher_id: Option<String>,
    pub teacher_name: String,
    pub student_ids: Vec<String>,
    pub summary_overview: Option<String>,
}

impl SessionDetails {
    /// The transcript URL when the platform has produced a usable one.
    pub fn usable_transcript_url(&self) -> Option<&str> {
        self.transcript_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty() && !url.contains("No transcript"))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineSection {
    pub id: String,
}

/// Settings the platform assigned to a freshly created test.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TestSettings {
    pub test_type: String,
    pub name: String,
    pub description: String,
    pub max_marks: u32,
    pub duration: u32,
    pub mock_test: bool,
    pub question_count: u32,
    pub marking_schemes: Value,
}

impl TestSettings {
    /// Settings for a published test of `total_questions` questions, keeping
    /// the name, description and type the platform assigned.
    pub fn scored_for(&self, total_questions: usize) -> TestSettings {
        let count = total_questions as u32;
        TestSettings {
            test_type: if self.test_type.is_empty() {
                DEFAULT_TEST_TYPE.to_string()
            } else {
                self.test_type.clone()
            },
            name: if self.name.is_empty() {
                UNTITLED_TEST.to_string()
            } else {
                self.name.clone()
            },
            description: self.description.clone(),
            max_marks: count * MARKS_PER_QUESTION,
            duration: count * MINUTES_PER_QUESTION,
            mock_test: true,
            question_count: count,
            marking_schemes: uniform_marking_schemes(),
        }
    }
}

/// +4 for a correct answer and 0 otherwise, for every question type.
pub fn uniform_marking_schemes() -> Value {
    let schemes = QuestionType::ALL
        .iter()
        .map(|question_type| {
            (
                question_type.as_str().to_string(),
                serde_json::json!({
                    "correct_marks": MARKS_PER_QUESTION,
                    "incorrect_marks": 0
                }),
            )
        })
        .collect::<serde_json::Map<_, _>>();
    Value::Object(schemes)
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreatedTest {
    pub test_id: String,
    pub settings: TestSettings,
}

/// Result of a completed generate-and-publish run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeneratedTest {
    pub test_id: String,
    pub question_count: usize,
    pub requested_count: usize,
}

impl GeneratedTest {
    pub fn shortfall(&self) -> usize {
        self.requested_count.saturating_sub(self.question_count)
    }
}
