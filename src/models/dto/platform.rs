//! Wire shapes exchanged with the learning platform.
//!
//! Inbound payloads are deliberately permissive (every field optional) since
//! the platform omits keys freely; conversion into domain types applies the
//! defaults.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::domain::{
    question::{LocationContext, Question, QuestionType, UNKNOWN_LOCATION},
    session::{CreatedTest, SessionDetails, TestSettings, DEFAULT_TEST_TYPE, UNTITLED_TEST},
};

pub const TEACHER_ROLE: &str = "teacher";

const CITY_FIELD_ID: &str = "92d6lmyy";
const STATE_FIELD_ID: &str = "mzldqxyr";
const COUNTRY_FIELD_ID: &str = "ju5cks6w";

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
}

/// Ids arrive either as plain strings or in extended JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PlatformId {
    Plain(String),
    Extended {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl PlatformId {
    pub fn into_string(self) -> String {
        match self {
            PlatformId::Plain(id) => id,
            PlatformId::Extended { oid } => oid,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    #[serde(rename = "_id")]
    pub id: Option<PlatformId>,
    pub class_id: Option<PlatformId>,
    pub class_name: Option<String>,
    pub class_subject: Option<String>,
    pub title: Option<String>,
    pub topic: Option<String>,
    #[serde(rename = "start_time")]
    pub start_time: Option<Value>,
    /// Milliseconds.
    pub duration: Option<f64>,
    #[serde(default)]
    pub raw_transcript: Vec<UrlEntry>,
    pub user_id: Option<SessionUser>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub raw_meeting_summary: Vec<MeetingSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlEntry {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionUser {
    #[serde(rename = "_id")]
    pub id: Option<PlatformId>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Participant {
    pub name: Option<String>,
    #[serde(rename = "wiseUserId")]
    pub platform_user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSummary {
    pub summary_overview: Option<String>,
}

impl SessionPayload {
    pub fn into_details(self, requested_id: &str) -> SessionDetails {
        let teacher_name = self
            .user_id
            .as_ref()
            .and_then(|u| u.name.as_deref())
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        let teacher_key = teacher_name.to_lowercase();

        // Everyone whose name differs from the host is treated as a student.
        let student_ids = self
            .participants
            .iter()
            .filter(|p| {
                p.name
                    .as_deref()
                    .map(str::trim)
                    .is_some_and(|name| !name.is_empty() && name.to_lowercase() != teacher_key)
            })
            .filter_map(|p| p.platform_user_id.clone())
            .filter(|id| !id.is_empty())
            .collect();

        let title = [self.title, self.topic]
            .into_iter()
            .flatten()
            .map(|t| t.trim().to_string())
            .find(|t| !t.is_empty())
            .unwrap_or_else(|| UNTITLED_TEST.to_string());

        SessionDetails {
            session_id: self
                .id
                .map(PlatformId::into_string)
                .unwrap_or_else(|| requested_id.to_string()),
            class_id: self
                .class_id
                .map(PlatformId::into_string)
                .unwrap_or_default(),
            class_name: self.class_name,
            subject: self.class_subject,
            title,
            start_time: self.start_time.and_then(start_time_to_rfc3339),
            duration_minutes: self
                .duration
                .filter(|ms| *ms > 0.0)
                .map(|ms| (ms / 60_000.0).round() as u64),
            transcript_url: self.raw_transcript.into_iter().find_map(|entry| entry.url),
            teacher_id: self
                .user_id
                .and_then(|u| u.id)
                .map(PlatformId::into_string),
            teacher_name: if teacher_name.is_empty() {
                "Unknown".to_string()
            } else {
                teacher_name
            },
            student_ids,
            summary_overview: self
                .raw_meeting_summary
                .into_iter()
                .find_map(|s| s.summary_overview),
        }
    }
}

fn start_time_to_rfc3339(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.to_rfc3339()),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReportData {
    pub student_report: Option<StudentReport>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentReport {
    pub registration_data: Option<RegistrationData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationData {
    #[serde(default)]
    pub fields: Vec<RegistrationField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationField {
    pub question_id: Option<String>,
    pub answer: Option<Value>,
}

impl StudentReport {
    /// Location answers from the registration form; grade is left at its
    /// default since the form does not collect it.
    pub fn location(&self) -> LocationContext {
        let fields = self
            .registration_data
            .as_ref()
            .map(|r| r.fields.as_slice())
            .unwrap_or_default();

        let answer_for = |id: &str| {
            fields
                .iter()
                .find(|f| f.question_id.as_deref() == Some(id))
                .and_then(|f| match &f.answer {
                    Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    _ => None,
                })
                .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
        };

        LocationContext {
            city: answer_for(CITY_FIELD_ID),
            state: answer_for(STATE_FIELD_ID),
            country: answer_for(COUNTRY_FIELD_ID),
            ..LocationContext::default()
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimelineData {
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimelineEntry {
    #[serde(rename = "_id")]
    pub id: PlatformId,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTestRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub test_type: String,
    #[serde(rename = "sectionId")]
    pub section_id: String,
}

impl CreateTestRequest {
    pub fn new(title: &str, section_id: &str) -> Self {
        Self {
            name: title.to_string(),
            test_type: DEFAULT_TEST_TYPE.to_string(),
            section_id: section_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatedTestPayload {
    #[serde(rename = "_id")]
    pub id: Option<PlatformId>,
    #[serde(rename = "type")]
    pub test_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    // Replaced by `TestSettings::scored_for` before publishing, so any shape
    // the platform sends is accepted.
    pub max_marks: Option<Value>,
    pub duration: Option<Value>,
    pub mock_test: Option<Value>,
    pub question_count: Option<Value>,
    pub marking_schemes: Option<Value>,
}

impl CreatedTestPayload {
    /// `None` when the platform did not return a test id.
    pub fn into_created_test(self) -> Option<CreatedTest> {
        let test_id = self.id?.into_string();
        Some(CreatedTest {
            test_id,
            settings: TestSettings {
                test_type: self.test_type.unwrap_or_else(|| DEFAULT_TEST_TYPE.to_string()),
                name: self.name.unwrap_or_default(),
                description: self.description.unwrap_or_default(),
                max_marks: loose_u32(self.max_marks),
                duration: loose_u32(self.duration),
                mock_test: loose_bool(self.mock_test),
                question_count: loose_u32(self.question_count),
                marking_schemes: self
                    .marking_schemes
                    .unwrap_or_else(|| Value::Object(Default::default())),
            },
        })
    }
}

fn loose_u32(value: Option<Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n.as_f64().map_or(0, |f| f.max(0.0).round() as u32),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_or(0, |f| f.max(0.0).round() as u32),
        _ => 0,
    }
}

fn loose_bool(value: Option<Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadQuestion {
    pub text: String,
    pub answer: String,
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
}

impl From<&Question> for UploadQuestion {
    fn from(question: &Question) -> Self {
        let options = if question.question_type.requires_options() {
            if question.options.as_ref().map_or(true, BTreeMap::is_empty) {
                log::warn!(
                    "{} question '{}' has no options, uploading an empty option map",
                    question.question_type,
                    question.text
                );
            }
            Some(question.options.clone().unwrap_or_default())
        } else {
            None
        };

        Self {
            text: question.text.clone(),
            answer: question.answer.clone(),
            question_type: question.question_type,
            options,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionUploadRequest {
    pub class_id: String,
    pub current_role: &'static str,
    pub questions: Vec<UploadQuestion>,
}

impl QuestionUploadRequest {
    pub fn new(class_id: &str, questions: &[Question]) -> Self {
        Self {
            class_id: class_id.to_string(),
            current_role: TEACHER_ROLE,
            questions: questions.iter().map(UploadQuestion::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsUpdateRequest {
    pub class_id: String,
    pub user_id: String,
    pub current_role: &'static str,
    pub test_type: String,
    pub test: SettingsBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingsBody {
    pub name: String,
    pub description: String,
    pub max_marks: u32,
    pub duration: u32,
    pub mock_test: bool,
    pub question_count: u32,
    pub marking_schemes: Value,
}

impl SettingsUpdateRequest {
    pub fn new(class_id: &str, user_id: &str, settings: TestSettings) -> Self {
        Self {
            class_id: class_id.to_string(),
            user_id: user_id.to_string(),
            current_role: TEACHER_ROLE,
            test_type: settings.test_type,
            test: SettingsBody {
                name: settings.name,
                description: settings.description,
                max_marks: settings.max_marks,
                duration: settings.duration,
                mock_test: settings.mock_test,
                question_count: settings.question_count,
                marking_schemes: settings.marking_schemes,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishRequest {
    pub class_id: String,
    pub user_id: String,
    pub current_role: &'static str,
    pub test_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_payload_extracts_students_and_title() {
        let payload: SessionPayload = serde_json::from_value(json!({
            "_id": "sess-1",
            "classId": "class-1",
            "topic": "Fractions",
            "duration": 3_600_000,
            "start_time": 1_700_000_000_000i64,
            "rawTranscript": [{"url": "https://cdn.test/t.vtt"}],
            "userId": {"_id": "teacher-1", "name": " Ms Rao "},
            "participants": [
                {"name": "ms rao", "wiseUserId": "teacher-1"},
                {"name": "Arjun", "wiseUserId": "student-1"},
                {"name": "Meera"},
                {"name": "  ", "wiseUserId": "ghost"}
            ]
        }))
        .unwrap();

        let details = payload.into_details("sess-1");
        assert_eq!(details.class_id, "class-1");
        assert_eq!(details.title, "Fractions");
        assert_eq!(details.duration_minutes, Some(60));
        assert_eq!(details.student_ids, vec!["student-1".to_string()]);
        assert_eq!(details.teacher_name, "Ms Rao");
        assert_eq!(
            details.transcript_url.as_deref(),
            Some("https://cdn.test/t.vtt")
        );
        assert!(details.start_time.is_some());
    }

    #[test]
    fn session_payload_without_title_is_untitled() {
        let details = SessionPayload::default().into_details("sess-2");
        assert_eq!(details.title, UNTITLED_TEST);
        assert_eq!(details.session_id, "sess-2");
        assert!(details.transcript_url.is_none());
    }

    #[test]
    fn student_report_maps_registration_fields() {
        let report: StudentReportData = serde_json::from_value(json!({
            "studentReport": {
                "registrationData": {
                    "fields": [
                        {"questionId": "92d6lmyy", "answer": "Pune"},
                        {"questionId": "ju5cks6w", "answer": "India"},
                        {"questionId": "other", "answer": 12}
                    ]
                }
            }
        }))
        .unwrap();

        let location = report.student_report.unwrap().location();
        assert_eq!(location.city, "Pune");
        assert_eq!(location.state, "Unknown");
        assert_eq!(location.country, "India");
        assert_eq!(location.grade, "8");
    }

    #[test]
    fn created_test_accepts_extended_ids() {
        let payload: CreatedTestPayload = serde_json::from_value(json!({
            "_id": {"$oid": "65f0c0ffee"},
            "name": "Fractions",
            "type": "UserInputOmrTest"
        }))
        .unwrap();

        let created = payload.into_created_test().unwrap();
        assert_eq!(created.test_id, "65f0c0ffee");
        assert_eq!(created.settings.name, "Fractions");
        assert_eq!(created.settings.max_marks, 0);
    }

    #[test]
    fn created_test_tolerates_loosely_typed_defaults() {
        let payload: CreatedTestPayload = serde_json::from_value(serde_json::json!({
            "_id": "test-7",
            "name": "Decimals",
            "max_marks": 12.5,
            "duration": "30",
            "mock_test": "true",
            "question_count": null
        }))
        .unwrap();

        let created = payload.into_created_test().unwrap();
        assert_eq!(created.test_id, "test-7");
        assert_eq!(created.settings.max_marks, 13);
        assert_eq!(created.settings.duration, 30);
        assert!(created.settings.mock_test);
        assert_eq!(created.settings.question_count, 0);
    }

    #[test]
    fn created_test_without_id_is_none() {
        assert!(CreatedTestPayload::default().into_created_test().is_none());
    }

    #[test]
    fn upload_substitutes_empty_options_for_mcq() {
        let questions = vec![
            Question {
                text: "Pick the prime".to_string(),
                question_type: QuestionType::McqSingleCorrect,
                options: None,
                answer: "a".to_string(),
            },
            Question {
                text: "3 x 4?".to_string(),
                question_type: QuestionType::IntegerAnswer,
                options: None,
                answer: "12".to_string(),
            },
        ];

        let request = QuestionUploadRequest::new("class-1", &questions);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["current_role"], "teacher");
        assert_eq!(json["questions"].as_array().unwrap().len(), 2);
        assert_eq!(json["questions"][0]["options"], json!({}));
        assert_eq!(json["questions"][0]["question_type"], "MCQ_SINGLE_CORRECT");
        assert!(json["questions"][1].get("options").is_none());
    }
}
