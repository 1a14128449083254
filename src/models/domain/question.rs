use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::PipelineError;

pub const UNKNOWN_LOCATION: &str = "Unknown";
pub const DEFAULT_GRADE: &str = "8";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    McqSingleCorrect,   // one option key
    McqMultipleCorrect, // comma separated option keys
    IntegerAnswer,
    FillInTheBlank, // one or two words
}

impl QuestionType {
    pub const ALL: [QuestionType; 4] = [
        QuestionType::McqSingleCorrect,
        QuestionType::McqMultipleCorrect,
        QuestionType::IntegerAnswer,
        QuestionType::FillInTheBlank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::McqSingleCorrect => "MCQ_SINGLE_CORRECT",
            QuestionType::McqMultipleCorrect => "MCQ_MULTIPLE_CORRECT",
            QuestionType::IntegerAnswer => "INTEGER_ANSWER",
            QuestionType::FillInTheBlank => "FILL_IN_THE_BLANK",
        }
    }

    pub fn requires_options(&self) -> bool {
        matches!(
            self,
            QuestionType::McqSingleCorrect | QuestionType::McqMultipleCorrect
        )
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        QuestionType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| s.to_string())
    }
}

/// A question exactly as the generator returned it. Every field is optional
/// so incomplete records survive parsing and are rejected by validation with
/// a precise error instead of failing the whole batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneratedQuestion {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_options")]
    pub options: Option<BTreeMap<String, String>>,
    #[serde(default, deserialize_with = "lenient_answer")]
    pub answer: Option<String>,
    #[serde(default, alias = "questionType")]
    pub question_type: Option<String>,
}

impl GeneratedQuestion {
    /// Trimmed, case-folded question text. Two questions with the same key
    /// are duplicates.
    pub fn dedupe_key(&self) -> String {
        self.text
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    }
}

// Integer answers frequently come back as JSON numbers and multi-correct
// answers as arrays; both are folded into the comma separated string form.
fn lenient_answer<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        Some(other) => Some(other.to_string()),
    })
}

// Numeric answer choices ({"a": 4, "b": 7}) are kept as their text form.
fn lenient_options<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    let value = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(value.map(|options| {
        options
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::Null => return None,
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                Some((key, text))
            })
            .collect()
    }))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Question {
    pub text: String,
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
    pub answer: String,
}

impl Question {
    /// Converts a generated record into a typed question. `index` is the
    /// 1-based position used in error messages.
    pub fn from_generated(index: usize, raw: GeneratedQuestion) -> Result<Self, PipelineError> {
        let text = non_empty(raw.text).ok_or(PipelineError::IncompleteQuestionRecord {
            index,
            field: "text",
        })?;
        let answer = non_empty(raw.answer).ok_or(PipelineError::IncompleteQuestionRecord {
            index,
            field: "answer",
        })?;
        let type_name =
            non_empty(raw.question_type).ok_or(PipelineError::IncompleteQuestionRecord {
                index,
                field: "question_type",
            })?;
        let question_type = type_name
            .parse::<QuestionType>()
            .map_err(|value| PipelineError::InvalidQuestionType { index, value })?;

        let options = if question_type.requires_options() {
            raw.options
        } else {
            None
        };

        Ok(Self {
            text,
            question_type,
            options,
            answer,
        })
    }

    /// True when the record satisfies the full shape contract, including a
    /// non-empty option map for the MCQ variants.
    pub fn is_valid(&self) -> bool {
        let has_fields = !self.text.trim().is_empty() && !self.answer.trim().is_empty();
        if !self.question_type.requires_options() {
            return has_fields;
        }
        has_fields && self.options.as_ref().is_some_and(|o| !o.is_empty())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Learner context used to localize and pitch the generated questions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LocationContext {
    pub city: String,
    pub state: String,
    pub country: String,
    pub grade: String,
}

impl Default for LocationContext {
    fn default() -> Self {
        Self {
            city: UNKNOWN_LOCATION.to_string(),
            state: UNKNOWN_LOCATION.to_string(),
            country: UNKNOWN_LOCATION.to_string(),
            grade: DEFAULT_GRADE.to_string(),
        }
    }
}

impl LocationContext {
    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        self.grade = grade.into();
        self
    }

    pub fn has_location(&self) -> bool {
        [&self.city, &self.state, &self.country]
            .iter()
            .any(|v| v.as_str() != UNKNOWN_LOCATION)
    }
}
