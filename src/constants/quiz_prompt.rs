use crate::models::domain::LocationContext;

pub const QUESTION_GENERATION_PROMPT: &str = "You are an expert teacher writing an exam from a recorded class session. Your goal is to turn the transcript below into exam questions that test the subject matter that was actually taught.

### Core Objectives:

1. **Exact Count:** Generate exactly {count} questions. Never return fewer or more.
2. **Subject Focus:** Use only subject related information. Ignore greetings, attendance, technical issues, jokes and any other general conversation.
3. **Varied Formats:** Mix the question formats listed below across the set.
4. **Distinct Questions:** Every question must have a different prompt text.

### Question Formats:

- **MCQ_SINGLE_CORRECT:** 4 options keyed a, b, c, d and exactly one correct answer. The answer is the option key.
- **MCQ_MULTIPLE_CORRECT:** 4 options keyed a, b, c, d and more than one correct answer. The answer is the comma separated option keys.
- **INTEGER_ANSWER:** The answer is a whole number written as a string.
- **FILL_IN_THE_BLANK:** The answer is 1 or 2 words only. Separate alternative acceptable forms with commas.
{learner}
### Output Specifications:

Strictly return a JSON array in this format, with no prose, no markdown and no extra keys:
{example}

Transcript:
\"\"\"{transcript}\"\"\"
";

pub const QUESTION_FORMAT_EXAMPLE: &str = r#"[
  {
    "text": "Question 1",
    "options": { "a": "Red", "b": "Blue", "c": "Green", "d": "Black" },
    "answer": "b",
    "question_type": "MCQ_SINGLE_CORRECT"
  },
  {
    "text": "Question 2",
    "options": { "a": "Red", "b": "Blue", "c": "Green", "d": "Black" },
    "answer": "b,c",
    "question_type": "MCQ_MULTIPLE_CORRECT"
  },
  {
    "text": "Question 3",
    "answer": "4",
    "question_type": "INTEGER_ANSWER"
  },
  {
    "text": "Question 4",
    "answer": "new, old",
    "question_type": "FILL_IN_THE_BLANK"
  }
]"#;

/// Renders the generation prompt for `count` questions.
pub fn build_question_prompt(transcript: &str, count: usize, location: &LocationContext) -> String {
    QUESTION_GENERATION_PROMPT
        .replace("{count}", &count.to_string())
        .replace("{learner}", &learner_section(location))
        .replace("{example}", QUESTION_FORMAT_EXAMPLE)
        .replace("{transcript}", transcript)
}

fn learner_section(location: &LocationContext) -> String {
    let mut section = format!(
        "\n### Learner:\n\n- **Difficulty:** Pitch the questions at grade {} level.\n",
        location.grade
    );
    if location.has_location() {
        section.push_str(&format!(
            "- **Localization:** The learner lives in {}, {}, {}. Where it fits the subject, use names, places, units and currency familiar to them.\n",
            location.city, location.state, location.country
        ));
    }
    section
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_requests_exact_count_and_embeds_transcript() {
        let prompt = build_question_prompt(
            "Photosynthesis converts light into chemical energy.",
            7,
            &LocationContext::default(),
        );

        assert!(prompt.contains("Generate exactly 7 questions"));
        assert!(prompt.contains("\"\"\"Photosynthesis converts light into chemical energy.\"\"\""));
        assert!(prompt.contains("\"question_type\": \"FILL_IN_THE_BLANK\""));
        assert!(!prompt.contains("{count}"));
        assert!(!prompt.contains("{example}"));
    }

    #[test]
    fn prompt_lists_every_question_format() {
        let prompt = build_question_prompt("text", 1, &LocationContext::default());

        for question_type in crate::models::domain::QuestionType::ALL {
            assert!(prompt.contains(&format!("**{}:**", question_type.as_str())));
        }
    }

    #[test]
    fn unknown_location_only_sets_grade() {
        let prompt = build_question_prompt("text", 3, &LocationContext::default());

        assert!(prompt.contains("grade 8 level"));
        assert!(!prompt.contains("Localization"));
    }

    #[test]
    fn known_location_is_woven_in() {
        let location = LocationContext {
            city: "Nairobi".to_string(),
            country: "Kenya".to_string(),
            ..LocationContext::default()
        }
        .with_grade("6");

        let prompt = build_question_prompt("text", 3, &location);
        assert!(prompt.contains("grade 6 level"));
        assert!(prompt.contains("Nairobi, Unknown, Kenya"));
    }
}
