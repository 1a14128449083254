use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{AppError, AppResult};

static TIMESTAMP_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}").expect("TIMESTAMP_LINE is a valid regex"));

static METADATA_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(WEBVTT|NOTE|align|position|line)").expect("METADATA_LINE is a valid regex")
});

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("WHITESPACE is a valid regex"));

/// Flattens a WebVTT subtitle file into a single line of spoken text.
pub fn normalize_vtt(vtt: &str) -> String {
    let spoken = vtt
        .lines()
        .map(str::trim_end)
        .filter(|line| {
            !line.trim().is_empty()
                && !TIMESTAMP_LINE.is_match(line)
                && !line.contains("-->")
                && !METADATA_LINE.is_match(line)
        })
        .collect::<Vec<_>>()
        .join(" ");

    WHITESPACE.replace_all(&spoken, " ").trim().to_string()
}

/// Normalizes `vtt` and rejects transcripts shorter than `min_chars`.
pub fn clean_transcript(vtt: &str, min_chars: usize) -> AppResult<String> {
    let transcript = normalize_vtt(vtt);
    if transcript.chars().count() < min_chars {
        return Err(AppError::TranscriptError(format!(
            "transcript is too short or empty ({} characters)",
            transcript.chars().count()
        )));
    }
    Ok(transcript)
}
