use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    errors::{GeneratorError, PipelineError},
    models::domain::{GeneratedQuestion, LocationContext, Question},
    services::question_generator::QuestionGenerator,
};

const DEFAULT_MAX_ROUNDS: usize = 5;
const DEFAULT_ROUND_TIMEOUT: u64 = 30;
const MAX_STALLED_ROUNDS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    pub max_rounds: usize,
    pub round_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            round_timeout: Duration::from_secs(DEFAULT_ROUND_TIMEOUT),
        }
    }
}

impl PipelineSettings {
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    pub fn with_round_timeout(mut self, timeout: Duration) -> Self {
        self.round_timeout = timeout;
        self
    }
}

/// Questions delivered by one pipeline run. Fewer than `requested` means the
/// generator stopped producing new questions before the quota was met.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub questions: Vec<Question>,
    pub requested: usize,
    pub rounds: usize,
}

impl PipelineOutcome {
    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.questions.len())
    }

    pub fn is_short(&self) -> bool {
        self.shortfall() > 0
    }
}

/// Turns a transcript into a fixed number of validated, distinct questions
/// by calling the generator repeatedly for whatever is still missing.
pub struct McqPipeline {
    generator: Arc<dyn QuestionGenerator>,
    settings: PipelineSettings,
}

impl McqPipeline {
    pub fn new(generator: Arc<dyn QuestionGenerator>, settings: PipelineSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub async fn generate(
        &self,
        transcript: &str,
        requested: usize,
        location: &LocationContext,
    ) -> Result<PipelineOutcome, PipelineError> {
        let mut accumulated: Vec<GeneratedQuestion> = Vec::with_capacity(requested);
        let mut seen: HashSet<String> = HashSet::new();
        let mut last_error: Option<GeneratorError> = None;
        let mut stalled = 0;
        let mut rounds = 0;

        while accumulated.len() < requested && rounds < self.settings.max_rounds {
            rounds += 1;
            let remaining = requested - accumulated.len();

            let batch = match self.run_round(transcript, remaining, location).await {
                Ok(batch) => batch,
                Err(err) if err.is_retryable() => {
                    log::warn!("Generation round {} failed, retrying: {}", rounds, err);
                    last_error = Some(err);
                    continue;
                }
                Err(err) => {
                    log::warn!("Generation round {} failed: {}", rounds, err);
                    last_error = Some(err);
                    break;
                }
            };

            if batch.is_empty() {
                log::info!("Generator returned no questions in round {}", rounds);
                break;
            }

            let received = batch.len();
            let added = merge_unique(&mut accumulated, &mut seen, batch);
            log::info!(
                "Round {}: requested {}, received {}, {} new ({} of {} collected)",
                rounds,
                remaining,
                received,
                added,
                accumulated.len(),
                requested
            );

            if added == 0 {
                stalled += 1;
                if stalled >= MAX_STALLED_ROUNDS {
                    log::warn!("Generator produced only duplicates for {} rounds", stalled);
                    break;
                }
            } else {
                stalled = 0;
            }
        }

        if accumulated.is_empty() {
            return Err(match last_error {
                Some(err) => PipelineError::Generator(err),
                None => PipelineError::NoQuestionsGenerated,
            });
        }

        accumulated.truncate(requested);
        let questions = validate_questions(accumulated)?;

        if questions.len() < requested {
            log::warn!(
                "Delivering {} of {} requested questions after {} rounds",
                questions.len(),
                requested,
                rounds
            );
        }

        Ok(PipelineOutcome {
            questions,
            requested,
            rounds,
        })
    }

    async fn run_round(
        &self,
        transcript: &str,
        remaining: usize,
        location: &LocationContext,
    ) -> Result<Vec<GeneratedQuestion>, GeneratorError> {
        let timeout = self.settings.round_timeout;
        tokio::time::timeout(
            timeout,
            self.generator.generate(transcript, remaining, location),
        )
        .await
        .map_err(|_| GeneratorError::Timeout(timeout.as_millis() as u64))?
    }
}

/// Appends the questions of `batch` whose text has not been seen yet and
/// returns how many were added.
fn merge_unique(
    accumulated: &mut Vec<GeneratedQuestion>,
    seen: &mut HashSet<String>,
    batch: Vec<GeneratedQuestion>,
) -> usize {
    let before = accumulated.len();
    for question in batch {
        if seen.insert(question.dedupe_key()) {
            accumulated.push(question);
        }
    }
    accumulated.len() - before
}

/// Stable, first-seen-wins deduplication on trimmed, case-folded text.
pub fn dedupe_by_text(questions: Vec<GeneratedQuestion>) -> Vec<GeneratedQuestion> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(questions.len());
    merge_unique(&mut unique, &mut seen, questions);
    unique
}

/// Fails the whole batch on the first record missing a required field.
pub fn validate_questions(
    questions: Vec<GeneratedQuestion>,
) -> Result<Vec<Question>, PipelineError> {
    questions
        .into_iter()
        .enumerate()
        .map(|(i, raw)| Question::from_generated(i + 1, raw))
        .collect()
}
