use std::sync::Arc;

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::domain::{GeneratedTest, LocationContext, SessionDetails},
    services::{
        mcq_pipeline::{McqPipeline, PipelineSettings},
        platform_client::PlatformApi,
        question_generator::QuestionGenerator,
        transcript::clean_transcript,
    },
};

/// Builds a test from a session's transcript and publishes it on the
/// session's class.
pub struct TestGenerationService {
    platform: Arc<dyn PlatformApi>,
    pipeline: McqPipeline,
    question_count: usize,
    min_transcript_chars: usize,
    default_grade: String,
}

impl TestGenerationService {
    pub fn new(
        platform: Arc<dyn PlatformApi>,
        generator: Arc<dyn QuestionGenerator>,
        config: &Config,
    ) -> Self {
        let settings = PipelineSettings::default()
            .with_max_rounds(config.max_generation_rounds)
            .with_round_timeout(config.generation_timeout());

        Self {
            platform,
            pipeline: McqPipeline::new(generator, settings),
            question_count: config.question_count,
            min_transcript_chars: config.min_transcript_chars,
            default_grade: config.default_grade.clone(),
        }
    }

    pub async fn generate_test(&self, session_id: &str) -> AppResult<GeneratedTest> {
        log::info!("Generating test for session {}", session_id);

        let session = self.platform.get_session(session_id).await?;
        if session.class_id.trim().is_empty() {
            return Err(AppError::UpstreamError(format!(
                "Session {} has no class id",
                session_id
            )));
        }
        log::info!(
            "Session {} belongs to class {} ({} students)",
            session_id,
            session.class_id,
            session.student_ids.len()
        );

        let transcript = self.load_transcript(&session).await?;
        log::info!(
            "Transcript for session {} has {} characters",
            session_id,
            transcript.chars().count()
        );

        let location = self.learner_context(&session).await;

        let outcome = self
            .pipeline
            .generate(&transcript, self.question_count, &location)
            .await?;
        if outcome.is_short() {
            log::warn!(
                "Session {}: generated {} of {} questions ({} short)",
                session_id,
                outcome.questions.len(),
                outcome.requested,
                outcome.shortfall()
            );
        }

        let sections = self
            .platform
            .get_content_timeline(&session.class_id)
            .await?;
        let section = sections.first().ok_or_else(|| {
            AppError::UpstreamError("No sections found in the content timeline".to_string())
        })?;

        let created = self
            .platform
            .create_test(&session.class_id, &section.id, &session.title)
            .await?;
        log::info!(
            "Created test {} in section {} of class {}",
            created.test_id,
            section.id,
            session.class_id
        );

        self.platform
            .add_questions(&created.test_id, &session.class_id, &outcome.questions)
            .await?;
        log::info!(
            "Uploaded {} questions to test {}",
            outcome.questions.len(),
            created.test_id
        );

        let settings = created.settings.scored_for(outcome.questions.len());
        self.platform
            .update_test_settings(&created.test_id, &session.class_id, &settings)
            .await?;

        self.platform
            .publish_test(&created.test_id, &session.class_id)
            .await?;
        log::info!("Published test {} for session {}", created.test_id, session_id);

        Ok(GeneratedTest {
            test_id: created.test_id,
            question_count: outcome.questions.len(),
            requested_count: outcome.requested,
        })
    }

    async fn load_transcript(&self, session: &SessionDetails) -> AppResult<String> {
        let url = session.usable_transcript_url().ok_or_else(|| {
            AppError::TranscriptError(format!(
                "No transcript available for session {}",
                session.session_id
            ))
        })?;

        let raw = self.platform.fetch_transcript(url).await?;
        clean_transcript(&raw, self.min_transcript_chars)
    }

    /// Location of the first student, or the default context when the
    /// session has no students or the lookup fails.
    async fn learner_context(&self, session: &SessionDetails) -> LocationContext {
        let Some(student_id) = session.student_ids.first() else {
            log::info!("Session {} has no students, using default location", session.session_id);
            return LocationContext::default().with_grade(self.default_grade.clone());
        };

        match self.platform.get_student_location(student_id).await {
            Ok(location) => location.with_grade(self.default_grade.clone()),
            Err(e) => {
                log::warn!(
                    "Location lookup for student {} failed, using default: {}",
                    student_id,
                    e
                );
                LocationContext::default().with_grade(self.default_grade.clone())
            }
        }
    }
}
