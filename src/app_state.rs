use std::sync::Arc;

use crate::{
    config::Config,
    errors::AppResult,
    services::{
        HttpPlatformClient, IdempotencyStore, InMemoryIdempotencyStore, OpenAiQuestionGenerator,
        PlatformApi, QuestionGenerator, TestGenerationService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub test_service: Arc<TestGenerationService>,
    pub idempotency: Arc<dyn IdempotencyStore>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> AppResult<Self> {
        let platform = Arc::new(HttpPlatformClient::new(&config)?);
        let generator = Arc::new(OpenAiQuestionGenerator::new(&config));

        Ok(Self::with_services(
            config,
            platform,
            generator,
            Arc::new(InMemoryIdempotencyStore::new()),
        ))
    }

    /// Wires the state from already-built collaborators.
    pub fn with_services(
        config: Config,
        platform: Arc<dyn PlatformApi>,
        generator: Arc<dyn QuestionGenerator>,
        idempotency: Arc<dyn IdempotencyStore>,
    ) -> Self {
        let test_service = Arc::new(TestGenerationService::new(platform, generator, &config));

        Self {
            test_service,
            idempotency,
            config: Arc::new(config),
        }
    }
}
