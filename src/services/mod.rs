pub mod http_helpers;
pub mod idempotency;
pub mod mcq_pipeline;
pub mod platform_client;
pub mod question_generator;
pub mod test_service;
pub mod transcript;

pub use idempotency::{IdempotencyStore, InMemoryIdempotencyStore};
pub use mcq_pipeline::{McqPipeline, PipelineOutcome, PipelineSettings};
pub use platform_client::{HttpPlatformClient, PlatformApi};
pub use question_generator::{OpenAiQuestionGenerator, QuestionGenerator};
pub use test_service::TestGenerationService;
