use std::sync::Arc;

use actix_web::{post, web, HttpRequest, HttpResponse};

use crate::{
    app_state::AppState,
    errors::AppError,
    middleware::get_request_id,
    models::dto::{
        request::{GenerateTestRequest, TranscriptWebhookRequest},
        response::{DuplicateDeliveryResponse, GenerateTestResponse},
    },
};

#[post("/generate-test")]
async fn generate_test(
    state: web::Data<Arc<AppState>>,
    req: HttpRequest,
    request: web::Json<GenerateTestRequest>,
) -> Result<HttpResponse, AppError> {
    let session_id = request.into_inner().into_session_id()?;
    log::info!(
        "[{}] generate-test requested for session {}",
        get_request_id(&req).unwrap_or_default(),
        session_id
    );

    let generated = state.test_service.generate_test(&session_id).await?;
    Ok(HttpResponse::Ok().json(GenerateTestResponse::from(generated)))
}

/// Platform notification that a session transcript is ready. Each session
/// is processed at most once; repeated deliveries are acknowledged without
/// doing any work.
#[post("/webhook/transcript-generated")]
async fn transcript_generated(
    state: web::Data<Arc<AppState>>,
    req: HttpRequest,
    request: web::Json<TranscriptWebhookRequest>,
) -> Result<HttpResponse, AppError> {
    let request_id = get_request_id(&req).unwrap_or_default();
    let session_id = request.session_id()?;

    if !state.idempotency.try_claim(&session_id).await? {
        log::info!(
            "[{}] Ignoring duplicate transcript webhook for session {}",
            request_id,
            session_id
        );
        return Ok(HttpResponse::Ok().json(DuplicateDeliveryResponse::new(session_id)));
    }

    log::info!(
        "[{}] Transcript webhook received for session {}",
        request_id,
        session_id
    );

    match state.test_service.generate_test(&session_id).await {
        Ok(generated) => {
            // Already published; report success regardless.
            if let Err(e) = state.idempotency.mark_processed(&session_id).await {
                log::error!(
                    "[{}] Could not mark session {} as processed: {}",
                    request_id,
                    session_id,
                    e
                );
            }
            Ok(HttpResponse::Ok().json(GenerateTestResponse::from(generated)))
        }
        Err(e) => {
            log::error!(
                "[{}] Test generation for session {} failed: {}",
                request_id,
                session_id,
                e
            );
            if let Err(release_err) = state.idempotency.release(&session_id).await {
                log::warn!(
                    "[{}] Could not release claim on session {}: {}",
                    request_id,
                    session_id,
                    release_err
                );
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    use super::*;
    use crate::{
        config::Config,
        errors::AppResult,
        handlers::json_config,
        models::domain::LocationContext,
        services::{
            platform_client::MockPlatformApi, question_generator::MockQuestionGenerator,
            IdempotencyStore, InMemoryIdempotencyStore,
        },
        test_utils::{
            fixtures::{created_test, mcq_question, sample_session, sample_vtt, timeline},
            test_helpers::assert_error_status,
        },
    };

    fn state_with(
        platform: MockPlatformApi,
        idempotency: Arc<InMemoryIdempotencyStore>,
    ) -> web::Data<Arc<AppState>> {
        web::Data::new(Arc::new(AppState::with_services(
            Config::test_config(),
            Arc::new(platform),
            Arc::new(MockQuestionGenerator::new()),
            idempotency,
        )))
    }

    #[actix_web::test]
    async fn test_generate_test_requires_session_id() {
        let state = state_with(MockPlatformApi::new(), Arc::new(InMemoryIdempotencyStore::new()));
        let app = test::init_service(
            App::new()
                .app_data(state)
                .app_data(json_config())
                .service(generate_test),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/generate-test")
            .set_json(json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], 400);
    }

    #[actix_web::test]
    async fn test_malformed_body_is_bad_request() {
        let state = state_with(MockPlatformApi::new(), Arc::new(InMemoryIdempotencyStore::new()));
        let app = test::init_service(
            App::new()
                .app_data(state)
                .app_data(json_config())
                .service(generate_test),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/generate-test")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_duplicate_webhook_is_acknowledged_without_work() {
        let mut platform = MockPlatformApi::new();
        platform.expect_get_session().never();

        let store = Arc::new(InMemoryIdempotencyStore::new());
        store.try_claim("session-1").await.unwrap();
        store.mark_processed("session-1").await.unwrap();

        let app = test::init_service(
            App::new()
                .app_data(state_with(platform, store))
                .app_data(json_config())
                .service(transcript_generated),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/webhook/transcript-generated")
            .set_json(json!({"payload": {"sessionId": "session-1"}}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["duplicate"], true);
        assert_eq!(body["sessionId"], "session-1");
    }

    #[actix_web::test]
    async fn test_failed_webhook_releases_claim() {
        let mut platform = MockPlatformApi::new();
        platform
            .expect_get_session()
            .times(1)
            .returning(|_| Err(AppError::UpstreamError("platform down".to_string())));

        let store = Arc::new(InMemoryIdempotencyStore::new());
        let app = test::init_service(
            App::new()
                .app_data(state_with(platform, store.clone()))
                .app_data(json_config())
                .service(transcript_generated),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/webhook/transcript-generated")
            .set_json(json!({"payload": {"sessionId": "session-9"}}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_error_status(resp.status());
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(store.state_of("session-9").await.is_none());
    }

    /// Claims normally but cannot record completion.
    struct UnmarkableStore {
        inner: InMemoryIdempotencyStore,
    }

    #[async_trait::async_trait]
    impl IdempotencyStore for UnmarkableStore {
        async fn has_processed(&self, session_id: &str) -> AppResult<bool> {
            self.inner.has_processed(session_id).await
        }

        async fn try_claim(&self, session_id: &str) -> AppResult<bool> {
            self.inner.try_claim(session_id).await
        }

        async fn mark_processed(&self, _session_id: &str) -> AppResult<()> {
            Err(AppError::UpstreamError("idempotency store unavailable".to_string()))
        }

        async fn release(&self, session_id: &str) -> AppResult<()> {
            self.inner.release(session_id).await
        }
    }

    #[actix_web::test]
    async fn test_published_test_is_success_even_if_marking_fails() {
        let mut platform = MockPlatformApi::new();
        platform
            .expect_get_session()
            .returning(|_| Ok(sample_session()));
        platform
            .expect_fetch_transcript()
            .returning(|_| Ok(sample_vtt().to_string()));
        platform
            .expect_get_student_location()
            .returning(|_| Ok(LocationContext::default()));
        platform
            .expect_get_content_timeline()
            .returning(|_| Ok(timeline(&["section-1"])));
        platform
            .expect_create_test()
            .returning(|_, _, _| Ok(created_test("test-1")));
        platform.expect_add_questions().returning(|_, _, _| Ok(()));
        platform
            .expect_update_test_settings()
            .returning(|_, _, _| Ok(()));
        platform.expect_publish_test().times(1).returning(|_, _| Ok(()));

        let mut generator = MockQuestionGenerator::new();
        generator.expect_generate().returning(|_, _, _| {
            Ok((1..=5)
                .map(|i| mcq_question(&format!("Question {i}?")))
                .collect())
        });

        let state = web::Data::new(Arc::new(AppState::with_services(
            Config::test_config(),
            Arc::new(platform),
            Arc::new(generator),
            Arc::new(UnmarkableStore {
                inner: InMemoryIdempotencyStore::new(),
            }),
        )));
        let app = test::init_service(
            App::new()
                .app_data(state)
                .app_data(json_config())
                .service(transcript_generated),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/webhook/transcript-generated")
            .set_json(json!({"payload": {"sessionId": "session-1"}}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["testId"], "test-1");
    }

    #[actix_web::test]
    async fn test_webhook_without_session_id_is_bad_request() {
        let state = state_with(MockPlatformApi::new(), Arc::new(InMemoryIdempotencyStore::new()));
        let app = test::init_service(
            App::new()
                .app_data(state)
                .app_data(json_config())
                .service(transcript_generated),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/webhook/transcript-generated")
            .set_json(json!({"payload": {}}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(
            body["message"],
            "Validation error: sessionId not found in webhook payload"
        );
    }
}
