use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};

use crate::{
    config::Config,
    errors::{AppError, AppResult},
    models::{
        domain::{CreatedTest, LocationContext, Question, SessionDetails, TestSettings, TimelineSection},
        dto::platform::{
            CreateTestRequest, CreatedTestPayload, Envelope, PublishRequest, QuestionUploadRequest,
            SessionPayload, SettingsUpdateRequest, StudentReportData, TimelineData, TEACHER_ROLE,
        },
    },
    services::http_helpers::{ensure_success, json_body},
};

const API_KEY_HEADER: &str = "x-api-key";
const NAMESPACE_HEADER: &str = "x-wise-namespace";

const SESSION_QUERY: [(&str, &str); 5] = [
    ("showLiveClassInsight", "true"),
    ("showFeedbackConfig", "true"),
    ("showFeedbackSubmission", "true"),
    ("showSessionFiles", "true"),
    ("showAgendaStructure", "true"),
];

/// The learning platform operations the test generator depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn get_session(&self, session_id: &str) -> AppResult<SessionDetails>;

    async fn get_student_location(&self, student_id: &str) -> AppResult<LocationContext>;

    /// Downloads the raw subtitle file behind a transcript URL.
    async fn fetch_transcript(&self, url: &str) -> AppResult<String>;

    async fn get_content_timeline(&self, class_id: &str) -> AppResult<Vec<TimelineSection>>;

    async fn create_test(&self, class_id: &str, section_id: &str, title: &str) -> AppResult<CreatedTest>;

    async fn add_questions(&self, test_id: &str, class_id: &str, questions: &[Question]) -> AppResult<()>;

    async fn update_test_settings(
        &self,
        test_id: &str,
        class_id: &str,
        settings: &TestSettings,
    ) -> AppResult<()>;

    async fn publish_test(&self, test_id: &str, class_id: &str) -> AppResult<()>;
}

pub struct HttpPlatformClient {
    http: reqwest::Client,
    download: reqwest::Client,
    api_host: String,
    exam_api_host: String,
    user_id: String,
    api_key: SecretString,
    institute_id: String,
}

impl HttpPlatformClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let mut api_key = HeaderValue::from_str(config.platform_api_key.expose_secret())
            .map_err(|e| AppError::ConfigError(format!("invalid PLATFORM_API_KEY: {e}")))?;
        api_key.set_sensitive(true);
        let namespace = HeaderValue::from_str(&config.platform_namespace)
            .map_err(|e| AppError::ConfigError(format!("invalid PLATFORM_NAMESPACE: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, api_key);
        headers.insert(NAMESPACE_HEADER, namespace);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.platform_user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;
        // Transcript URLs point at file storage; no platform credentials on these requests.
        let download = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            download,
            api_host: config.platform_api_host.trim_end_matches('/').to_string(),
            exam_api_host: config.platform_exam_api_host.trim_end_matches('/').to_string(),
            user_id: config.platform_user_id.clone(),
            api_key: config.platform_api_key.clone(),
            institute_id: config.platform_institute_id.clone(),
        })
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.http
            .get(url)
            .basic_auth(&self.user_id, Some(self.api_key.expose_secret()))
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .basic_auth(&self.user_id, Some(self.api_key.expose_secret()))
    }

    fn put(&self, url: String) -> reqwest::RequestBuilder {
        self.http
            .put(url)
            .basic_auth(&self.user_id, Some(self.api_key.expose_secret()))
    }
}

#[async_trait]
impl PlatformApi for HttpPlatformClient {
    async fn get_session(&self, session_id: &str) -> AppResult<SessionDetails> {
        let response = self
            .get(format!("{}/user/session/{}", self.api_host, session_id))
            .query(&SESSION_QUERY)
            .send()
            .await?;

        let envelope: Envelope<SessionPayload> =
            json_body(response, "Failed to fetch session details").await?;
        let session = envelope
            .data
            .ok_or_else(|| AppError::UpstreamError("Session not found in response".to_string()))?;

        Ok(session.into_details(session_id))
    }

    async fn get_student_location(&self, student_id: &str) -> AppResult<LocationContext> {
        let response = self
            .get(format!(
                "{}/public/institutes/{}/studentReports/{}",
                self.api_host, self.institute_id, student_id
            ))
            .send()
            .await?;

        let envelope: Envelope<StudentReportData> =
            json_body(response, "Failed to fetch student details").await?;
        let report = envelope
            .data
            .and_then(|d| d.student_report)
            .ok_or_else(|| {
                AppError::UpstreamError("Student report missing from response".to_string())
            })?;

        Ok(report.location())
    }

    async fn fetch_transcript(&self, url: &str) -> AppResult<String> {
        let response = self.download.get(url).send().await?;
        let response = ensure_success(response, "Failed to download transcript").await?;
        Ok(response.text().await?)
    }

    async fn get_content_timeline(&self, class_id: &str) -> AppResult<Vec<TimelineSection>> {
        let response = self
            .get(format!(
                "{}/user/classes/{}/contentTimeline",
                self.api_host, class_id
            ))
            .query(&[("showSequentialLearningDisabledSections", "true")])
            .send()
            .await?;

        let envelope: Envelope<TimelineData> =
            json_body(response, "Failed to fetch content timeline").await?;

        Ok(envelope
            .data
            .unwrap_or_default()
            .timeline
            .into_iter()
            .map(|entry| TimelineSection {
                id: entry.id.into_string(),
            })
            .collect())
    }

    async fn create_test(&self, class_id: &str, section_id: &str, title: &str) -> AppResult<CreatedTest> {
        let response = self
            .post(format!(
                "{}/teacher/classes/{}/proxy/addTest",
                self.api_host, class_id
            ))
            .json(&CreateTestRequest::new(title, section_id))
            .send()
            .await?;

        let envelope: Envelope<Envelope<CreatedTestPayload>> =
            json_body(response, "Failed to create test").await?;

        envelope
            .data
            .and_then(|outer| outer.data)
            .and_then(CreatedTestPayload::into_created_test)
            .ok_or_else(|| {
                AppError::UpstreamError("Test creation failed: no test id received".to_string())
            })
    }

    async fn add_questions(&self, test_id: &str, class_id: &str, questions: &[Question]) -> AppResult<()> {
        let response = self
            .post(format!(
                "{}/api/v1/teacher/tests/{}/questions",
                self.exam_api_host, test_id
            ))
            .json(&QuestionUploadRequest::new(class_id, questions))
            .send()
            .await?;

        ensure_success(response, "Failed to add questions to the test").await?;
        Ok(())
    }

    async fn update_test_settings(
        &self,
        test_id: &str,
        class_id: &str,
        settings: &TestSettings,
    ) -> AppResult<()> {
        let payload = SettingsUpdateRequest::new(class_id, &self.user_id, settings.clone());
        let response = self
            .put(format!("{}/api/v2/teacher/tests/{}", self.exam_api_host, test_id))
            .json(&payload)
            .send()
            .await?;

        ensure_success(response, "Failed to update test settings").await?;
        Ok(())
    }

    async fn publish_test(&self, test_id: &str, class_id: &str) -> AppResult<()> {
        let payload = PublishRequest {
            class_id: class_id.to_string(),
            user_id: self.user_id.clone(),
            current_role: TEACHER_ROLE,
            test_id: test_id.to_string(),
        };
        let response = self
            .put(format!(
                "{}/api/v1/teacher/tests/{}/activate",
                self.exam_api_host, test_id
            ))
            .json(&payload)
            .send()
            .await?;

        ensure_success(response, "Failed to publish the test").await?;
        Ok(())
    }
}
