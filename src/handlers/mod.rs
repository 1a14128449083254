pub mod health_handler;
pub mod test_handler;

use actix_web::web;

use crate::errors::AppError;

pub use health_handler::health_check;
pub use test_handler::{generate_test, transcript_generated};

/// JSON extractor settings that report unreadable bodies in the standard
/// error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid JSON body: {}", err)).into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(health_check)
        .service(generate_test)
        .service(transcript_generated);
}
