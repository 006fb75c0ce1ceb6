use actix_multipart::{form::MultipartFormConfig, MultipartError};
use actix_web::{
    web,
    http::StatusCode,
    ResponseError,
    HttpResponse,
    error::{JsonPayloadError, QueryPayloadError},
};
use derive_more::Display;
use serde_json::json;

use crate::constants::MULTIPART_TOTAL_LIMIT;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        PayloadError::from(err).into()
    }));

    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        PayloadError::from(err).into()
    }));

    cfg.app_data(
        MultipartFormConfig::default()
            .total_limit(MULTIPART_TOTAL_LIMIT)
            .error_handler(|err, _req| PayloadError::from(err).into()),
    );
}

#[derive(Debug, Display)]
#[display("{message}")]
pub struct PayloadError {
    message: String,
    status: StatusCode,
}

impl ResponseError for PayloadError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<actix_web::body::BoxBody> {
        HttpResponse::build(self.status).json(json!({ "error": self.message }))
    }
}

impl From<JsonPayloadError> for PayloadError {
    fn from(err: JsonPayloadError) -> Self {
        let status = match &err {
            JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            JsonPayloadError::Deserialize(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::BAD_REQUEST,
        };

        PayloadError {
            message: format!("JSON payload error: {}", err),
            status,
        }
    }
}

impl From<QueryPayloadError> for PayloadError {
    fn from(err: QueryPayloadError) -> Self {
        PayloadError {
            message: format!("Query string error: {}", err),
            status: StatusCode::BAD_REQUEST,
        }
    }
}

impl From<MultipartError> for PayloadError {
    fn from(err: MultipartError) -> Self {
        let status = err.status_code();

        PayloadError {
            message: format!("Multipart form error: {}", err),
            status,
        }
    }
}
