use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use paygate_engine::{
    db_types::PaymentType,
    traits::{AccountApiError, ExchangeRateError},
    OrderFlowError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Missing or invalid credentials. {0}")]
    Unauthorized(String),
    #[error("{0} payments are not available on this server")]
    RailNotAvailable(PaymentType),
    #[error("{0}")]
    OrderFlow(#[from] OrderFlowError),
}

impl ServerError {
    /// The machine-readable error code returned alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            Self::OrderFlow(e) => e.code(),
            Self::InvalidRequestBody(_) => "INVALID_REQUEST",
            Self::NoRecordFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::RailNotAvailable(_) => "RAIL_NOT_AVAILABLE",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::RailNotAvailable(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::OrderFlow(e) => match e {
                OrderFlowError::OrderNotFound(_) | OrderFlowError::ProductNotFound(_) => StatusCode::NOT_FOUND,
                OrderFlowError::OrderMaxCountReached { .. } |
                OrderFlowError::OrderStatusInvalid { .. } |
                OrderFlowError::OrderAlreadyResolved { .. } => StatusCode::CONFLICT,
                OrderFlowError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
                OrderFlowError::Rail(_) | OrderFlowError::Transfer(_) => StatusCode::BAD_GATEWAY,
                OrderFlowError::Database(_) | OrderFlowError::Fulfilment { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string(), "code": self.code() }).to_string())
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        Self::BackendError(e.to_string())
    }
}

impl From<ExchangeRateError> for ServerError {
    fn from(e: ExchangeRateError) -> Self {
        match e {
            ExchangeRateError::RateDoesNotExist(_) => Self::NoRecordFound(e.to_string()),
            ExchangeRateError::DatabaseError(_) => Self::BackendError(e.to_string()),
        }
    }
}
