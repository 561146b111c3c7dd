use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The API refused the request. {0}")]
    ApiError(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}
