use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{method} {path} failed with status {status}: {body}")]
    Status {
        method: http::Method,
        path: String,
        status: http::StatusCode,
        body: String,
    },
    #[error("{0} is still rate limited after retries")]
    RateLimited(String),
    #[error("Invalid response for {0}: {1}")]
    ResponseType(String, serde_json::Error),
}

#[derive(Error, Debug)]
pub enum EventError {
    #[error("Event {0} has no field {1}")]
    MissingField(&'static str, &'static str),
}
