use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed schedule payload: {0}")]
    Payload(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid date {value:?} for game {game_pk}: {source}")]
    DateParse {
        game_pk: i64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("A refresh is already in progress")]
    RefreshInProgress,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Http(_) | AppError::Payload(_) => StatusCode::BAD_GATEWAY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RefreshInProgress => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_by_failure_kind() {
        let status = |e: AppError| e.into_response().status();
        assert_eq!(status(AppError::Payload("missing gamePk".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(status(AppError::BadRequest("date".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(AppError::RefreshInProgress), StatusCode::CONFLICT);
        assert_eq!(status(AppError::Config("LOOKBACK_DAYS".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
