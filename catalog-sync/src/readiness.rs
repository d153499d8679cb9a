use axum::http::StatusCode;
use tokio_util::sync::CancellationToken;

/// Readiness for `/_readiness`: 200 while the consumer loops run, 503 once
/// shutdown has begun or a loop has died.
#[derive(Clone)]
pub struct ReadinessHandler {
    shutdown_token: CancellationToken,
}

impl ReadinessHandler {
    pub fn new(shutdown_token: CancellationToken) -> Self {
        Self { shutdown_token }
    }

    pub async fn check(&self) -> StatusCode {
        if self.shutdown_token.is_cancelled() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::OK
        }
    }
}
