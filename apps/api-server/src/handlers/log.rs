//! Client log sink.

use actix_web::{HttpResponse, web};

use restgate_shared::dto::LogRequest;

/// Level a client log line is written at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientLogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl ClientLogLevel {
    /// `fatal` maps to error; unknown levels to info.
    pub fn parse(level: &str) -> Self {
        match level.to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "warn" => Self::Warn,
            "error" | "fatal" => Self::Error,
            _ => Self::Info,
        }
    }
}

/// POST /api/log/{level}
pub async fn client_log(level: web::Path<String>, body: web::Json<LogRequest>) -> HttpResponse {
    let LogRequest { url, message } = body.into_inner();

    match ClientLogLevel::parse(&level) {
        ClientLogLevel::Trace => tracing::trace!(target: "client", url = %url, "{message}"),
        ClientLogLevel::Debug => tracing::debug!(target: "client", url = %url, "{message}"),
        ClientLogLevel::Info => tracing::info!(target: "client", url = %url, "{message}"),
        ClientLogLevel::Warn => tracing::warn!(target: "client", url = %url, "{message}"),
        ClientLogLevel::Error => tracing::error!(target: "client", url = %url, "{message}"),
    }

    HttpResponse::NoContent().finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(ClientLogLevel::parse("trace"), ClientLogLevel::Trace);
        assert_eq!(ClientLogLevel::parse("WARN"), ClientLogLevel::Warn);
        assert_eq!(ClientLogLevel::parse("fatal"), ClientLogLevel::Error);
        assert_eq!(ClientLogLevel::parse("verbose"), ClientLogLevel::Info);
    }
}
