use reqwest::StatusCode;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop a poll cycle. Nothing in the core catches these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request to {service} failed")]
    Network {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} request failed with status {status}: {body}")]
    HttpStatus {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to parse {service} response: {reason}")]
    Parse {
        service: &'static str,
        reason: String,
    },

    #[error("SMTP authentication failed")]
    Auth(#[source] lettre::transport::smtp::Error),

    #[error("failed to send notification email")]
    Send(#[source] lettre::transport::smtp::Error),

    #[error("invalid notifier setup: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn parse(service: &'static str, reason: impl ToString) -> Self {
        Self::Parse { service, reason: reason.to_string() }
    }

    pub(crate) fn http_status(service: &'static str, status: StatusCode, body: &str) -> Self {
        Self::HttpStatus { service, status, body: truncate_body(body) }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
