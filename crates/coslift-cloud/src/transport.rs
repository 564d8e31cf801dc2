#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request to {url} failed")]
    Request { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
}

impl TransportError {
    /// HTTP status code, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Request { source, .. } => source.status().map(|s| s.as_u16()),
            TransportError::Status { status, .. } => Some(*status),
        }
    }
}
