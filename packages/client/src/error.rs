use common::deeplink::DeepLinkError;
use common::media::UploadRejection;
use common::storage::StorageError;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Refused locally; nothing was sent.
    #[error("upload rejected: {0}")]
    Rejected(#[from] UploadRejection),

    #[error("server returned {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("media cache: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    DeepLink(#[from] DeepLinkError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Pass successful responses through; turn the rest into [`ClientError::Api`].
pub(crate) async fn check(res: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let text = res.text().await.unwrap_or_default();
    let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => (body.code, body.message),
        Err(_) => (
            status
                .canonical_reason()
                .unwrap_or("UNKNOWN")
                .to_ascii_uppercase()
                .replace(' ', "_"),
            text,
        ),
    };
    Err(ClientError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}
