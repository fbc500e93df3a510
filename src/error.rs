use reqwest::StatusCode;

/// Failure to obtain a token from the authorization server.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("token request for '{target}' failed: {source}")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("token request for '{target}' returned {status}: {body}")]
    Status {
        target: String,
        status: StatusCode,
        body: String,
    },
    #[error("malformed token response for '{target}': {reason}")]
    MalformedResponse { target: String, reason: String },
}

impl FetchError {
    pub fn target(&self) -> &str {
        match self {
            FetchError::Transport { target, .. }
            | FetchError::Status { target, .. }
            | FetchError::MalformedResponse { target, .. } => target,
        }
    }

    /// Best-effort description of what went wrong, without the target.
    /// For rejected requests this is the server's error body.
    pub fn detail(&self) -> String {
        match self {
            FetchError::Transport { source, .. } => source.to_string(),
            FetchError::Status { status, body, .. } if body.is_empty() => status.to_string(),
            FetchError::Status { body, .. } => body.to_owned(),
            FetchError::MalformedResponse { reason, .. } => reason.to_owned(),
        }
    }

    /// Short label used for the failure metric.
    pub fn reason(&self) -> &'static str {
        match self {
            FetchError::Transport { source, .. } if source.is_timeout() => "timeout",
            FetchError::Transport { .. } => "transport",
            FetchError::Status { .. } => "status",
            FetchError::MalformedResponse { .. } => "malformed",
        }
    }
}

/// Failure to send a request through a [`crate::transport::HookedClient`].
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// A registered hook refused the request; it was not sent.
    #[error("request hook failed: {0:#}")]
    Hook(anyhow::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl SendError {
    /// The token failure behind a hook rejection, if that is what happened.
    pub fn as_fetch_error(&self) -> Option<&FetchError> {
        match self {
            SendError::Hook(err) => err.downcast_ref::<FetchError>(),
            SendError::Http(_) => None,
        }
    }
}
