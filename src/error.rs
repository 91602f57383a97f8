use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("GitLab API error: {status} {message}")]
    Api { status: u16, message: String },

    #[error("trigger {0} has no usable token value")]
    TokenUnavailable(u64),
}

pub type Result<T> = std::result::Result<T, RelayError>;
