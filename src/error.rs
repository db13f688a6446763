// Error types for gusset parsers and builders

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(String),

    #[error("Invalid cookie: {0}")]
    InvalidCookie(String),

    #[error("Invalid path template: {0}")]
    InvalidTemplate(String),

    #[error("Conflicting path template: {0}")]
    TemplateConflict(String),

    #[error("Invalid percent-encoding: {0}")]
    InvalidUrlEncoding(String),

    #[error("Invalid ACL rule: {0}")]
    InvalidAclRule(String),

    #[error("Malformed multipart stream: {0}")]
    MalformedMultipart(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),
}

pub type Result<T> = std::result::Result<T, Error>;
