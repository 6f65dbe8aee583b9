//! Failures that can arise when talking to a scanner.
use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required credential variable was not provided.
    #[error("missing credentials: {0} is not set")]
    CredentialsMissing(&'static str),
    /// The connection settings could not be assembled into a client.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// The request could not be carried out or the body could not be read.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    /// The scanner answered with a status other than 200.
    #[error("unexpected HTTP status {0}")]
    UnexpectedStatus(StatusCode),
    /// The scanner answered 200 but the XML did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Self {
        Self::MalformedResponse(e.to_string())
    }
}
