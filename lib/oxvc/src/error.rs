use oxjsonld::JsonLdParseError;

/// An error raised while validating or materializing a credential document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CredentialError {
    /// The document is not shaped like a credential.
    #[error("invalid credential document: {0}")]
    InvalidFormat(String),
    /// A mandatory credential field is absent.
    #[error("missing mandatory credential field `{0}`")]
    MissingField(&'static str),
    /// The `@context` entry is missing the base credential context or is malformed.
    #[error("invalid credential context: {0}")]
    InvalidContext(String),
    /// The `type` entry is missing the base credential type or is malformed.
    #[error("invalid credential type: {0}")]
    InvalidType(String),
    /// A date field does not hold an XSD date or date/time value.
    #[error("invalid credential date: {0}")]
    InvalidDate(String),
    /// A JSON-LD context redefines a protected term.
    #[error("invalid JSON-LD context: {0}")]
    InvalidJsonLdContext(String),
    /// The document-to-graph conversion failed.
    #[error(transparent)]
    JsonLd(#[from] JsonLdParseError),
}
