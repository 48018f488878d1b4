use crate::classify::QueryForm;
use oxvc::CredentialError;
use spareval::QueryEvaluationError;
use spargebra::SparqlSyntaxError;
use std::fmt;

/// An error raised while classifying or evaluating a query.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryError {
    /// The query text is not valid SPARQL, parser message preserved.
    #[error(transparent)]
    Syntax(#[from] SparqlSyntaxError),
    /// The query parsed into an operation this pipeline refuses to run.
    #[error("unsupported {0} operation: only SELECT and CONSTRUCT queries can run")]
    Unsupported(UnsupportedOperation),
    /// The evaluation engine failed, message preserved.
    #[error(transparent)]
    Evaluation(#[from] QueryEvaluationError),
    /// A CONSTRUCT-only operation received another query form.
    #[error("expected a CONSTRUCT query but got a {0} query")]
    ExpectedConstruct(QueryForm),
    /// A SELECT-only operation received another query form.
    #[error("expected a SELECT query but got a {0} query")]
    ExpectedSelect(QueryForm),
    #[doc(hidden)]
    #[error("the evaluation engine returned a non-bindings result for a SELECT query")]
    UnexpectedResultForm,
}

/// A syntactically valid operation the pipeline does not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum UnsupportedOperation {
    Ask,
    Describe,
    Update,
}

impl fmt::Display for UnsupportedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ask => "ASK",
            Self::Describe => "DESCRIBE",
            Self::Update => "update",
        })
    }
}

/// An error raised while assembling derived credentials.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DerivationError {
    /// Derivation needs at least one source credential.
    #[error("cannot derive a credential from an empty source credential set")]
    NoSources,
    /// Running the originating query failed.
    #[error(transparent)]
    Query(#[from] QueryError),
    /// The assembled document did not validate as a credential.
    #[error("derived credential assembly failed: {0}")]
    Assembly(#[source] CredentialError),
    /// The assembled document for one subject group did not validate.
    #[error("derived credential assembly failed for subject binding {subject}: {source}")]
    ConstructAssembly {
        /// The subject binding whose group failed.
        subject: String,
        #[source]
        source: CredentialError,
    },
}
