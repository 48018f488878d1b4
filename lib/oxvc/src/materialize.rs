//! Projection of credential batches into a single queryable RDF dataset.

use crate::context::ContextRegistry;
use crate::error::CredentialError;
use crate::model::Credential;
use oxjsonld::{JsonLdParseError, JsonLdParser, JsonLdProcessingMode};
use oxrdf::{Dataset, GraphName, Quad};
use tracing::{debug, warn};

/// The outcome of one materialization pass.
///
/// The dataset only holds default-graph statements: document-to-graph
/// conversion may put statements into per-document named graphs, and those
/// must not leak into the combined dataset the queries run against.
#[derive(Debug, Default)]
pub struct Materialized {
    dataset: Dataset,
    total_statements: usize,
    skipped: Vec<SkippedCredential>,
    source_count: usize,
}

impl Materialized {
    /// The combined default-graph statements of all usable credentials.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Consumes the outcome, keeping only the statements.
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    /// How many statements the conversions produced, named graphs included.
    pub fn total_statements(&self) -> usize {
        self.total_statements
    }

    /// How many statements ended up queryable.
    pub fn usable_statements(&self) -> usize {
        self.dataset.len()
    }

    /// The credentials whose conversion failed, with the failure preserved.
    pub fn skipped(&self) -> &[SkippedCredential] {
        &self.skipped
    }

    /// How many credentials were materialized.
    pub fn source_count(&self) -> usize {
        self.source_count
    }

    /// How many credentials contributed statements.
    pub fn usable_sources(&self) -> usize {
        self.source_count - self.skipped.len()
    }
}

/// A credential dropped during materialization.
#[derive(Debug)]
pub struct SkippedCredential {
    id: String,
    error: CredentialError,
}

impl SkippedCredential {
    /// The identifier of the dropped credential.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Why the credential was dropped.
    pub fn error(&self) -> &CredentialError {
        &self.error
    }
}

/// Converts credentials into one combined default-graph dataset.
///
/// Each credential converts independently: a malformed context or term drops
/// that credential (recorded on the outcome) without aborting the batch. Zero
/// usable statements is a valid, queryable empty state.
pub fn materialize(credentials: &[Credential]) -> Materialized {
    materialize_with(credentials, &ContextRegistry::new())
}

/// Same as [`materialize`] with an explicit context registry.
pub fn materialize_with(credentials: &[Credential], registry: &ContextRegistry) -> Materialized {
    let mut materialized = Materialized {
        source_count: credentials.len(),
        ..Materialized::default()
    };
    for credential in credentials {
        match credential_quads(credential, registry) {
            Ok(quads) => {
                materialized.total_statements += quads.len();
                for quad in &quads {
                    if quad.graph_name == GraphName::DefaultGraph {
                        materialized.dataset.insert(quad);
                    }
                }
            }
            Err(error) => {
                warn!(
                    credential = credential.id(),
                    %error,
                    "skipping credential during materialization"
                );
                materialized.skipped.push(SkippedCredential {
                    id: credential.id().to_owned(),
                    error,
                });
            }
        }
    }
    debug!(
        sources = materialized.source_count,
        usable_sources = materialized.usable_sources(),
        total_statements = materialized.total_statements,
        usable_statements = materialized.usable_statements(),
        "materialized credential batch"
    );
    materialized
}

/// Converts a single credential, buffering its statements so that a failing
/// credential contributes nothing at all.
fn credential_quads(
    credential: &Credential,
    registry: &ContextRegistry,
) -> Result<Vec<Quad>, CredentialError> {
    let bytes = serde_json::to_vec(credential.as_object())
        .map_err(|e| CredentialError::InvalidFormat(e.to_string()))?;
    let loader_registry = registry.clone();
    let parser = JsonLdParser::new()
        .with_processing_mode(JsonLdProcessingMode::JsonLd1_1)
        .for_slice(&bytes)
        .with_load_document_callback(move |url, options| {
            loader_registry.load_remote(url, options)
        });
    let mut quads = Vec::new();
    for quad in parser {
        quads.push(quad.map_err(|e| classify_json_ld_error(e.into()))?);
    }
    Ok(quads)
}

fn classify_json_ld_error(error: JsonLdParseError) -> CredentialError {
    // oxjsonld reports a protected term override as a plain syntax error;
    // keep it distinguishable since it means the context itself is hostile.
    if matches!(&error, JsonLdParseError::Syntax(e) if e.to_string().contains("protected term")) {
        CredentialError::InvalidJsonLdContext(error.to_string())
    } else {
        CredentialError::JsonLd(error)
    }
}
