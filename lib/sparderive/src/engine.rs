//! The facade the caller layer drives.

use crate::classify::{QueryForm, classify};
use crate::construct::{ExtractedSelect, bind_template, select_from_construct};
use crate::derive::{DerivationTemplate, derive_from_construct, derive_from_select};
use crate::error::{DerivationError, QueryError};
use crate::exec::execute_select;
use oxrdf::Graph;
use oxvc::{ContextRegistry, Credential, materialize_with};
use spargebra::Query;
use sparesults::QuerySolution;

/// Runs queries over credential sets and derives new credentials from the
/// results.
///
/// Each operation materializes its own statement set from the given
/// credentials and discards it afterwards; the engine itself keeps no graph
/// state between calls.
///
/// ```
/// use oxvc::Credential;
/// use sparderive::CredentialQueryEngine;
///
/// let credential: Credential = r#"{
///     "@context": ["https://www.w3.org/2018/credentials/v1"],
///     "id": "http://example.com/credentials/1",
///     "type": ["VerifiableCredential"],
///     "issuer": "did:example:issuer",
///     "issuanceDate": "2020-01-01T00:00:00Z"
/// }"#
/// .parse()?;
/// let rows = CredentialQueryEngine::new().execute_query(
///     "SELECT ?issuer WHERE { ?c <https://www.w3.org/2018/credentials#issuer> ?issuer }",
///     &[credential],
/// )?;
/// assert_eq!(rows.len(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct CredentialQueryEngine {
    registry: ContextRegistry,
}

impl CredentialQueryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an extra JSON-LD context document for materialization.
    pub fn with_context_document(
        mut self,
        iri: impl Into<String>,
        document: impl Into<String>,
    ) -> Self {
        self.registry = self.registry.with_document(iri, document);
        self
    }

    /// The context registry the engine materializes with.
    pub fn registry(&self) -> &ContextRegistry {
        &self.registry
    }

    /// Runs a query over the credentials and returns its bindings.
    ///
    /// SELECT runs directly; CONSTRUCT runs as its extracted SELECT so the
    /// caller previews rows before constructing anything. Everything else is
    /// refused.
    pub fn execute_query(
        &self,
        text: &str,
        credentials: &[Credential],
    ) -> Result<Vec<QuerySolution>, QueryError> {
        let classified = classify(text)?;
        let materialized = materialize_with(credentials, &self.registry);
        execute_select(classified.query(), materialized.dataset())
    }

    /// Derives the previewable SELECT from a CONSTRUCT query text.
    pub fn extract_select_from_construct(&self, text: &str) -> Result<ExtractedSelect, QueryError> {
        select_from_construct(classify(text)?.query())
    }

    /// Instantiates a CONSTRUCT template with the rows the caller selected.
    pub fn construct_from_selection(
        &self,
        text: &str,
        selected: &[QuerySolution],
    ) -> Result<Graph, QueryError> {
        let classified = classify(text)?;
        let Query::Construct { template, .. } = classified.query() else {
            return Err(QueryError::ExpectedConstruct(classified.form()));
        };
        Ok(bind_template(template, selected))
    }

    /// Runs a SELECT query and wraps its rows into one derived credential.
    pub fn derive_credential(
        &self,
        text: &str,
        credentials: &[Credential],
        template: Option<&DerivationTemplate>,
    ) -> Result<Credential, DerivationError> {
        let classified = classify(text)?;
        if classified.form() != QueryForm::Select {
            return Err(QueryError::ExpectedSelect(classified.form()).into());
        }
        let materialized = materialize_with(credentials, &self.registry);
        let bindings = execute_select(classified.query(), materialized.dataset())?;
        derive_from_select(text, &bindings, credentials, template)
    }

    /// Derives credentials from constructed statements and the rows that
    /// produced them.
    pub fn derive_credentials_from_construct(
        &self,
        statements: &Graph,
        selected: &[QuerySolution],
        credentials: &[Credential],
        template: Option<&DerivationTemplate>,
    ) -> Result<Vec<Credential>, DerivationError> {
        derive_from_construct(statements, selected, credentials, template)
    }
}
