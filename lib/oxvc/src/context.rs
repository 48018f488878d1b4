//! Resolution of well-known JSON-LD contexts from bundled documents.
//!
//! Credential materialization never fetches a remote context: every context
//! IRI a document references must be registered here, either as one of the
//! bundled well-known documents or as a caller-supplied one.

use oxjsonld::{JsonLdLoadDocumentOptions, JsonLdRemoteDocument};
use std::collections::HashMap;
use std::error::Error;

/// The W3C credentials v1 context.
pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";

/// The W3C citizenship v1 context.
pub const CITIZENSHIP_V1_CONTEXT: &str = "https://w3id.org/citizenship/v1";

/// The W3C credentials examples v1 context.
pub const CREDENTIAL_EXAMPLES_V1_CONTEXT: &str =
    "https://www.w3.org/2018/credentials/examples/v1";

const CREDENTIALS_V1_DOCUMENT: &str = r#"{
  "@context": {
    "@protected": true,
    "id": "@id",
    "type": "@type",
    "cred": "https://www.w3.org/2018/credentials#",
    "sec": "https://w3id.org/security#",
    "xsd": "http://www.w3.org/2001/XMLSchema#",
    "VerifiableCredential": "cred:VerifiableCredential",
    "VerifiablePresentation": "cred:VerifiablePresentation",
    "credentialSubject": {"@id": "cred:credentialSubject", "@type": "@id"},
    "issuer": {"@id": "cred:issuer", "@type": "@id"},
    "issuanceDate": {"@id": "cred:issuanceDate", "@type": "xsd:dateTime"},
    "expirationDate": {"@id": "cred:expirationDate", "@type": "xsd:dateTime"},
    "holder": {"@id": "cred:holder", "@type": "@id"},
    "proof": {"@id": "sec:proof", "@type": "@id"},
    "name": "http://schema.org/name",
    "description": "http://schema.org/description"
  }
}"#;

const CITIZENSHIP_V1_DOCUMENT: &str = r#"{
  "@context": {
    "@protected": true,
    "id": "@id",
    "type": "@type",
    "ctzn": "https://w3id.org/citizenship#",
    "schema": "http://schema.org/",
    "xsd": "http://www.w3.org/2001/XMLSchema#",
    "PermanentResident": "ctzn:PermanentResident",
    "PermanentResidentCard": "ctzn:PermanentResidentCard",
    "Person": "schema:Person",
    "birthCountry": "ctzn:birthCountry",
    "birthDate": {"@id": "schema:birthDate", "@type": "xsd:dateTime"},
    "commuterClassification": "ctzn:commuterClassification",
    "familyName": "schema:familyName",
    "gender": "schema:gender",
    "givenName": "schema:givenName",
    "image": {"@id": "schema:image", "@type": "@id"},
    "lprCategory": "ctzn:lprCategory",
    "lprNumber": "ctzn:lprNumber",
    "residentSince": {"@id": "ctzn:residentSince", "@type": "xsd:dateTime"}
  }
}"#;

const CREDENTIAL_EXAMPLES_V1_DOCUMENT: &str = r#"{
  "@context": {
    "@vocab": "https://example.org/examples#",
    "id": "@id",
    "type": "@type"
  }
}"#;

/// The prefixes matching the bundled vocabularies, for pretty serializations.
const PREFIXES: &[(&str, &str)] = &[
    ("cred", "https://www.w3.org/2018/credentials#"),
    ("ctzn", "https://w3id.org/citizenship#"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("schema", "http://schema.org/"),
    ("sec", "https://w3id.org/security#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

/// A declarative mapping from context IRIs to JSON-LD context documents.
///
/// ```
/// use oxvc::{ContextRegistry, CREDENTIALS_V1_CONTEXT};
///
/// let registry = ContextRegistry::new();
/// assert!(registry.document(CREDENTIALS_V1_CONTEXT).is_some());
/// assert!(registry.document("http://example.com/unknown").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContextRegistry {
    custom: HashMap<String, String>,
}

impl ContextRegistry {
    /// Builds a registry holding the bundled well-known contexts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an extra context document.
    ///
    /// Caller-supplied documents take precedence over the bundled ones.
    #[must_use]
    pub fn with_document(mut self, iri: impl Into<String>, document: impl Into<String>) -> Self {
        self.custom.insert(iri.into(), document.into());
        self
    }

    /// The context document registered for an IRI, if any.
    pub fn document(&self, iri: &str) -> Option<&str> {
        self.custom
            .get(iri)
            .map(String::as_str)
            .or_else(|| bundled_document(iri))
    }

    /// Loads a context document the way [`oxjsonld`] expects from its
    /// `load_document_callback`.
    pub fn load_remote(
        &self,
        url: &str,
        _options: &JsonLdLoadDocumentOptions,
    ) -> Result<JsonLdRemoteDocument, Box<dyn Error + Send + Sync>> {
        let Some(document) = self.document(url) else {
            return Err(format!(
                "unknown JSON-LD context <{url}>: only registered contexts can be loaded"
            )
            .into());
        };
        Ok(JsonLdRemoteDocument {
            document: document.as_bytes().to_vec(),
            document_url: url.into(),
        })
    }

    /// The (prefix name, prefix IRI) pairs matching the bundled vocabularies.
    pub fn prefixes() -> impl Iterator<Item = (&'static str, &'static str)> {
        PREFIXES.iter().copied()
    }
}

fn bundled_document(iri: &str) -> Option<&'static str> {
    match iri {
        CREDENTIALS_V1_CONTEXT => Some(CREDENTIALS_V1_DOCUMENT),
        CITIZENSHIP_V1_CONTEXT => Some(CITIZENSHIP_V1_DOCUMENT),
        CREDENTIAL_EXAMPLES_V1_CONTEXT => Some(CREDENTIAL_EXAMPLES_V1_DOCUMENT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_contexts_are_valid_json() {
        for iri in [
            CREDENTIALS_V1_CONTEXT,
            CITIZENSHIP_V1_CONTEXT,
            CREDENTIAL_EXAMPLES_V1_CONTEXT,
        ] {
            let registry = ContextRegistry::new();
            let document = registry.document(iri).unwrap();
            serde_json::from_str::<serde_json::Value>(document).unwrap();
        }
    }

    #[test]
    fn custom_documents_shadow_bundled_ones() {
        let registry =
            ContextRegistry::new().with_document(CREDENTIALS_V1_CONTEXT, r#"{"@context": {}}"#);
        assert_eq!(
            registry.document(CREDENTIALS_V1_CONTEXT),
            Some(r#"{"@context": {}}"#)
        );
    }

    #[test]
    fn unknown_contexts_are_not_loaded() {
        let options = JsonLdLoadDocumentOptions {
            request_profile: oxjsonld::JsonLdProfileSet::empty(),
        };
        let error = ContextRegistry::new()
            .load_remote("http://example.com/unknown", &options)
            .err()
            .unwrap();
        assert!(error.to_string().contains("http://example.com/unknown"));
    }
}
