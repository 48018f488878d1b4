//! Assembly of derived credential documents out of query results.
//!
//! Both derivation paths share the same envelope: a hash-based synthetic
//! identifier, the conservative validity intersection of the sources, and a
//! placeholder proof embedding the derivation metadata. The proof carries no
//! signature; it is meant to be replaced by a real integrity proof downstream.

use crate::canon::{DatasetHash, canonical_hash, text_hash};
use crate::error::DerivationError;
use oxrdf::{Graph, NamedOrBlankNodeRef, Term, TripleRef};
use oxsdatatypes::DateTime;
use oxttl::TurtleSerializer;
use oxvc::{
    CREDENTIALS_V1_CONTEXT, ContextRegistry, Credential, VERIFIABLE_CREDENTIAL_TYPE,
    ValidityPeriod,
};
use serde_json::{Map, Value as JsonValue, json};
use sparesults::QuerySolution;
use std::io;
use tracing::{debug, warn};

/// The type derived credentials carry besides the base credential type.
pub const DERIVED_CREDENTIAL_TYPE: &str = "DerivedCredential";

/// The issuer stamped on derived credentials until real signing exists.
const DERIVATION_ISSUER: &str = "urn:credential:derivation:engine";

/// The binding variable name that triggers per-subject grouping.
///
/// This is a convention, not a SPARQL feature: a query that names its subject
/// variable differently silently falls back to the single combined
/// credential.
pub const SUBJECT_VARIABLE: &str = "subject";

/// Optional presentation data for derived credentials.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct DerivationTemplate {
    types: Vec<String>,
    name: Option<String>,
    description: Option<String>,
}

impl DerivationTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a credential type next to the base and derived types.
    pub fn with_type(mut self, credential_type: impl Into<String>) -> Self {
        self.types.push(credential_type.into());
        self
    }

    /// Sets a display name for the derived credential.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a description for the derived credential.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Derives credentials from constructed statements.
///
/// When one of the selected rows binds the [`SUBJECT_VARIABLE`], the
/// statements are grouped by subject term and one credential is emitted per
/// distinct bound subject, scoped to that subject's statements only.
/// Otherwise exactly one combined credential holds everything. Assembly
/// failures abort the whole derivation; a partially assembled output would
/// not be meaningful.
pub fn derive_from_construct(
    statements: &Graph,
    selected: &[QuerySolution],
    sources: &[Credential],
    template: Option<&DerivationTemplate>,
) -> Result<Vec<Credential>, DerivationError> {
    let validity = ValidityPeriod::intersection(sources).ok_or(DerivationError::NoSources)?;
    let subjects = subject_bindings(selected);
    if subjects.is_empty() {
        debug!("no subject binding selected, deriving one combined credential");
        let credential =
            assemble_construct(statements, None, sources, validity, template)
                .map_err(DerivationError::Assembly)?;
        return Ok(vec![credential]);
    }
    let mut derived = Vec::with_capacity(subjects.len());
    for subject in &subjects {
        let subset = statements_for_subject(statements, subject);
        if subset.is_empty() {
            warn!(subject = %subject, "subject binding matches no constructed statement, skipping");
            continue;
        }
        derived.push(
            assemble_construct(&subset, Some(subject), sources, validity, template).map_err(
                |source| DerivationError::ConstructAssembly {
                    subject: subject.to_string(),
                    source,
                },
            )?,
        );
    }
    Ok(derived)
}

/// Derives one credential wrapping the raw rows of a SELECT query.
///
/// This path skips construction and canonicalization entirely: the rows go
/// verbatim into the credential subject and the fingerprint is computed over
/// the query text.
pub fn derive_from_select(
    query_text: &str,
    bindings: &[QuerySolution],
    sources: &[Credential],
    template: Option<&DerivationTemplate>,
) -> Result<Credential, DerivationError> {
    let validity = ValidityPeriod::intersection(sources).ok_or(DerivationError::NoSources)?;
    let hash = text_hash(query_text);
    let mut subject = Map::new();
    subject.insert("derivedFrom".to_owned(), source_ids(sources));
    subject.insert("sparqlQuery".to_owned(), json!(query_text));
    subject.insert(
        "queryResults".to_owned(),
        JsonValue::Array(bindings.iter().map(binding_object).collect()),
    );
    assemble_envelope(subject, &hash, None, sources, validity, template)
        .map_err(DerivationError::Assembly)
}

fn subject_bindings(selected: &[QuerySolution]) -> Vec<Term> {
    let mut subjects = Vec::new();
    for solution in selected {
        if let Some(term) = solution.get(SUBJECT_VARIABLE) {
            if !subjects.contains(term) {
                subjects.push(term.clone());
            }
        }
    }
    subjects
}

fn statements_for_subject(statements: &Graph, subject: &Term) -> Graph {
    let subject = match subject {
        Term::NamedNode(node) => NamedOrBlankNodeRef::from(node.as_ref()),
        Term::BlankNode(node) => NamedOrBlankNodeRef::from(node.as_ref()),
        // a literal can never be a statement subject
        Term::Literal(_) => return Graph::new(),
    };
    let mut subset = Graph::new();
    for triple in statements.triples_for_subject(subject) {
        subset.insert(triple);
    }
    subset
}

fn assemble_construct(
    statements: &Graph,
    subject: Option<&Term>,
    sources: &[Credential],
    validity: ValidityPeriod,
    template: Option<&DerivationTemplate>,
) -> Result<Credential, oxvc::CredentialError> {
    let hash = canonical_hash(statements);
    let mut credential_subject = Map::new();
    if let Some(Term::NamedNode(node)) = subject {
        credential_subject.insert("id".to_owned(), json!(node.as_str()));
    }
    credential_subject.insert("derivedFrom".to_owned(), source_ids(sources));
    credential_subject.insert("statements".to_owned(), json!(statements_text(statements)));
    assemble_envelope(
        credential_subject,
        &hash,
        subject.map(ToString::to_string),
        sources,
        validity,
        template,
    )
}

fn assemble_envelope(
    credential_subject: Map<String, JsonValue>,
    hash: &DatasetHash,
    subject_binding: Option<String>,
    sources: &[Credential],
    validity: ValidityPeriod,
    template: Option<&DerivationTemplate>,
) -> Result<Credential, oxvc::CredentialError> {
    let mut types = vec![
        VERIFIABLE_CREDENTIAL_TYPE.to_owned(),
        DERIVED_CREDENTIAL_TYPE.to_owned(),
    ];
    if let Some(template) = template {
        for credential_type in &template.types {
            if !types.contains(credential_type) {
                types.push(credential_type.clone());
            }
        }
    }

    let mut document = Map::new();
    document.insert("@context".to_owned(), json!([CREDENTIALS_V1_CONTEXT]));
    document.insert(
        "id".to_owned(),
        json!(format!("urn:credential:derived:{hash}")),
    );
    document.insert("type".to_owned(), json!(types));
    document.insert("issuer".to_owned(), json!(DERIVATION_ISSUER));
    document.insert(
        "issuanceDate".to_owned(),
        json!(validity.valid_from().to_string()),
    );
    if let Some(valid_until) = validity.valid_until() {
        document.insert("expirationDate".to_owned(), json!(valid_until.to_string()));
    }
    if let Some(template) = template {
        if let Some(name) = &template.name {
            document.insert("name".to_owned(), json!(name));
        }
        if let Some(description) = &template.description {
            document.insert("description".to_owned(), json!(description));
        }
    }
    document.insert(
        "credentialSubject".to_owned(),
        JsonValue::Object(credential_subject),
    );
    document.insert(
        "proof".to_owned(),
        placeholder_proof(hash, subject_binding, sources.len()),
    );
    Credential::from_json(JsonValue::Object(document))
}

/// The placeholder proof block, meant to be replaced by real signing.
fn placeholder_proof(
    hash: &DatasetHash,
    subject_binding: Option<String>,
    source_count: usize,
) -> JsonValue {
    let created = DateTime::now().to_string();
    let mut metadata = Map::new();
    metadata.insert("sourceCredentialCount".to_owned(), json!(source_count));
    metadata.insert("datasetHash".to_owned(), json!(hash.as_str()));
    metadata.insert("hashIsCanonical".to_owned(), json!(hash.is_canonical()));
    metadata.insert("derivedAt".to_owned(), json!(created));
    if let Some(subject) = subject_binding {
        metadata.insert("subjectBinding".to_owned(), json!(subject));
    }
    json!({
        "type": "DataIntegrityProof",
        "created": created,
        "proofPurpose": "assertionMethod",
        "derivationMetadata": metadata,
    })
}

fn source_ids(sources: &[Credential]) -> JsonValue {
    JsonValue::Array(
        sources
            .iter()
            .map(|credential| json!(credential.id()))
            .collect(),
    )
}

fn binding_object(solution: &QuerySolution) -> JsonValue {
    let mut row = Map::new();
    for (variable, term) in solution.iter() {
        row.insert(variable.as_str().to_owned(), json!(term_value(term)));
    }
    JsonValue::Object(row)
}

/// The plain value of a term, without N-Triples punctuation.
fn term_value(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_owned(),
        Term::BlankNode(node) => node.to_string(),
        Term::Literal(literal) => literal.value().to_owned(),
    }
}

/// Statement block rendering with the same degradation policy as
/// [`oxvc::to_turtle`]: pretty Turtle first, plain N-Triples-style lines if
/// that fails.
fn statements_text(statements: &Graph) -> String {
    match pretty_statements(statements) {
        Ok(text) => text,
        Err(error) => {
            debug!(%error, "pretty statement serialization failed, using plain lines");
            statements
                .iter()
                .map(|triple| format!("{triple} .\n"))
                .collect()
        }
    }
}

fn pretty_statements(statements: &Graph) -> io::Result<String> {
    let mut serializer = TurtleSerializer::new();
    for (name, iri) in ContextRegistry::prefixes() {
        serializer = serializer.with_prefix(name, iri).map_err(io::Error::other)?;
    }
    let mut writer = serializer.for_writer(Vec::new());
    for triple in statements.iter() {
        writer.serialize_triple(TripleRef::new(
            triple.subject,
            triple.predicate,
            triple.object,
        ))?;
    }
    let bytes = writer.finish()?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::{Literal, NamedNode, Variable};
    use serde_json::json;

    fn source(id: &str, issuance: &str, expiration: Option<&str>) -> Credential {
        let mut document = json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "id": id,
            "type": ["VerifiableCredential"],
            "issuer": "did:example:issuer",
            "issuanceDate": issuance,
            "credentialSubject": {"id": "did:example:subject"}
        });
        if let Some(expiration) = expiration {
            document["expirationDate"] = json!(expiration);
        }
        Credential::from_json(document).unwrap()
    }

    fn subject_solution(subject: &str, name: &str) -> QuerySolution {
        (
            vec![
                Variable::new_unchecked("subject"),
                Variable::new_unchecked("name"),
            ],
            vec![
                Some(NamedNode::new_unchecked(subject).into()),
                Some(Literal::new_simple_literal(name).into()),
            ],
        )
            .into()
    }

    fn name_statement(subject: &str, name: &str) -> oxrdf::Triple {
        oxrdf::Triple::new(
            NamedNode::new_unchecked(subject),
            NamedNode::new_unchecked("http://schema.org/name"),
            Literal::new_simple_literal(name),
        )
    }

    #[test]
    fn no_sources_is_a_derivation_error() {
        assert!(matches!(
            derive_from_construct(&Graph::new(), &[], &[], None),
            Err(DerivationError::NoSources)
        ));
        assert!(matches!(
            derive_from_select("SELECT * WHERE { ?s ?p ?o }", &[], &[], None),
            Err(DerivationError::NoSources)
        ));
    }

    #[test]
    fn each_selected_subject_gets_its_own_credential() {
        let mut statements = Graph::new();
        statements.insert(&name_statement("http://example.com/alice", "Alice"));
        statements.insert(&name_statement("http://example.com/bob", "Bob"));
        let selected = [
            subject_solution("http://example.com/alice", "Alice"),
            subject_solution("http://example.com/bob", "Bob"),
        ];
        let sources = [source("http://example.com/credentials/1", "2020-01-01", None)];

        let derived = derive_from_construct(&statements, &selected, &sources, None).unwrap();
        assert_eq!(derived.len(), 2);
        assert_eq!(derived[0].subject_id(), Some("http://example.com/alice"));
        assert_eq!(derived[1].subject_id(), Some("http://example.com/bob"));
        // each credential is scoped to its own subject's statements
        let alice_statements = derived[0].credential_subject().unwrap()["statements"]
            .as_str()
            .unwrap()
            .to_owned();
        assert!(alice_statements.contains("Alice"));
        assert!(!alice_statements.contains("Bob"));
    }

    #[test]
    fn without_a_subject_binding_one_combined_credential_is_emitted() {
        let mut statements = Graph::new();
        statements.insert(&name_statement("http://example.com/alice", "Alice"));
        statements.insert(&name_statement("http://example.com/bob", "Bob"));
        let selected = [(
            vec![Variable::new_unchecked("person")],
            vec![Some(Term::from(NamedNode::new_unchecked(
                "http://example.com/alice",
            )))],
        )
            .into()];
        let sources = [source("http://example.com/credentials/1", "2020-01-01", None)];

        let derived = derive_from_construct(&statements, &selected, &sources, None).unwrap();
        assert_eq!(derived.len(), 1);
        let statements_block = derived[0].credential_subject().unwrap()["statements"]
            .as_str()
            .unwrap()
            .to_owned();
        assert!(statements_block.contains("Alice"));
        assert!(statements_block.contains("Bob"));
    }

    #[test]
    fn the_envelope_carries_the_validity_intersection() {
        let sources = [
            source("http://example.com/credentials/1", "2020-01-01", None),
            source(
                "http://example.com/credentials/2",
                "2021-06-01",
                Some("2030-01-01"),
            ),
        ];
        let derived =
            derive_from_select("SELECT * WHERE { ?s ?p ?o }", &[], &sources, None).unwrap();
        assert_eq!(
            derived.issuance_date(),
            "2021-06-01T00:00:00".parse().unwrap()
        );
        assert_eq!(
            derived.expiration_date(),
            Some("2030-01-01T00:00:00".parse().unwrap())
        );
    }

    #[test]
    fn the_select_path_wraps_rows_and_hashes_the_query_text() {
        let sources = [source("http://example.com/credentials/1", "2020-01-01", None)];
        let rows = [subject_solution("http://example.com/alice", "Alice")];
        let query = "SELECT ?subject ?name WHERE { ?subject ?p ?name }";
        let derived = derive_from_select(query, &rows, &sources, None).unwrap();

        let subject = derived.credential_subject().unwrap();
        assert_eq!(subject["sparqlQuery"], json!(query));
        assert_eq!(
            subject["queryResults"],
            json!([{"subject": "http://example.com/alice", "name": "Alice"}])
        );
        assert_eq!(
            subject["derivedFrom"],
            json!(["http://example.com/credentials/1"])
        );
        assert_eq!(
            derived.id(),
            format!("urn:credential:derived:{}", text_hash(query))
        );

        let again = derive_from_select(query, &rows, &sources, None).unwrap();
        assert_eq!(again.id(), derived.id());
    }

    #[test]
    fn the_proof_embeds_the_derivation_metadata() {
        let sources = [
            source("http://example.com/credentials/1", "2020-01-01", None),
            source("http://example.com/credentials/2", "2020-02-01", None),
        ];
        let mut statements = Graph::new();
        statements.insert(&name_statement("http://example.com/alice", "Alice"));
        let selected = [subject_solution("http://example.com/alice", "Alice")];

        let derived = derive_from_construct(&statements, &selected, &sources, None).unwrap();
        let proof = derived[0].proof().unwrap();
        assert_eq!(proof["type"], json!("DataIntegrityProof"));
        let metadata = &proof["derivationMetadata"];
        assert_eq!(metadata["sourceCredentialCount"], json!(2));
        assert_eq!(metadata["hashIsCanonical"], json!(true));
        assert_eq!(
            metadata["subjectBinding"],
            json!("<http://example.com/alice>")
        );
        assert_eq!(
            derived[0].id(),
            format!("urn:credential:derived:{}", metadata["datasetHash"].as_str().unwrap())
        );
    }

    #[test]
    fn derived_types_include_template_types() {
        let sources = [source("http://example.com/credentials/1", "2020-01-01", None)];
        let template = DerivationTemplate::new()
            .with_type("SummaryCredential")
            .with_name("Summary")
            .with_description("A derived summary");
        let derived =
            derive_from_select("SELECT * WHERE { ?s ?p ?o }", &[], &sources, Some(&template))
                .unwrap();
        assert_eq!(
            derived.types(),
            ["VerifiableCredential", "DerivedCredential", "SummaryCredential"]
        );
        assert_eq!(derived.as_object()["name"], json!("Summary"));
    }
}
