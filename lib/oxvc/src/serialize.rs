//! Credential to Turtle rendering with an explicit fallback chain.
//!
//! The primary strategy goes through the regular document-to-graph pipeline
//! and the pretty Turtle serializer. When it fails the manual writer takes
//! over: a direct field walk over the document that trades formatting quality
//! for totality. [`to_turtle`] therefore never fails.

use crate::context::{CITIZENSHIP_V1_CONTEXT, ContextRegistry};
use crate::materialize::materialize_with;
use crate::model::Credential;
use crate::vocab::{cred, ctzn};
use oxiri::IriParseError;
use oxrdf::TripleRef;
use oxrdf::vocab::{rdf, xsd};
use oxsdatatypes::DateTime;
use oxttl::TurtleSerializer;
use serde_json::{Map, Value as JsonValue};
use std::fmt::Write;
use std::io;
use std::slice;
use tracing::debug;

type Strategy = fn(&Credential, &ContextRegistry) -> Result<String, StrategyError>;

/// Ordered fallback chain: the first strategy that succeeds wins.
const STRATEGIES: &[(&str, Strategy)] = &[("pretty", pretty_turtle), ("manual", manual_turtle)];

/// Renders a credential as Turtle, degrading instead of failing.
///
/// ```
/// use oxvc::{Credential, to_turtle};
///
/// let credential: Credential = r#"{
///     "@context": ["https://www.w3.org/2018/credentials/v1"],
///     "id": "http://example.com/credentials/42",
///     "type": ["VerifiableCredential"],
///     "issuer": "did:example:university",
///     "issuanceDate": "2020-01-01T00:00:00Z"
/// }"#
/// .parse()?;
/// assert!(to_turtle(&credential).contains("did:example:university"));
/// # Result::<_, oxvc::CredentialError>::Ok(())
/// ```
pub fn to_turtle(credential: &Credential) -> String {
    to_turtle_with(credential, &ContextRegistry::new())
}

/// Same as [`to_turtle`] with an explicit context registry.
pub fn to_turtle_with(credential: &Credential, registry: &ContextRegistry) -> String {
    for (name, strategy) in STRATEGIES {
        match strategy(credential, registry) {
            Ok(text) => return text,
            Err(error) => debug!(
                strategy = name,
                %error,
                "turtle strategy failed, falling back to the next one"
            ),
        }
    }
    // the manual writer is total, so the chain cannot be exhausted
    String::new()
}

#[derive(Debug, thiserror::Error)]
enum StrategyError {
    #[error("credential conversion failed: {0}")]
    Conversion(String),
    #[error("the conversion produced no statements")]
    EmptyGraph,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Prefix(#[from] IriParseError),
}

/// The regular pipeline: document-to-graph conversion, then pretty Turtle.
fn pretty_turtle(
    credential: &Credential,
    registry: &ContextRegistry,
) -> Result<String, StrategyError> {
    let materialized = materialize_with(slice::from_ref(credential), registry);
    if let Some(skipped) = materialized.skipped().first() {
        return Err(StrategyError::Conversion(skipped.error().to_string()));
    }
    if materialized.dataset().is_empty() {
        return Err(StrategyError::EmptyGraph);
    }
    let mut serializer = TurtleSerializer::new();
    for (name, iri) in ContextRegistry::prefixes() {
        serializer = serializer.with_prefix(name, iri)?;
    }
    let mut writer = serializer.for_writer(Vec::new());
    for quad in materialized.dataset().iter() {
        writer.serialize_triple(TripleRef::new(quad.subject, quad.predicate, quad.object))?;
    }
    let bytes = writer.finish()?;
    String::from_utf8(bytes).map_err(|e| StrategyError::Conversion(e.to_string()))
}

fn manual_turtle(
    credential: &Credential,
    _registry: &ContextRegistry,
) -> Result<String, StrategyError> {
    Ok(manual_text(credential))
}

/// One row of the property-to-predicate mapping the manual writer uses.
///
/// Rows with a context IRI only apply when the credential declares that
/// context; they shadow the always-active rows.
struct PredicateMapping {
    context: Option<&'static str>,
    property: &'static str,
    predicate: &'static str,
}

const PREDICATE_TABLE: &[PredicateMapping] = &[
    PredicateMapping {
        context: Some(CITIZENSHIP_V1_CONTEXT),
        property: "birthCountry",
        predicate: "https://w3id.org/citizenship#birthCountry",
    },
    PredicateMapping {
        context: Some(CITIZENSHIP_V1_CONTEXT),
        property: "birthDate",
        predicate: "http://schema.org/birthDate",
    },
    PredicateMapping {
        context: Some(CITIZENSHIP_V1_CONTEXT),
        property: "commuterClassification",
        predicate: "https://w3id.org/citizenship#commuterClassification",
    },
    PredicateMapping {
        context: Some(CITIZENSHIP_V1_CONTEXT),
        property: "familyName",
        predicate: "http://schema.org/familyName",
    },
    PredicateMapping {
        context: Some(CITIZENSHIP_V1_CONTEXT),
        property: "gender",
        predicate: "http://schema.org/gender",
    },
    PredicateMapping {
        context: Some(CITIZENSHIP_V1_CONTEXT),
        property: "givenName",
        predicate: "http://schema.org/givenName",
    },
    PredicateMapping {
        context: Some(CITIZENSHIP_V1_CONTEXT),
        property: "lprCategory",
        predicate: "https://w3id.org/citizenship#lprCategory",
    },
    PredicateMapping {
        context: Some(CITIZENSHIP_V1_CONTEXT),
        property: "lprNumber",
        predicate: "https://w3id.org/citizenship#lprNumber",
    },
    PredicateMapping {
        context: Some(CITIZENSHIP_V1_CONTEXT),
        property: "residentSince",
        predicate: "https://w3id.org/citizenship#residentSince",
    },
    PredicateMapping {
        context: None,
        property: "description",
        predicate: "http://schema.org/description",
    },
    PredicateMapping {
        context: None,
        property: "image",
        predicate: "http://schema.org/image",
    },
    PredicateMapping {
        context: None,
        property: "name",
        predicate: "http://schema.org/name",
    },
    PredicateMapping {
        context: None,
        property: "type",
        predicate: "http://www.w3.org/1999/02/22-rdf-syntax-ns#type",
    },
];

fn predicate_for(property: &str, contexts: &[&str]) -> Option<&'static str> {
    PREDICATE_TABLE
        .iter()
        .filter(|mapping| mapping.property == property)
        .find(|mapping| {
            mapping
                .context
                .is_none_or(|context| contexts.contains(&context))
        })
        .map(|mapping| mapping.predicate)
}

/// Best-effort field walk, used when the regular pipeline is unavailable.
///
/// The envelope fields are always emitted, however sparse the document is.
fn manual_text(credential: &Credential) -> String {
    let contexts = credential.context_ids();
    let mut out = String::new();
    let subject = format!("<{}>", credential.id());
    for credential_type in credential.types() {
        push_triple(
            &mut out,
            &subject,
            rdf::TYPE.as_str(),
            &format!("<{}>", expand_type(credential_type, &contexts)),
        );
    }
    push_triple(
        &mut out,
        &subject,
        cred::ISSUER.as_str(),
        &format!("<{}>", credential.issuer().id()),
    );
    push_triple(
        &mut out,
        &subject,
        cred::ISSUANCE_DATE.as_str(),
        &date_literal(credential.issuance_date()),
    );
    if let Some(expiration) = credential.expiration_date() {
        push_triple(
            &mut out,
            &subject,
            cred::EXPIRATION_DATE.as_str(),
            &date_literal(expiration),
        );
    }
    match credential.subject_id() {
        Some(id) => {
            let subject_node = format!("<{id}>");
            push_triple(&mut out, &subject, cred::CREDENTIAL_SUBJECT.as_str(), &subject_node);
            if let Some(claims) = credential.credential_subject() {
                for (property, value) in claims.iter().filter(|(property, _)| *property != "id") {
                    emit_claim(&mut out, &subject_node, property, value, &contexts);
                }
            }
        }
        None => {
            let object = credential
                .credential_subject()
                .filter(|claims| !claims.is_empty())
                .map_or_else(|| "[]".to_owned(), |claims| anonymous_node(claims, &contexts, 1));
            push_triple(&mut out, &subject, cred::CREDENTIAL_SUBJECT.as_str(), &object);
        }
    }
    out
}

fn emit_claim(out: &mut String, subject: &str, property: &str, value: &JsonValue, contexts: &[&str]) {
    let Some(predicate) = claim_predicate(property, contexts) else {
        return;
    };
    match value {
        JsonValue::Array(items) => {
            for item in items {
                if let Some(object) = object_text(item, contexts, 1) {
                    push_triple(out, subject, &predicate, &object);
                }
            }
        }
        _ => {
            if let Some(object) = object_text(value, contexts, 1) {
                push_triple(out, subject, &predicate, &object);
            }
        }
    }
}

fn claim_predicate(property: &str, contexts: &[&str]) -> Option<String> {
    if let Some(predicate) = predicate_for(property, contexts) {
        return Some(predicate.to_owned());
    }
    if looks_like_iri(property) {
        return Some(property.to_owned());
    }
    if property.starts_with('@') {
        return None;
    }
    Some(format!("http://schema.org/{property}"))
}

fn object_text(value: &JsonValue, contexts: &[&str], depth: usize) -> Option<String> {
    match value {
        JsonValue::String(text) => Some(if looks_like_iri(text) {
            format!("<{text}>")
        } else {
            quoted(text)
        }),
        JsonValue::Number(number) => Some(number.to_string()),
        JsonValue::Bool(flag) => Some(flag.to_string()),
        JsonValue::Object(fields) => Some(anonymous_node(fields, contexts, depth)),
        JsonValue::Array(_) | JsonValue::Null => None,
    }
}

/// Renders a nested object as a bracketed anonymous node.
fn anonymous_node(fields: &Map<String, JsonValue>, contexts: &[&str], depth: usize) -> String {
    let indent = "  ".repeat(depth);
    let mut properties = Vec::new();
    for (property, value) in fields.iter().filter(|(property, _)| *property != "id") {
        let Some(predicate) = claim_predicate(property, contexts) else {
            continue;
        };
        match value {
            JsonValue::Array(items) => {
                let objects: Vec<String> = items
                    .iter()
                    .filter_map(|item| object_text(item, contexts, depth + 1))
                    .collect();
                if !objects.is_empty() {
                    properties.push(format!("{indent}  <{predicate}> {}", objects.join(" , ")));
                }
            }
            _ => {
                if let Some(object) = object_text(value, contexts, depth + 1) {
                    properties.push(format!("{indent}  <{predicate}> {object}"));
                }
            }
        }
    }
    if properties.is_empty() {
        "[]".to_owned()
    } else {
        format!("[\n{}\n{indent}]", properties.join(" ;\n"))
    }
}

fn expand_type(credential_type: &str, contexts: &[&str]) -> String {
    match credential_type {
        "VerifiableCredential" => cred::VERIFIABLE_CREDENTIAL.as_str().to_owned(),
        "VerifiablePresentation" => cred::VERIFIABLE_PRESENTATION.as_str().to_owned(),
        "PermanentResident" => ctzn::PERMANENT_RESIDENT.as_str().to_owned(),
        "PermanentResidentCard" => ctzn::PERMANENT_RESIDENT_CARD.as_str().to_owned(),
        t if looks_like_iri(t) => t.to_owned(),
        t if contexts.contains(&CITIZENSHIP_V1_CONTEXT) => {
            format!("https://w3id.org/citizenship#{t}")
        }
        t => format!("https://www.w3.org/2018/credentials#{t}"),
    }
}

fn looks_like_iri(value: &str) -> bool {
    value.starts_with("http://")
        || value.starts_with("https://")
        || value.starts_with("did:")
        || value.starts_with("urn:")
}

fn quoted(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

fn date_literal(date: DateTime) -> String {
    format!("\"{date}\"^^<{}>", xsd::DATE_TIME.as_str())
}

fn push_triple(out: &mut String, subject: &str, predicate: &str, object: &str) {
    // writing to a String cannot fail
    let _ = writeln!(out, "{subject} <{predicate}> {object} .");
}
