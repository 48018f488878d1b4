use crate::context::CREDENTIALS_V1_CONTEXT;
use crate::error::CredentialError;
use oxiri::Iri;
use oxsdatatypes::{Date, DateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

/// The base credential type every credential document must carry.
pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// A validated [W3C verifiable credential](https://www.w3.org/TR/vc-data-model/) document.
///
/// The complete JSON-LD document is preserved verbatim, including members this
/// crate does not interpret. A `Credential` is immutable once validated: all
/// transformations produce new values.
///
/// ```
/// use oxvc::Credential;
///
/// let credential: Credential = r#"{
///     "@context": ["https://www.w3.org/2018/credentials/v1"],
///     "id": "http://example.com/credentials/42",
///     "type": ["VerifiableCredential"],
///     "issuer": "did:example:university",
///     "issuanceDate": "2020-01-01T00:00:00Z",
///     "credentialSubject": {"id": "did:example:alice"}
/// }"#
/// .parse()?;
/// assert_eq!(credential.id(), "http://example.com/credentials/42");
/// assert_eq!(credential.issuer().id(), "did:example:university");
/// # Result::<_, oxvc::CredentialError>::Ok(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    document: Map<String, JsonValue>,
    id: String,
    types: Vec<String>,
    issuer: Issuer,
    issuance_date: DateTime,
    expiration_date: Option<DateTime>,
}

impl Credential {
    /// Validates a JSON document as a credential.
    ///
    /// Mandatory members are `@context` (the first entry must be the
    /// credentials v1 context), `id`, `type` (must include
    /// `VerifiableCredential`), `issuer` and `issuanceDate`.
    pub fn from_json(json: JsonValue) -> Result<Self, CredentialError> {
        let JsonValue::Object(document) = json else {
            return Err(CredentialError::InvalidFormat(
                "the credential document must be a JSON object".into(),
            ));
        };

        validate_context(&document)?;
        let id = validated_iri_member(&document, "id")?;
        let types = validated_types(&document)?;
        let issuer = validated_issuer(&document)?;
        let issuance_date = date_member(&document, "issuanceDate")?
            .ok_or(CredentialError::MissingField("issuanceDate"))?;
        let expiration_date = date_member(&document, "expirationDate")?;
        if let Some(subject) = document.get("credentialSubject") {
            if !subject.is_object() {
                return Err(CredentialError::InvalidFormat(
                    "credentialSubject must be a JSON object".into(),
                ));
            }
        }

        Ok(Self {
            document,
            id,
            types,
            issuer,
            issuance_date,
            expiration_date,
        })
    }

    /// The credential identifier (an absolute IRI or URN).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The credential types, base type included.
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// The credential issuer.
    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    /// The instant from which the credential is valid.
    pub fn issuance_date(&self) -> DateTime {
        self.issuance_date
    }

    /// The instant after which the credential is no longer valid, if any.
    pub fn expiration_date(&self) -> Option<DateTime> {
        self.expiration_date
    }

    /// The context identifiers declared by the document, in declaration order.
    ///
    /// Inline context objects are not identified and are skipped.
    pub fn context_ids(&self) -> Vec<&str> {
        match self.document.get("@context") {
            Some(JsonValue::String(id)) => vec![id],
            Some(JsonValue::Array(entries)) => {
                entries.iter().filter_map(JsonValue::as_str).collect()
            }
            _ => Vec::new(),
        }
    }

    /// The claims made about the credential subject, if any.
    pub fn credential_subject(&self) -> Option<&Map<String, JsonValue>> {
        self.document.get("credentialSubject")?.as_object()
    }

    /// The identifier of the credential subject, if it carries one.
    pub fn subject_id(&self) -> Option<&str> {
        self.credential_subject()?.get("id")?.as_str()
    }

    /// The proof block, kept opaque.
    pub fn proof(&self) -> Option<&JsonValue> {
        self.document.get("proof")
    }

    /// The complete document, exactly as validated.
    pub fn as_object(&self) -> &Map<String, JsonValue> {
        &self.document
    }

    /// A copy of the complete document.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.document.clone())
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let serialized = serde_json::to_string(&self.document).map_err(|_| fmt::Error)?;
        f.write_str(&serialized)
    }
}

impl FromStr for Credential {
    type Err = CredentialError;

    fn from_str(document: &str) -> Result<Self, Self::Err> {
        let json = serde_json::from_str(document)
            .map_err(|e| CredentialError::InvalidFormat(e.to_string()))?;
        Self::from_json(json)
    }
}

impl TryFrom<JsonValue> for Credential {
    type Error = CredentialError;

    fn try_from(json: JsonValue) -> Result<Self, Self::Error> {
        Self::from_json(json)
    }
}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.document.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Self::from_json(JsonValue::deserialize(deserializer)?).map_err(D::Error::custom)
    }
}

/// A credential issuer: a bare IRI or an embedded object carrying an `id`.
#[derive(Debug, Clone, PartialEq)]
pub enum Issuer {
    /// The issuer given as an IRI string.
    Iri(String),
    /// The issuer given as an embedded object.
    Embedded {
        /// The issuer identifier.
        id: String,
        /// The complete embedded object.
        document: Map<String, JsonValue>,
    },
}

impl Issuer {
    /// The issuer identifier, whatever form the document uses.
    pub fn id(&self) -> &str {
        match self {
            Self::Iri(id) | Self::Embedded { id, .. } => id,
        }
    }
}

/// The validity window shared by a set of source credentials.
///
/// `valid_from` is the latest issuance date and `valid_until` the earliest
/// defined expiration date, so the period is the conservative intersection of
/// all source validity windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityPeriod {
    valid_from: DateTime,
    valid_until: Option<DateTime>,
}

impl ValidityPeriod {
    /// Computes the intersection over a set of credentials.
    ///
    /// Returns `None` on an empty set.
    pub fn intersection<'a>(credentials: impl IntoIterator<Item = &'a Credential>) -> Option<Self> {
        let mut credentials = credentials.into_iter();
        let first = credentials.next()?;
        let mut valid_from = first.issuance_date();
        let mut valid_until = first.expiration_date();
        for credential in credentials {
            if credential.issuance_date() > valid_from {
                valid_from = credential.issuance_date();
            }
            valid_until = match (valid_until, credential.expiration_date()) {
                (Some(current), Some(other)) => Some(if other < current { other } else { current }),
                (current, other) => current.or(other),
            };
        }
        Some(Self {
            valid_from,
            valid_until,
        })
    }

    pub fn valid_from(&self) -> DateTime {
        self.valid_from
    }

    pub fn valid_until(&self) -> Option<DateTime> {
        self.valid_until
    }
}

fn validate_context(document: &Map<String, JsonValue>) -> Result<(), CredentialError> {
    let context = document
        .get("@context")
        .ok_or(CredentialError::MissingField("@context"))?;
    let first = match context {
        JsonValue::String(id) => Some(id.as_str()),
        JsonValue::Array(entries) => match entries.first() {
            Some(JsonValue::String(id)) => Some(id.as_str()),
            Some(_) => None,
            None => {
                return Err(CredentialError::InvalidContext(
                    "@context must not be an empty array".into(),
                ));
            }
        },
        _ => {
            return Err(CredentialError::InvalidContext(
                "@context must be a string or an array".into(),
            ));
        }
    };
    if first != Some(CREDENTIALS_V1_CONTEXT) {
        return Err(CredentialError::InvalidContext(format!(
            "the first context entry must be {CREDENTIALS_V1_CONTEXT}"
        )));
    }
    Ok(())
}

fn validated_types(document: &Map<String, JsonValue>) -> Result<Vec<String>, CredentialError> {
    let types = match document
        .get("type")
        .ok_or(CredentialError::MissingField("type"))?
    {
        JsonValue::String(t) => vec![t.clone()],
        JsonValue::Array(entries) => entries
            .iter()
            .map(|entry| {
                entry.as_str().map(ToOwned::to_owned).ok_or_else(|| {
                    CredentialError::InvalidType("type entries must be strings".into())
                })
            })
            .collect::<Result<_, _>>()?,
        _ => {
            return Err(CredentialError::InvalidType(
                "type must be a string or an array of strings".into(),
            ));
        }
    };
    if !types.iter().any(|t| t == VERIFIABLE_CREDENTIAL_TYPE) {
        return Err(CredentialError::InvalidType(format!(
            "type must include {VERIFIABLE_CREDENTIAL_TYPE}"
        )));
    }
    Ok(types)
}

fn validated_issuer(document: &Map<String, JsonValue>) -> Result<Issuer, CredentialError> {
    match document
        .get("issuer")
        .ok_or(CredentialError::MissingField("issuer"))?
    {
        JsonValue::String(id) => {
            validate_iri(id)?;
            Ok(Issuer::Iri(id.clone()))
        }
        JsonValue::Object(issuer) => {
            let id = issuer
                .get("id")
                .and_then(JsonValue::as_str)
                .ok_or(CredentialError::MissingField("issuer.id"))?;
            validate_iri(id)?;
            Ok(Issuer::Embedded {
                id: id.to_owned(),
                document: issuer.clone(),
            })
        }
        _ => Err(CredentialError::InvalidFormat(
            "issuer must be an IRI or an object with an id".into(),
        )),
    }
}

fn validated_iri_member(
    document: &Map<String, JsonValue>,
    name: &'static str,
) -> Result<String, CredentialError> {
    let value = document
        .get(name)
        .ok_or(CredentialError::MissingField(name))?
        .as_str()
        .ok_or_else(|| CredentialError::InvalidFormat(format!("{name} must be a string")))?;
    validate_iri(value)?;
    Ok(value.to_owned())
}

fn validate_iri(value: &str) -> Result<(), CredentialError> {
    Iri::parse(value)
        .map_err(|e| CredentialError::InvalidFormat(format!("`{value}` is not an IRI: {e}")))?;
    Ok(())
}

fn date_member(
    document: &Map<String, JsonValue>,
    name: &'static str,
) -> Result<Option<DateTime>, CredentialError> {
    let Some(value) = document.get(name) else {
        return Ok(None);
    };
    let value = value
        .as_str()
        .ok_or_else(|| CredentialError::InvalidDate(format!("{name} must be a string")))?;
    Ok(Some(parse_date_time(value)?))
}

/// Parses an `xsd:dateTime`, also accepting a bare `xsd:date` at midnight.
fn parse_date_time(value: &str) -> Result<DateTime, CredentialError> {
    if let Ok(date_time) = DateTime::from_str(value) {
        return Ok(date_time);
    }
    let date = Date::from_str(value)
        .map_err(|e| CredentialError::InvalidDate(format!("`{value}`: {e}")))?;
    DateTime::try_from(date).map_err(|e| CredentialError::InvalidDate(format!("`{value}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_document() -> JsonValue {
        json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "id": "http://example.com/credentials/1",
            "type": ["VerifiableCredential"],
            "issuer": "did:example:issuer",
            "issuanceDate": "2020-01-01T00:00:00Z",
            "credentialSubject": {"id": "did:example:subject", "name": "Alice"}
        })
    }

    #[test]
    fn valid_credential_is_accepted() {
        let credential = Credential::from_json(base_document()).unwrap();
        assert_eq!(credential.id(), "http://example.com/credentials/1");
        assert_eq!(credential.types(), ["VerifiableCredential"]);
        assert_eq!(credential.issuer().id(), "did:example:issuer");
        assert_eq!(credential.subject_id(), Some("did:example:subject"));
        assert!(credential.expiration_date().is_none());
    }

    #[test]
    fn embedded_issuer_is_accepted() {
        let mut document = base_document();
        document["issuer"] = json!({"id": "did:example:issuer", "name": "Example University"});
        let credential = Credential::from_json(document).unwrap();
        assert_eq!(credential.issuer().id(), "did:example:issuer");
        assert!(matches!(credential.issuer(), Issuer::Embedded { .. }));
    }

    #[test]
    fn date_only_values_are_normalized() {
        let mut document = base_document();
        document["issuanceDate"] = json!("2020-01-01");
        let credential = Credential::from_json(document).unwrap();
        assert_eq!(
            credential.issuance_date(),
            DateTime::from_str("2020-01-01T00:00:00").unwrap()
        );
    }

    #[test]
    fn missing_mandatory_fields_are_rejected() {
        for field in ["@context", "id", "type", "issuer", "issuanceDate"] {
            let mut document = base_document();
            document.as_object_mut().unwrap().remove(field);
            assert!(matches!(
                Credential::from_json(document),
                Err(CredentialError::MissingField(name)) if name == field
            ));
        }
    }

    #[test]
    fn wrong_first_context_is_rejected() {
        let mut document = base_document();
        document["@context"] = json!(["http://example.com/custom/v1"]);
        assert!(matches!(
            Credential::from_json(document),
            Err(CredentialError::InvalidContext(_))
        ));
    }

    #[test]
    fn type_without_base_type_is_rejected() {
        let mut document = base_document();
        document["type"] = json!(["UniversityDegreeCredential"]);
        assert!(matches!(
            Credential::from_json(document),
            Err(CredentialError::InvalidType(_))
        ));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut document = base_document();
        document["issuanceDate"] = json!("not a date");
        assert!(matches!(
            Credential::from_json(document),
            Err(CredentialError::InvalidDate(_))
        ));
    }

    #[test]
    fn unknown_members_are_preserved() {
        let mut document = base_document();
        document["evidence"] = json!([{"type": "DocumentVerification"}]);
        let credential = Credential::from_json(document.clone()).unwrap();
        assert_eq!(credential.to_json(), document);
    }

    #[test]
    fn validity_period_is_the_conservative_intersection() {
        let open_ended = Credential::from_json({
            let mut document = base_document();
            document["issuanceDate"] = json!("2020-01-01");
            document
        })
        .unwrap();
        let bounded = Credential::from_json({
            let mut document = base_document();
            document["issuanceDate"] = json!("2021-06-01");
            document["expirationDate"] = json!("2030-01-01");
            document
        })
        .unwrap();

        let period = ValidityPeriod::intersection([&open_ended, &bounded]).unwrap();
        assert_eq!(
            period.valid_from(),
            DateTime::from_str("2021-06-01T00:00:00").unwrap()
        );
        assert_eq!(
            period.valid_until(),
            Some(DateTime::from_str("2030-01-01T00:00:00").unwrap())
        );
    }

    #[test]
    fn validity_period_over_no_credentials_is_empty() {
        let no_credentials: [&Credential; 0] = [];
        assert!(ValidityPeriod::intersection(no_credentials).is_none());
    }
}
