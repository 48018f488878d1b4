use oxrdf::dataset::CanonicalizationAlgorithm;
use oxrdf::{Dataset, GraphNameRef, QuadRef};
use oxttl::TurtleParser;
use oxvc::{Credential, materialize, to_turtle};
use std::slice;

fn degree_credential() -> Credential {
    r#"{
        "@context": [
            "https://www.w3.org/2018/credentials/v1",
            "https://www.w3.org/2018/credentials/examples/v1"
        ],
        "id": "http://example.com/credentials/1872",
        "type": ["VerifiableCredential", "UniversityDegreeCredential"],
        "issuer": "https://example.edu/issuers/565049",
        "issuanceDate": "2010-01-01T19:23:24Z",
        "credentialSubject": {
            "id": "did:example:ebfeb1f712ebc6f1c276e12ec21",
            "degree": {"type": "BachelorDegree", "name": "Bachelor of Science and Arts"}
        }
    }"#
    .parse()
    .unwrap()
}

#[test]
fn turtle_output_round_trips_to_an_isomorphic_graph() {
    let credential = degree_credential();
    let mut original = materialize(slice::from_ref(&credential)).into_dataset();
    assert!(!original.is_empty());

    let turtle = to_turtle(&credential);
    let mut reparsed = Dataset::new();
    for triple in TurtleParser::new().for_slice(turtle.as_bytes()) {
        let triple = triple.unwrap();
        reparsed.insert(QuadRef::new(
            &triple.subject,
            &triple.predicate,
            &triple.object,
            GraphNameRef::DefaultGraph,
        ));
    }

    original.canonicalize(CanonicalizationAlgorithm::Unstable);
    reparsed.canonicalize(CanonicalizationAlgorithm::Unstable);
    assert_eq!(original, reparsed);
}
