//! Order- and label-independent fingerprints of statement sets.

use oxrdf::dataset::CanonicalizationAlgorithm;
use oxrdf::{Dataset, Graph, GraphNameRef, QuadRef};
use oxsdatatypes::DateTime;
use oxttl::NQuadsSerializer;
use sha2::{Digest, Sha256};
use std::io;
use tracing::warn;

/// A SHA-256 fingerprint of a statement set.
///
/// A canonical hash is invariant under statement reordering and consistent
/// blank node relabeling. When canonicalization is unavailable the fallback
/// hash is derived from wall-clock time and randomness instead, which breaks
/// reproducibility; [`is_canonical`](Self::is_canonical) tells the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetHash {
    hex: String,
    canonical: bool,
}

impl DatasetHash {
    /// The lowercase hexadecimal digest.
    pub fn as_str(&self) -> &str {
        &self.hex
    }

    /// Whether the digest came out of the deterministic canonical path.
    pub fn is_canonical(&self) -> bool {
        self.canonical
    }
}

impl std::fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hex)
    }
}

/// Hashes a statement set independently of statement order and blank node
/// labels.
///
/// The statements are relabeled by the canonicalization algorithm, serialized
/// as sorted N-Triples lines and digested. If serialization fails the hash
/// degrades to the non-deterministic fallback rather than aborting the
/// caller's derivation.
pub fn canonical_hash(statements: &Graph) -> DatasetHash {
    match canonical_ntriples(statements) {
        Ok(text) => DatasetHash {
            hex: hex::encode(Sha256::digest(text.as_bytes())),
            canonical: true,
        },
        Err(error) => {
            warn!(%error, "canonicalization failed, producing a non-deterministic hash");
            fallback_hash()
        }
    }
}

/// Hashes a query text, the fingerprint of the SELECT derivation path.
pub fn text_hash(text: &str) -> DatasetHash {
    DatasetHash {
        hex: hex::encode(Sha256::digest(text.as_bytes())),
        canonical: true,
    }
}

fn canonical_ntriples(statements: &Graph) -> io::Result<String> {
    let mut canonical = Dataset::new();
    for triple in statements.iter() {
        canonical.insert(QuadRef::new(
            triple.subject,
            triple.predicate,
            triple.object,
            GraphNameRef::DefaultGraph,
        ));
    }
    canonical.canonicalize(CanonicalizationAlgorithm::Unstable);
    // all quads live in the default graph, so these are plain triple lines
    let mut serializer = NQuadsSerializer::new().for_writer(Vec::new());
    for quad in canonical.iter() {
        serializer.serialize_quad(quad)?;
    }
    let serialized = String::from_utf8(serializer.finish())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut lines: Vec<&str> = serialized.lines().collect();
    lines.sort_unstable();
    Ok(lines.join("\n"))
}

fn fallback_hash() -> DatasetHash {
    let entropy: u128 = rand::random();
    let seed = format!("{}#{entropy}", DateTime::now());
    DatasetHash {
        hex: hex::encode(Sha256::digest(seed.as_bytes())),
        canonical: false,
    }
}
