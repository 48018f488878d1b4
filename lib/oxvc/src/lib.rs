#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]

mod context;
mod error;
mod materialize;
mod model;
mod serialize;
pub mod vocab;

pub use crate::context::{
    CITIZENSHIP_V1_CONTEXT, CREDENTIALS_V1_CONTEXT, CREDENTIAL_EXAMPLES_V1_CONTEXT,
    ContextRegistry,
};
pub use crate::error::CredentialError;
pub use crate::materialize::{Materialized, SkippedCredential, materialize, materialize_with};
pub use crate::model::{Credential, Issuer, VERIFIABLE_CREDENTIAL_TYPE, ValidityPeriod};
pub use crate::serialize::{to_turtle, to_turtle_with};
