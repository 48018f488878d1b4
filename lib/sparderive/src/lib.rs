#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc(html_favicon_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/oxigraph/oxigraph/main/logo.svg")]

mod canon;
mod classify;
mod construct;
mod derive;
mod engine;
mod error;
mod exec;

pub use crate::canon::{DatasetHash, canonical_hash, text_hash};
pub use crate::classify::{ClassifiedQuery, QueryForm, classify};
pub use crate::construct::{ExtractedSelect, bind_template, select_from_construct};
pub use crate::derive::{
    DERIVED_CREDENTIAL_TYPE, DerivationTemplate, SUBJECT_VARIABLE, derive_from_construct,
    derive_from_select,
};
pub use crate::engine::CredentialQueryEngine;
pub use crate::error::{DerivationError, QueryError, UnsupportedOperation};
pub use crate::exec::execute_select;
