//! The gate deciding which query operations the pipeline runs at all.

use crate::error::{QueryError, UnsupportedOperation};
use spargebra::{Query, SparqlParser};
use std::fmt;

/// The query forms the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryForm {
    Select,
    Construct,
}

impl fmt::Display for QueryForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Select => "SELECT",
            Self::Construct => "CONSTRUCT",
        })
    }
}

/// A parsed query already known to be SELECT or CONSTRUCT.
#[derive(Debug, Clone)]
pub struct ClassifiedQuery {
    query: Query,
    form: QueryForm,
}

impl ClassifiedQuery {
    pub fn form(&self) -> QueryForm {
        self.form
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn into_query(self) -> Query {
        self.query
    }
}

/// Parses a query text and accepts only the SELECT and CONSTRUCT forms.
///
/// ASK and DESCRIBE parse fine but are refused with
/// [`QueryError::Unsupported`], and so is anything that parses as a SPARQL
/// update. Syntax errors keep the parser's message.
///
/// ```
/// use sparderive::{QueryError, classify};
///
/// assert!(classify("SELECT ?s WHERE { ?s ?p ?o }").is_ok());
/// assert!(matches!(
///     classify("ASK { ?s ?p ?o }"),
///     Err(QueryError::Unsupported(_))
/// ));
/// ```
pub fn classify(text: &str) -> Result<ClassifiedQuery, QueryError> {
    let query = match SparqlParser::new().parse_query(text) {
        Ok(query) => query,
        Err(error) => {
            // an update is not a malformed query but a refused operation
            return Err(if SparqlParser::new().parse_update(text).is_ok() {
                QueryError::Unsupported(UnsupportedOperation::Update)
            } else {
                error.into()
            });
        }
    };
    let form = query_form(&query)?;
    Ok(ClassifiedQuery { query, form })
}

/// The same gate over an already parsed query, re-run inside execution so no
/// code path can evaluate an unsupported operation.
pub(crate) fn query_form(query: &Query) -> Result<QueryForm, QueryError> {
    match query {
        Query::Select { .. } => Ok(QueryForm::Select),
        Query::Construct { .. } => Ok(QueryForm::Construct),
        Query::Ask { .. } => Err(QueryError::Unsupported(UnsupportedOperation::Ask)),
        Query::Describe { .. } => Err(QueryError::Unsupported(UnsupportedOperation::Describe)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_and_construct_are_accepted() {
        let select = classify("SELECT ?s WHERE { ?s ?p ?o }").unwrap();
        assert_eq!(select.form(), QueryForm::Select);
        let construct =
            classify("CONSTRUCT { ?s <http://example.com/p> ?o } WHERE { ?s ?p ?o }").unwrap();
        assert_eq!(construct.form(), QueryForm::Construct);
    }

    #[test]
    fn ask_and_describe_are_unsupported() {
        assert!(matches!(
            classify("ASK { ?s ?p ?o }"),
            Err(QueryError::Unsupported(UnsupportedOperation::Ask))
        ));
        assert!(matches!(
            classify("DESCRIBE <http://example.com/s>"),
            Err(QueryError::Unsupported(UnsupportedOperation::Describe))
        ));
    }

    #[test]
    fn updates_are_unsupported_rather_than_syntax_errors() {
        assert!(matches!(
            classify("INSERT DATA { <http://example.com/s> <http://example.com/p> 1 }"),
            Err(QueryError::Unsupported(UnsupportedOperation::Update))
        ));
        assert!(matches!(
            classify("DELETE WHERE { ?s ?p ?o }"),
            Err(QueryError::Unsupported(UnsupportedOperation::Update))
        ));
    }

    #[test]
    fn syntax_errors_keep_the_parser_message() {
        let error = classify("SELECT ?s WHERE {").unwrap_err();
        assert!(matches!(error, QueryError::Syntax(_)));
        assert!(!error.to_string().is_empty());
    }
}
