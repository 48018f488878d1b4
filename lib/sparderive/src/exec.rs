//! Evaluation of accepted queries into binding sequences.

use crate::classify::{QueryForm, query_form};
use crate::construct::select_from_construct;
use crate::error::QueryError;
use oxrdf::Dataset;
use spareval::{QueryEvaluator, QueryResults};
use sparesults::QuerySolution;
use spargebra::Query;

/// Evaluates a query into bindings, in the evaluator's native row order.
///
/// A SELECT query runs directly. A CONSTRUCT query never instantiates its
/// template here: it runs as its extracted SELECT (see
/// [`select_from_construct`]) so callers always preview rows before any
/// statement is produced. Other forms are refused again, whatever gate the
/// caller went through. An empty dataset yields an empty sequence.
pub fn execute_select(query: &Query, dataset: &Dataset) -> Result<Vec<QuerySolution>, QueryError> {
    match query_form(query)? {
        QueryForm::Select => evaluate_bindings(query, dataset),
        QueryForm::Construct => {
            let extracted = select_from_construct(query)?;
            evaluate_bindings(extracted.query(), dataset)
        }
    }
}

fn evaluate_bindings(query: &Query, dataset: &Dataset) -> Result<Vec<QuerySolution>, QueryError> {
    match QueryEvaluator::new().execute(dataset, query)? {
        QueryResults::Solutions(solutions) => Ok(solutions.collect::<Result<Vec<_>, _>>()?),
        QueryResults::Boolean(_) | QueryResults::Graph(_) => Err(QueryError::UnexpectedResultForm),
    }
}
