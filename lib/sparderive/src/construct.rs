//! CONSTRUCT handling: preview extraction and template binding.
//!
//! A CONSTRUCT query is split in two steps. [`select_from_construct`] derives
//! the SELECT equivalent of the WHERE clause projected over the template
//! variables, so the caller can preview and select rows. [`bind_template`]
//! then substitutes only the selected rows into the template. Nothing is ever
//! constructed from rows the caller did not select.

use crate::classify::query_form;
use crate::error::QueryError;
use oxrdf::{BlankNode, Graph, NamedNode, NamedOrBlankNode, Term, Triple, Variable};
use spargebra::Query;
use spargebra::algebra::GraphPattern;
use spargebra::term::{NamedNodePattern, TermPattern, TriplePattern};
use sparesults::QuerySolution;
use std::collections::HashMap;
use std::fmt;

/// The SELECT equivalent of a CONSTRUCT query's WHERE clause.
///
/// The query serializes through `Display` with absolute IRIs, so the
/// regenerated text is self-contained whatever prefixes the original used.
#[derive(Debug, Clone)]
pub struct ExtractedSelect {
    query: Query,
    variables: Vec<Variable>,
}

impl ExtractedSelect {
    /// The extracted SELECT, ready for [`execute_select`](crate::execute_select).
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The template variables, in first-occurrence order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The extracted SELECT as self-contained query text.
    pub fn to_query_string(&self) -> String {
        self.query.to_string()
    }
}

impl fmt::Display for ExtractedSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.query.fmt(f)
    }
}

/// Derives the previewable SELECT from a CONSTRUCT query.
///
/// The projection is exactly the set of variables referenced by the template,
/// collected in template order. A template with no variable at all still gets
/// a preview over the WHERE clause's own variables.
pub fn select_from_construct(query: &Query) -> Result<ExtractedSelect, QueryError> {
    let Query::Construct {
        template,
        dataset,
        pattern,
        base_iri,
    } = query
    else {
        return Err(QueryError::ExpectedConstruct(query_form(query)?));
    };
    let mut variables = template_variables(template);
    if variables.is_empty() {
        pattern.on_in_scope_variable(|variable| {
            if !variables.contains(variable) {
                variables.push(variable.clone());
            }
        });
    }
    let query = Query::Select {
        dataset: dataset.clone(),
        pattern: GraphPattern::Project {
            inner: Box::new(pattern.clone()),
            variables: variables.clone(),
        },
        base_iri: base_iri.clone(),
    };
    Ok(ExtractedSelect { query, variables })
}

/// Collects the variables referenced anywhere in a template, walking every
/// term of every pattern in order and keeping the first occurrence only.
fn template_variables(template: &[TriplePattern]) -> Vec<Variable> {
    let mut variables = Vec::new();
    let mut push = |variables: &mut Vec<Variable>, variable: &Variable| {
        if !variables.contains(variable) {
            variables.push(variable.clone());
        }
    };
    for pattern in template {
        if let TermPattern::Variable(variable) = &pattern.subject {
            push(&mut variables, variable);
        }
        if let NamedNodePattern::Variable(variable) = &pattern.predicate {
            push(&mut variables, variable);
        }
        if let TermPattern::Variable(variable) = &pattern.object {
            push(&mut variables, variable);
        }
    }
    variables
}

/// Substitutes the selected rows into a CONSTRUCT template.
///
/// A template pattern is dropped for a row when one of its variables is
/// unbound or a bound term is invalid in its position (a literal or blank
/// node as predicate, a literal as subject); nothing is ever emitted with a
/// placeholder. Template blank nodes instantiate fresh per row. The result is
/// the duplicate-free union across all selected rows.
pub fn bind_template(template: &[TriplePattern], selected: &[QuerySolution]) -> Graph {
    let mut graph = Graph::new();
    for solution in selected {
        // fresh blank nodes per row, shared between the row's patterns
        let mut blank_nodes = HashMap::new();
        for pattern in template {
            let Some(subject) = bound_subject(&pattern.subject, solution, &mut blank_nodes) else {
                continue;
            };
            let Some(predicate) = bound_predicate(&pattern.predicate, solution) else {
                continue;
            };
            let Some(object) = bound_object(&pattern.object, solution, &mut blank_nodes) else {
                continue;
            };
            graph.insert(&Triple::new(subject, predicate, object));
        }
    }
    graph
}

fn bound_subject(
    pattern: &TermPattern,
    solution: &QuerySolution,
    blank_nodes: &mut HashMap<String, BlankNode>,
) -> Option<NamedOrBlankNode> {
    match pattern {
        TermPattern::NamedNode(node) => Some(node.clone().into()),
        TermPattern::BlankNode(node) => Some(fresh_blank_node(blank_nodes, node).into()),
        TermPattern::Literal(_) => None,
        TermPattern::Variable(variable) => match solution.get(variable)? {
            Term::NamedNode(node) => Some(node.clone().into()),
            Term::BlankNode(node) => Some(node.clone().into()),
            Term::Literal(_) => None,
        },
    }
}

fn bound_predicate(pattern: &NamedNodePattern, solution: &QuerySolution) -> Option<NamedNode> {
    match pattern {
        NamedNodePattern::NamedNode(node) => Some(node.clone()),
        NamedNodePattern::Variable(variable) => match solution.get(variable)? {
            Term::NamedNode(node) => Some(node.clone()),
            Term::BlankNode(_) | Term::Literal(_) => None,
        },
    }
}

fn bound_object(
    pattern: &TermPattern,
    solution: &QuerySolution,
    blank_nodes: &mut HashMap<String, BlankNode>,
) -> Option<Term> {
    match pattern {
        TermPattern::NamedNode(node) => Some(node.clone().into()),
        TermPattern::BlankNode(node) => Some(fresh_blank_node(blank_nodes, node).into()),
        TermPattern::Literal(literal) => Some(literal.clone().into()),
        TermPattern::Variable(variable) => solution.get(variable).cloned(),
    }
}

fn fresh_blank_node(blank_nodes: &mut HashMap<String, BlankNode>, template: &BlankNode) -> BlankNode {
    blank_nodes
        .entry(template.as_str().to_owned())
        .or_default()
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::Literal;
    use spargebra::SparqlParser;

    fn construct_query(text: &str) -> Query {
        SparqlParser::new().parse_query(text).unwrap()
    }

    fn solution(bindings: Vec<(&str, Term)>) -> QuerySolution {
        let variables: Vec<Variable> = bindings
            .iter()
            .map(|(name, _)| Variable::new_unchecked(*name))
            .collect();
        let values: Vec<Option<Term>> = bindings.into_iter().map(|(_, term)| Some(term)).collect();
        (variables, values).into()
    }

    #[test]
    fn the_projection_follows_template_order_without_duplicates() {
        let query = construct_query(
            "PREFIX ex: <http://example.com/> \
             CONSTRUCT { ?b ex:p ?a . ?b ex:q ?c } WHERE { ?a ?b ?c }",
        );
        let extracted = select_from_construct(&query).unwrap();
        let names: Vec<_> = extracted
            .variables()
            .iter()
            .map(|v| v.as_str().to_owned())
            .collect();
        assert_eq!(names, ["b", "a", "c"]);
        assert!(
            extracted
                .to_query_string()
                .starts_with("SELECT ?b ?a ?c WHERE")
        );
    }

    #[test]
    fn a_constant_template_still_gets_a_preview() {
        let query = construct_query(
            "CONSTRUCT { <http://example.com/s> <http://example.com/p> 1 } WHERE { ?x ?y ?z }",
        );
        let extracted = select_from_construct(&query).unwrap();
        assert!(!extracted.variables().is_empty());
        assert!(extracted.to_query_string().starts_with("SELECT"));
    }

    #[test]
    fn a_select_query_is_not_a_construct() {
        let query = SparqlParser::new()
            .parse_query("SELECT ?s WHERE { ?s ?p ?o }")
            .unwrap();
        assert!(matches!(
            select_from_construct(&query),
            Err(QueryError::ExpectedConstruct(_))
        ));
    }

    #[test]
    fn binding_substitutes_selected_rows_only() {
        let Query::Construct { template, .. } = construct_query(
            "CONSTRUCT { ?s <http://example.com/name> ?name } WHERE { ?s <http://example.com/n> ?name }",
        ) else {
            unreachable!()
        };
        let selected = [solution(vec![
            ("s", NamedNode::new_unchecked("http://example.com/alice").into()),
            ("name", Literal::new_simple_literal("Alice").into()),
        ])];
        let graph = bind_template(&template, &selected);
        assert_eq!(graph.len(), 1);
        let triple = graph.iter().next().unwrap();
        assert_eq!(
            triple.subject,
            NamedNode::new_unchecked("http://example.com/alice").as_ref().into()
        );
        assert_eq!(triple.object, Literal::new_simple_literal("Alice").as_ref().into());
    }

    #[test]
    fn a_pattern_with_an_unbound_variable_is_dropped() {
        let Query::Construct { template, .. } = construct_query(
            "CONSTRUCT { ?s <http://example.com/p> ?missing . ?s <http://example.com/q> 1 } \
             WHERE { ?s ?p ?o . OPTIONAL { ?s <http://example.com/m> ?missing } }",
        ) else {
            unreachable!()
        };
        let selected = [solution(vec![(
            "s",
            NamedNode::new_unchecked("http://example.com/alice").into(),
        )])];
        let graph = bind_template(&template, &selected);
        assert_eq!(graph.len(), 1);
        assert!(
            graph
                .iter()
                .all(|t| t.predicate == NamedNode::new_unchecked("http://example.com/q").as_ref())
        );
    }

    #[test]
    fn a_literal_bound_in_subject_position_is_dropped() {
        let Query::Construct { template, .. } =
            construct_query("CONSTRUCT { ?s <http://example.com/p> 1 } WHERE { ?s ?p ?o }")
        else {
            unreachable!()
        };
        let selected = [solution(vec![(
            "s",
            Literal::new_simple_literal("not a subject").into(),
        )])];
        assert!(bind_template(&template, &selected).is_empty());
    }

    #[test]
    fn duplicate_statements_across_rows_collapse() {
        let Query::Construct { template, .. } = construct_query(
            "CONSTRUCT { ?s <http://example.com/p> <http://example.com/o> } WHERE { ?s ?p ?o }",
        ) else {
            unreachable!()
        };
        let row = || {
            solution(vec![(
                "s",
                NamedNode::new_unchecked("http://example.com/alice").into(),
            )])
        };
        let graph = bind_template(&template, &[row(), row()]);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn template_blank_nodes_are_fresh_per_row() {
        let Query::Construct { template, .. } = construct_query(
            "CONSTRUCT { ?s <http://example.com/p> _:n . _:n <http://example.com/q> ?o } \
             WHERE { ?s ?p ?o }",
        ) else {
            unreachable!()
        };
        let row = |name: &str| {
            solution(vec![
                (
                    "s",
                    NamedNode::new_unchecked(format!("http://example.com/{name}")).into(),
                ),
                ("o", Literal::new_simple_literal(name).into()),
            ])
        };
        let graph = bind_template(&template, &[row("alice"), row("bob")]);
        // two rows, two patterns each, and the per-row blank nodes must not merge
        assert_eq!(graph.len(), 4);
        let blank_subjects: std::collections::HashSet<_> = graph
            .iter()
            .filter_map(|t| match t.subject {
                oxrdf::NamedOrBlankNodeRef::BlankNode(b) => Some(b.as_str().to_owned()),
                oxrdf::NamedOrBlankNodeRef::NamedNode(_) => None,
            })
            .collect();
        assert_eq!(blank_subjects.len(), 2);
    }
}
