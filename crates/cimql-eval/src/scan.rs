//! Evaluating a statement over many candidates

use crate::context::QueryContext;
use crate::engine::QueryEngine;
use crate::error::{EvalError, EvalResult};
use crate::select::SelectStatement;
use cimql_types::Instance;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// What to do when a candidate fails to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanErrorPolicy {
    /// Log the error and treat the candidate as not matching
    #[default]
    Exclude,
    /// Stop at the first error
    Abort,
}

/// Runs one statement over a set of candidate instances
///
/// Syntax errors and malformed trees mean the query itself is broken and
/// always abort the scan, whatever the policy. The scanner owns its engine,
/// so compiled LIKE patterns are shared across candidates of one scanner.
#[derive(Debug, Default)]
pub struct Scanner {
    policy: ScanErrorPolicy,
    engine: QueryEngine,
}

impl Scanner {
    pub fn new(policy: ScanErrorPolicy) -> Self {
        Self {
            policy,
            engine: QueryEngine::new(),
        }
    }

    pub fn policy(&self) -> ScanErrorPolicy {
        self.policy
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    /// Candidates the statement selects
    pub fn filter<'i>(
        &self,
        statement: &SelectStatement,
        instances: &'i [Instance],
        ctx: &dyn QueryContext,
    ) -> EvalResult<Vec<&'i Instance>> {
        let mut selected = Vec::new();
        for (instance, outcome) in instances.iter().zip(self.matches(statement, instances, ctx)) {
            match outcome {
                Ok(true) => selected.push(instance),
                Ok(false) => {}
                Err(err) if self.stops_on(&err) => {
                    return Err(err);
                }
                Err(err) => warn!("excluding {}: {}", describe(instance), err),
            }
        }
        debug!("{} of {} candidates selected", selected.len(), instances.len());
        Ok(selected)
    }

    /// Per-candidate outcomes, in input order
    ///
    /// Evaluation stops after a query-fatal error, and after any error under
    /// [`ScanErrorPolicy::Abort`]; the last outcome is then that error.
    pub fn matches(
        &self,
        statement: &SelectStatement,
        instances: &[Instance],
        ctx: &dyn QueryContext,
    ) -> Vec<EvalResult<bool>> {
        let mut outcomes = Vec::with_capacity(instances.len());
        for instance in instances {
            let outcome = statement.evaluate_with(&self.engine, instance, ctx);
            let stop = outcome.as_ref().err().is_some_and(|err| self.stops_on(err));
            outcomes.push(outcome);
            if stop {
                break;
            }
        }
        outcomes
    }

    fn stops_on(&self, err: &EvalError) -> bool {
        err.is_query_fatal() || self.policy == ScanErrorPolicy::Abort
    }
}

fn describe(instance: &Instance) -> String {
    match &instance.path {
        Some(path) => path.to_string(),
        None => instance.class_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SchemaContext;
    use cimql_ast::{ComparisonOp, Expression, Function, FunctionKind, Predicate, SimplePredicate};
    use cimql_diagnostics::{CIMQL0103, ErrorKind};
    use cimql_types::{ClassDef, CimType, PropertyDecl};

    // ============================================================================
    // Test Helpers
    // ============================================================================

    fn context() -> SchemaContext {
        SchemaContext::builder()
            .class(
                ClassDef::new("CIM_Disk")
                    .with_property(PropertyDecl::new("Status", CimType::Uint16))
                    .with_property(PropertyDecl::new("Label", CimType::String)),
            )
            .from_class("CIM_Disk")
            .build()
    }

    fn instances() -> Vec<Instance> {
        vec![
            Instance::new("CIM_Disk").with_property("Status", 2u16),
            Instance::new("CIM_Disk").with_property("Status", "broken"),
            Instance::new("CIM_Disk").with_property("Status", 3u16),
            Instance::new("CIM_Disk").with_property("Status", 2u16),
        ]
    }

    fn status_is_two() -> SelectStatement {
        SelectStatement::new("CIM_Disk").with_where(
            SimplePredicate::compare(
                Expression::identifier("Status"),
                ComparisonOp::Eq,
                Expression::value(2u64),
            )
            .into(),
        )
    }

    #[test]
    fn test_exclude_skips_failing_candidates() {
        let instances = instances();
        let selected = Scanner::new(ScanErrorPolicy::Exclude)
            .filter(&status_is_two(), &instances, &context())
            .unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_abort_returns_first_error() {
        let instances = instances();
        let err = Scanner::new(ScanErrorPolicy::Abort)
            .filter(&status_is_two(), &instances, &context())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Runtime);

        let outcomes = Scanner::new(ScanErrorPolicy::Abort).matches(&status_is_two(), &instances, &context());
        assert_eq!(outcomes.len(), 2);
    }

    #[test]
    fn test_syntax_errors_abort_under_exclude() {
        let missing_argument = Expression::function(Function::new(FunctionKind::UpperCase, vec![]));
        let like_identifier = SimplePredicate::new(
            Expression::identifier("Label"),
            ComparisonOp::Like,
            Some(Expression::identifier("Label")),
        );
        let statement = SelectStatement::new("CIM_Disk").with_where(like_identifier.into());
        let instances = vec![Instance::new("CIM_Disk").with_property("Label", "x")];
        let err = Scanner::new(ScanErrorPolicy::Exclude)
            .filter(&statement, &instances, &context())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);

        // a wrong argument count is a runtime error and only excludes
        let statement = SelectStatement::new("CIM_Disk")
            .with_where(SimplePredicate::is_null(missing_argument).into());
        let selected = Scanner::new(ScanErrorPolicy::Exclude)
            .filter(&statement, &instances, &context())
            .unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_malformed_tree_aborts_under_exclude() {
        let leaf: Predicate = SimplePredicate::is_null(Expression::identifier("Status")).into();
        let missing_operator = Predicate::compound(vec![leaf.clone(), leaf], vec![]);
        let statement = SelectStatement::new("CIM_Disk").with_where(missing_operator);
        let instances = instances();

        let err = Scanner::new(ScanErrorPolicy::Exclude)
            .filter(&statement, &instances, &context())
            .unwrap_err();
        assert_eq!(err.code(), CIMQL0103);

        let outcomes = Scanner::new(ScanErrorPolicy::Exclude).matches(&statement, &instances, &context());
        assert_eq!(outcomes.len(), 1);
    }

    #[test]
    fn test_like_patterns_are_owned_by_the_scanner() {
        let statement = SelectStatement::new("CIM_Disk")
            .with_where(SimplePredicate::like(Expression::identifier("Label"), "Disk%").into());
        let instances = vec![
            Instance::new("CIM_Disk").with_property("Label", "Disk1"),
            Instance::new("CIM_Disk").with_property("Label", "Tape1"),
        ];
        let scanner = Scanner::new(ScanErrorPolicy::Exclude);
        let selected = scanner.filter(&statement, &instances, &context()).unwrap();
        assert_eq!(selected.len(), 1);
        assert_eq!(scanner.engine().pattern_cache().len(), 1);
        assert_eq!(Scanner::default().engine().pattern_cache().len(), 0);
    }
}
