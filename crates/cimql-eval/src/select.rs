//! Select statements
//!
//! A [`SelectStatement`] ties a WHERE clause to its FROM class and select
//! list. Binding to a context scopes every identifier and checks that each
//! chain is one the statement can actually use.

use crate::context::{ClassRelation, QueryContext, ancestors};
use crate::dnf::Dnf;
use crate::engine::QueryEngine;
use crate::error::{EvalError, EvalResult};
use cimql_ast::{ComparisonOp, Predicate, SimplePredicate};
use cimql_diagnostics::{
    CIMQL0005, CIMQL0006, CIMQL0007, CIMQL0008, CIMQL0009, CIMQL0010, CIMQL0011, CIMQL0012,
    ErrorCode,
};
use cimql_types::{ChainedIdentifier, ClassDef, CqlValue, Instance, ObjectPath, PropertyDecl};
use log::debug;
use once_cell::sync::OnceCell;
use std::fmt;

/// `SELECT <select list> FROM <class> [AS <alias>] [WHERE <predicate>]`
#[derive(Debug, Clone, Default)]
pub struct SelectStatement {
    from: String,
    alias: Option<String>,
    select: Vec<ChainedIdentifier>,
    where_clause: Option<Predicate>,
    bound: bool,
    /// WHERE clause bound on first evaluation when `apply_context` was never called
    lazily_bound: OnceCell<Option<Predicate>>,
}

impl SelectStatement {
    pub fn new(from: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            ..Self::default()
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_select(mut self, select: impl IntoIterator<Item = ChainedIdentifier>) -> Self {
        self.select = select.into_iter().collect();
        self
    }

    pub fn with_where(mut self, predicate: Predicate) -> Self {
        self.where_clause = Some(predicate);
        self
    }

    pub fn from_class(&self) -> &str {
        &self.from
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn select_list(&self) -> &[ChainedIdentifier] {
        &self.select
    }

    pub fn where_clause(&self) -> Option<&Predicate> {
        self.where_clause.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Scope the select list and WHERE clause, then check every identifier
    ///
    /// Chains are scoped to this statement's own FROM class and alias; the
    /// context only supplies the schema.
    pub fn apply_context(&mut self, ctx: &dyn QueryContext) -> EvalResult<()> {
        let engine = QueryEngine::new();
        let from = self.from.clone();
        let alias = self.alias.clone();
        let ctx = &StatementScope {
            inner: ctx,
            from: &from,
            alias: alias.as_deref(),
        };

        let select = self
            .select
            .iter()
            .map(|chain| engine.scope_chain(chain, ctx))
            .collect::<EvalResult<Vec<_>>>()?;
        for chain in &select {
            check_select_identifier(chain)?;
        }

        if let Some(predicate) = &mut self.where_clause {
            engine.apply_context(predicate, ctx)?;
            for leaf in predicate.leaves() {
                for chain in leaf_identifiers(leaf) {
                    check_where_identifier(chain)?;
                }
            }
        }

        self.select = select;
        self.bound = true;
        self.lazily_bound = OnceCell::new();
        debug!("bound statement: {}", self);
        Ok(())
    }

    /// Evaluate the statement against one candidate instance
    ///
    /// Candidates outside the FROM class hierarchy never match. A statement
    /// with no WHERE clause matches every other candidate.
    pub fn evaluate(&self, instance: &Instance, ctx: &dyn QueryContext) -> EvalResult<bool> {
        self.evaluate_with(&QueryEngine::new(), instance, ctx)
    }

    /// [`Self::evaluate`] on a caller-owned engine
    pub fn evaluate_with(
        &self,
        engine: &QueryEngine,
        instance: &Instance,
        ctx: &dyn QueryContext,
    ) -> EvalResult<bool> {
        if !ctx.is_subclass_of(&instance.class_name, &self.from) {
            return Ok(false);
        }
        match self.bound_where(ctx)? {
            Some(predicate) => engine.evaluate(predicate, instance, ctx),
            None => Ok(true),
        }
    }

    fn bound_where(&self, ctx: &dyn QueryContext) -> EvalResult<Option<&Predicate>> {
        if self.bound {
            return Ok(self.where_clause.as_ref());
        }
        let bound = self.lazily_bound.get_or_try_init(|| {
            let mut statement = Self {
                lazily_bound: OnceCell::new(),
                ..self.clone()
            };
            statement.apply_context(ctx)?;
            Ok::<_, EvalError>(statement.where_clause)
        })?;
        Ok(bound.as_ref())
    }

    /// Every property chain in the WHERE clause, class names after ISA included
    pub fn where_identifiers(&self) -> Vec<ChainedIdentifier> {
        let mut out: Vec<ChainedIdentifier> = Vec::new();
        let leaves = self.where_clause.iter().flat_map(Predicate::leaves);
        for leaf in leaves {
            let right = leaf.right().into_iter().flat_map(|right| right.identifiers());
            for chain in leaf.left().identifiers().into_iter().chain(right) {
                if !out.contains(chain) {
                    out.push(chain.clone());
                }
            }
        }
        out
    }

    /// Top-level properties of `class` the WHERE clause reads
    pub fn where_property_list(&self, class: &str, ctx: &dyn QueryContext) -> Vec<String> {
        let chains: Vec<&ChainedIdentifier> = self
            .where_clause
            .iter()
            .flat_map(Predicate::leaves)
            .flat_map(leaf_identifiers)
            .collect();
        property_list(chains, class, ctx)
    }

    /// Top-level properties of `class` the select list returns
    pub fn select_property_list(&self, class: &str, ctx: &dyn QueryContext) -> Vec<String> {
        property_list(self.select.iter().collect(), class, ctx)
    }

    /// Rewrite the WHERE clause into disjunctive normal form
    pub fn normalize_to_dnf(&mut self) -> EvalResult<()> {
        if let Some(predicate) = &self.where_clause {
            self.where_clause = Some(Dnf::normalize(predicate)?);
            self.lazily_bound = OnceCell::new();
        }
        Ok(())
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SELECT ")?;
        if self.select.is_empty() {
            write!(f, "*")?;
        }
        for (i, chain) in self.select.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", chain)?;
        }
        write!(f, " FROM {}", self.from)?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {}", alias)?;
        }
        if let Some(predicate) = &self.where_clause {
            write!(f, " WHERE {}", predicate)?;
        }
        Ok(())
    }
}

/// A context whose FROM class and alias are the statement's own
struct StatementScope<'a> {
    inner: &'a dyn QueryContext,
    from: &'a str,
    alias: Option<&'a str>,
}

impl QueryContext for StatementScope<'_> {
    fn from_class(&self) -> Option<&str> {
        Some(self.from)
    }

    fn from_alias(&self) -> Option<&str> {
        self.alias
    }

    fn namespace(&self) -> Option<&str> {
        self.inner.namespace()
    }

    fn class(&self, name: &str) -> Option<&ClassDef> {
        self.inner.class(name)
    }

    fn constant_binding(&self, class: &str, property: &str, constant: &str) -> Option<CqlValue> {
        self.inner.constant_binding(class, property, constant)
    }

    fn dereference(&self, path: &ObjectPath) -> Option<&Instance> {
        self.inner.dereference(path)
    }

    fn add_where_identifier(&self, chain: ChainedIdentifier) {
        self.inner.add_where_identifier(chain)
    }

    fn where_identifiers(&self) -> Vec<ChainedIdentifier> {
        self.inner.where_identifiers()
    }

    fn class_relation(&self, a: &str, b: &str) -> ClassRelation {
        self.inner.class_relation(a, b)
    }

    fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        self.inner.is_subclass_of(class, ancestor)
    }

    fn property_decl(&self, class: &str, property: &str) -> Option<&PropertyDecl> {
        self.inner.property_decl(class, property)
    }

    fn symbolic_constant(&self, class: &str, property: &str, constant: &str) -> EvalResult<CqlValue> {
        self.inner.symbolic_constant(class, property, constant)
    }
}

/// Chains on both sides of a leaf, skipping the class name after ISA
fn leaf_identifiers(leaf: &SimplePredicate) -> Vec<&ChainedIdentifier> {
    let mut chains = leaf.left().identifiers();
    if leaf.operator() != ComparisonOp::Isa {
        if let Some(right) = leaf.right() {
            chains.extend(right.identifiers());
        }
    }
    chains
}

fn property_list(chains: Vec<&ChainedIdentifier>, class: &str, ctx: &dyn QueryContext) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut add = |name: &str| {
        if !out.iter().any(|existing| existing.eq_ignore_ascii_case(name)) {
            out.push(name.to_string());
        }
    };

    for chain in chains {
        let Some(property) = chain.segments().get(1) else {
            continue;
        };
        if chain.len() == 2 && property.is_symbolic_constant() {
            continue;
        }
        if property.scope().is_some_and(|scope| !ctx.is_subclass_of(class, scope)) {
            continue;
        }
        if property.is_wildcard() {
            for decl in ancestors(ctx, class).flat_map(|c| c.properties.iter()) {
                add(&decl.name);
            }
        } else {
            add(property.name());
        }
    }
    out
}

fn illegal(code: ErrorCode, chain: &ChainedIdentifier, reason: &str) -> EvalError {
    EvalError::syntax(code, format!("{}: {}", chain, reason))
}

/// Rules shared by select and WHERE chains
fn check_identifier(chain: &ChainedIdentifier) -> EvalResult<()> {
    let Some(first) = chain.first() else {
        return Err(EvalError::syntax(CIMQL0005, "empty property chain"));
    };
    if first.is_scoped() || first.is_wildcard() || first.is_symbolic_constant() || first.is_array() {
        return Err(illegal(CIMQL0006, chain, "must start with a plain class name"));
    }

    let last = chain.len() - 1;
    for (position, segment) in chain.segments().iter().enumerate() {
        if segment.is_wildcard() && position != last {
            return Err(illegal(CIMQL0009, chain, "a wildcard must be the last element"));
        }
        if segment.is_symbolic_constant() && position != last {
            return Err(illegal(CIMQL0007, chain, "a symbolic constant must be the last element"));
        }
        if position > 1 && !segment.is_scoped() && !segment.is_wildcard() {
            return Err(illegal(
                CIMQL0010,
                chain,
                &format!("embedded property {} must be scoped", segment),
            ));
        }
    }
    Ok(())
}

fn check_select_identifier(chain: &ChainedIdentifier) -> EvalResult<()> {
    check_identifier(chain)?;
    if chain.len() < 2 {
        return Err(illegal(CIMQL0011, chain, "the select list must name a property"));
    }
    if chain.segments().iter().any(|s| s.is_array() || s.is_symbolic_constant()) {
        return Err(illegal(CIMQL0012, chain, "no array index or symbolic constant in a select list"));
    }
    Ok(())
}

fn check_where_identifier(chain: &ChainedIdentifier) -> EvalResult<()> {
    check_identifier(chain)?;
    if chain.segments().iter().any(|s| s.is_wildcard()) {
        return Err(illegal(CIMQL0008, chain, "no wildcard in a WHERE clause"));
    }
    Ok(())
}
