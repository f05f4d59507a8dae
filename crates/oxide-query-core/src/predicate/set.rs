//! Ordered groups of predicates joined by AND/OR.

use serde_json::Value;

use super::{spec, LogicalOp, Predicate};
use crate::clause::Clause;
use crate::dialect::Driver;
use crate::element::{compile_cached, Cache, Cached, Element};
use crate::error::Result;
use crate::params::Params;

/// Anything that can be added to a [`PredicateSet`].
#[derive(Debug, Clone)]
pub enum PredicateInput {
    /// Trusted SQL text, added as a literal predicate.
    Raw(String),
    /// A built predicate.
    Predicate(Predicate),
    /// A group, added as a nested set.
    Set(PredicateSet),
    /// The predicates of a clause, added as a nested set.
    Clause(Clause),
    /// A declarative specification.
    Spec(Value),
}

impl From<&str> for PredicateInput {
    fn from(sql: &str) -> Self {
        Self::Raw(String::from(sql))
    }
}

impl From<String> for PredicateInput {
    fn from(sql: String) -> Self {
        Self::Raw(sql)
    }
}

impl From<Predicate> for PredicateInput {
    fn from(predicate: Predicate) -> Self {
        Self::Predicate(predicate)
    }
}

impl From<PredicateSet> for PredicateInput {
    fn from(set: PredicateSet) -> Self {
        Self::Set(set)
    }
}

impl From<&PredicateSet> for PredicateInput {
    fn from(set: &PredicateSet) -> Self {
        Self::Set(set.clone())
    }
}

impl From<Clause> for PredicateInput {
    fn from(clause: Clause) -> Self {
        Self::Clause(clause)
    }
}

impl From<Value> for PredicateInput {
    fn from(spec: Value) -> Self {
        Self::Spec(spec)
    }
}

impl From<&Value> for PredicateInput {
    fn from(spec: &Value) -> Self {
        Self::Spec(spec.clone())
    }
}

/// An ordered list of predicates joined by logical operators.
///
/// Each entry carries the operator that joins it to the entries before
/// it: the one-shot operator set with [`next_operator`](Self::next_operator)
/// if any, the set's default operator otherwise. Entries compiling to an
/// empty string are skipped together with their operator.
#[derive(Debug, Clone, Default)]
pub struct PredicateSet {
    entries: Vec<(LogicalOp, Predicate)>,
    default_op: LogicalOp,
    pending_op: Option<LogicalOp>,
    nested: bool,
    cache: Cache,
}

impl PredicateSet {
    /// Creates an empty set joined with AND.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty set joined with `op`.
    #[must_use]
    pub fn with_operator(op: LogicalOp) -> Self {
        Self {
            default_op: op,
            ..Self::default()
        }
    }

    /// Builds a set from a declarative specification.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSpec`](crate::Error::InvalidSpec) for
    /// unrecognised shapes, or the error of the predicate the shape
    /// describes.
    pub fn from_spec(spec: &Value) -> Result<Self> {
        let mut set = Self::new();
        set.add(spec)?;
        Ok(set)
    }

    /// Adds an entry joined with the pending or default operator.
    ///
    /// A failed addition leaves the set unchanged.
    ///
    /// # Errors
    ///
    /// Returns the validation error of the input.
    pub fn add(&mut self, input: impl Into<PredicateInput>) -> Result<&mut Self> {
        match input.into() {
            PredicateInput::Raw(sql) => {
                let predicate = Predicate::literal(sql)?;
                self.push(predicate);
            }
            PredicateInput::Predicate(predicate) => self.push(predicate),
            PredicateInput::Set(set) => self.push_set(set),
            PredicateInput::Clause(clause) => {
                if let Some(set) = clause.into_predicates() {
                    self.push_set(set);
                }
            }
            PredicateInput::Spec(value) => {
                let mut staged = Self {
                    default_op: self.default_op,
                    pending_op: self.pending_op,
                    ..Self::default()
                };
                spec::apply(&mut staged, &value)?;
                self.cache.invalidate();
                self.entries.append(&mut staged.entries);
                self.pending_op = staged.pending_op;
            }
        }
        Ok(self)
    }

    /// Adds an entry joined with AND.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn and(&mut self, input: impl Into<PredicateInput>) -> Result<&mut Self> {
        self.next_operator(LogicalOp::And).add(input)
    }

    /// Adds an entry joined with OR.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn or(&mut self, input: impl Into<PredicateInput>) -> Result<&mut Self> {
        self.next_operator(LogicalOp::Or).add(input)
    }

    /// Sets the operator used by the next insertion only.
    pub fn next_operator(&mut self, op: LogicalOp) -> &mut Self {
        self.pending_op = Some(op);
        self
    }

    /// Appends an empty nested group joined with AND and returns it.
    pub fn nest(&mut self) -> &mut Self {
        self.nest_with(LogicalOp::And)
    }

    /// Appends an empty nested group joined with `op` and returns it.
    pub fn nest_with(&mut self, op: LogicalOp) -> &mut Self {
        self.push_set(Self::with_operator(op));
        match self.entries.last_mut().and_then(|(_, entry)| entry.as_set_mut()) {
            Some(set) => set,
            None => unreachable!("a nested set was just pushed"),
        }
    }

    /// Number of entries, empty nested groups included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the set has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.cache.invalidate();
        self.entries.clear();
        self.pending_op = None;
    }

    /// Iterates over the entries and their joining operators.
    pub fn iter(&self) -> impl Iterator<Item = (LogicalOp, &Predicate)> {
        self.entries.iter().map(|(op, predicate)| (*op, predicate))
    }

    /// Mutable access to one entry.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Predicate> {
        self.cache.invalidate();
        self.entries.get_mut(index).map(|(_, predicate)| predicate)
    }

    /// The operator used when no one-shot operator is pending.
    #[must_use]
    pub const fn default_operator(&self) -> LogicalOp {
        self.default_op
    }

    /// Changes the default operator of future insertions.
    pub fn set_default_operator(&mut self, op: LogicalOp) -> &mut Self {
        self.default_op = op;
        self
    }

    /// Returns true if the compiled SQL is cached.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        self.cache.is_valid()
    }

    fn push(&mut self, predicate: Predicate) {
        self.cache.invalidate();
        let op = self.pending_op.take().unwrap_or(self.default_op);
        self.entries.push((op, predicate));
    }

    fn push_set(&mut self, mut set: Self) {
        set.cache.invalidate();
        set.nested = true;
        self.push(Predicate::from_set(set));
    }
}

impl Cached for PredicateSet {
    const NODE: &'static str = "predicate set";

    fn cache(&mut self) -> &mut Cache {
        &mut self.cache
    }

    fn compile_fragment(&mut self, driver: &dyn Driver, params: &mut Params) -> Result<String> {
        let mut sql = String::new();
        let mut live = 0;
        for (op, predicate) in &mut self.entries {
            let fragment = predicate.compile(driver, Some(params))?;
            if fragment.is_empty() {
                continue;
            }
            if live > 0 {
                sql.push(' ');
                sql.push_str(op.as_str());
                sql.push(' ');
            }
            sql.push_str(&fragment);
            live += 1;
        }
        if self.nested && live > 1 {
            Ok(format!("({sql})"))
        } else {
            Ok(sql)
        }
    }
}

impl Element for PredicateSet {
    fn compile(&mut self, driver: &dyn Driver, params: Option<&mut Params>) -> Result<String> {
        compile_cached(self, driver, params)
    }

    fn params(&self) -> Option<&Params> {
        self.cache.params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::GenericDriver;
    use crate::predicate::{eq, gt, is_null, lt};

    fn render(set: &mut PredicateSet) -> String {
        set.compile(&GenericDriver::ansi(), None).unwrap()
    }

    #[test]
    fn test_empty_set_compiles_to_nothing() {
        let mut set = PredicateSet::new();
        assert_eq!(render(&mut set), "");
        set.nest();
        set.nest_with(LogicalOp::Or).nest();
        assert_eq!(render(&mut set), "");
    }

    #[test]
    fn test_default_and_pending_operators() {
        let mut set = PredicateSet::new();
        set.add(eq("a", 1).unwrap()).unwrap();
        set.or(eq("b", 2).unwrap()).unwrap();
        set.add(eq("c", 3).unwrap()).unwrap();
        assert_eq!(
            render(&mut set),
            r#""a" = :eq1 OR "b" = :eq2 AND "c" = :eq3"#
        );

        let mut any = PredicateSet::with_operator(LogicalOp::Or);
        any.add("x = 1").unwrap().add("y = 2").unwrap();
        assert_eq!(render(&mut any), "x = 1 OR y = 2");
    }

    #[test]
    fn test_nested_parenthesised_only_with_two_entries() {
        let mut set = PredicateSet::new();
        set.add(eq("a", 1).unwrap()).unwrap();
        let group = set.nest_with(LogicalOp::Or);
        group.add(eq("b", 2).unwrap()).unwrap();
        assert_eq!(render(&mut set), r#""a" = :eq1 AND "b" = :eq2"#);

        set.get_mut(1)
            .and_then(Predicate::as_set_mut)
            .unwrap()
            .add(is_null("c").unwrap())
            .unwrap();
        assert_eq!(
            render(&mut set),
            r#""a" = :eq1 AND ("b" = :eq2 OR "c" IS NULL)"#
        );
    }

    #[test]
    fn test_empty_entries_consume_no_operator() {
        let mut set = PredicateSet::new();
        set.nest();
        set.or(eq("a", 1).unwrap()).unwrap();
        set.nest();
        set.and(eq("b", 2).unwrap()).unwrap();
        assert_eq!(render(&mut set), r#""a" = :eq1 AND "b" = :eq2"#);
    }

    #[test]
    fn test_add_set_and_clause() {
        let mut inner = PredicateSet::with_operator(LogicalOp::Or);
        inner.add(lt("a", 1).unwrap()).unwrap();
        inner.add(gt("a", 9).unwrap()).unwrap();

        let mut set = PredicateSet::new();
        set.add(&inner).unwrap();
        set.add(inner).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(
            render(&mut set),
            r#"("a" < :lt1 OR "a" > :gt1) AND ("a" < :lt2 OR "a" > :gt2)"#
        );

        let mut clause = Clause::where_clause();
        clause.add("1 = 1").unwrap();
        let mut set = PredicateSet::new();
        set.add(clause).unwrap();
        assert_eq!(render(&mut set), "1 = 1");
    }

    #[test]
    fn test_mutation_invalidates_cache() {
        let mut set = PredicateSet::new();
        set.add(eq("a", 1).unwrap()).unwrap();
        render(&mut set);
        assert!(set.is_cached());
        set.add(eq("b", 2).unwrap()).unwrap();
        assert!(!set.is_cached());
        render(&mut set);
        set.clear();
        assert!(!set.is_cached());
        assert!(set.is_empty());
    }

    #[test]
    fn test_nested_mutation_keeps_siblings_cached() {
        let mut set = PredicateSet::new();
        set.nest().add(eq("a", 1).unwrap()).unwrap().add(eq("b", 1).unwrap()).unwrap();
        set.nest().add(eq("c", 1).unwrap()).unwrap().add(eq("d", 1).unwrap()).unwrap();
        render(&mut set);

        set.get_mut(1)
            .and_then(Predicate::as_set_mut)
            .unwrap()
            .add(eq("e", 1).unwrap())
            .unwrap();
        assert!(!set.is_cached());
        let first = set.iter().next().and_then(|(_, p)| p.as_set()).unwrap();
        assert!(first.is_cached());
    }

    #[test]
    fn test_failed_add_leaves_set_unchanged() {
        let mut set = PredicateSet::new();
        set.add(eq("a", 1).unwrap()).unwrap();
        let spec = serde_json::json!([{"b": 1}, ["c", "~", 1]]);
        assert!(set.add(spec).is_err());
        assert_eq!(set.len(), 1);
        assert!(set.add("").is_err());
        assert_eq!(set.len(), 1);
    }
}
