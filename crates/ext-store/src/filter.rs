//! Query conditions over extension records
//!
//! A [`Filter`] is an ordered list of conditions plus an optional row limit.
//! Conditions are evaluated in order and all must hold; the limit is applied
//! after filtering, over records in id order.

use std::fmt;
use std::sync::Arc;

use crate::record::Extension;

/// Persisted columns of an [`Extension`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Slug,
    Name,
    Version,
    Author,
    Description,
    IsCore,
    Enabled,
}

/// A column value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Text(String),
    Bool(bool),
    Null,
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

type PredicateFn = dyn Fn(&Extension) -> bool + Send + Sync;

/// A single query condition.
#[derive(Clone)]
pub enum Condition {
    Eq(Field, Value),
    Ne(Field, Value),
    /// Arbitrary caller-supplied test.
    Predicate(Arc<PredicateFn>),
}

impl Condition {
    pub fn matches(&self, record: &Extension) -> bool {
        match self {
            Condition::Eq(field, value) => record.field(*field) == *value,
            Condition::Ne(field, value) => record.field(*field) != *value,
            Condition::Predicate(f) => f(record),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Eq(field, value) => f.debug_tuple("Eq").field(field).field(value).finish(),
            Condition::Ne(field, value) => f.debug_tuple("Ne").field(field).field(value).finish(),
            Condition::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Ordered conjunction of [`Condition`]s with an optional limit.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
    limit: Option<usize>,
}

impl Filter {
    /// A filter that matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: Field, value: impl Into<Value>) -> Self {
        Self::all().and(Condition::Eq(field, value.into()))
    }

    pub fn ne(field: Field, value: impl Into<Value>) -> Self {
        Self::all().and(Condition::Ne(field, value.into()))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Extension) -> bool + Send + Sync + 'static,
    {
        Self::all().and(Condition::Predicate(Arc::new(f)))
    }

    /// Append a condition.
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Append every condition of `other`. The tighter of the two limits wins.
    pub fn merge(mut self, other: &Filter) -> Self {
        self.conditions.extend(other.conditions.iter().cloned());
        self.limit = match (self.limit, other.limit) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn max_rows(&self) -> Option<usize> {
        self.limit
    }

    pub fn matches(&self, record: &Extension) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
    }

    /// Filter `records` (already in id order) and apply the limit.
    pub fn apply<'a, I>(&self, records: I) -> Vec<Extension>
    where
        I: IntoIterator<Item = &'a Extension>,
    {
        let matching = records.into_iter().filter(|r| self.matches(r)).cloned();
        match self.limit {
            Some(n) => matching.take(n).collect(),
            None => matching.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::NewExtension;
    use rstest::rstest;

    fn sample() -> Vec<Extension> {
        vec![
            NewExtension::new("users").with_core(true).with_enabled(true).into_record(1),
            NewExtension::new("menus").with_enabled(true).into_record(2),
            NewExtension::new("blog").with_author("Ann").into_record(3),
        ]
    }

    fn slugs(records: &[Extension]) -> Vec<&str> {
        records.iter().map(|r| r.slug.as_str()).collect()
    }

    #[rstest]
    #[case(Filter::all(), vec!["users", "menus", "blog"])]
    #[case(Filter::eq(Field::Enabled, true), vec!["users", "menus"])]
    #[case(Filter::ne(Field::Slug, "menus"), vec!["users", "blog"])]
    #[case(Filter::eq(Field::Author, Value::Null), vec!["users", "menus"])]
    #[case(Filter::eq(Field::IsCore, true), vec!["users"])]
    #[case(Filter::all().limit(2), vec!["users", "menus"])]
    #[case(Filter::predicate(|r| r.id > 1), vec!["menus", "blog"])]
    fn filter_selects_expected_records(#[case] filter: Filter, #[case] expected: Vec<&str>) {
        let records = sample();
        assert_eq!(slugs(&filter.apply(&records)), expected);
    }

    #[test]
    fn merge_appends_conditions_in_order() {
        let base = Filter::eq(Field::Enabled, true);
        let caller = Filter::ne(Field::Slug, "users").limit(5);

        let merged = base.merge(&caller);

        assert_eq!(merged.conditions().len(), 2);
        assert!(matches!(merged.conditions()[0], Condition::Eq(Field::Enabled, _)));
        assert_eq!(merged.max_rows(), Some(5));
        assert_eq!(slugs(&merged.apply(&sample())), vec!["menus"]);
    }

    #[test]
    fn merge_keeps_tighter_limit() {
        let merged = Filter::all().limit(1).merge(&Filter::all().limit(3));
        assert_eq!(merged.max_rows(), Some(1));
    }
}
