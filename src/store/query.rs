use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Comparison operators accepted in `where` clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    ArrayContains,
    ArrayContainsAny,
    In,
    NotIn,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::ArrayContains => "array-contains",
            Operator::ArrayContainsAny => "array-contains-any",
            Operator::In => "in",
            Operator::NotIn => "not-in",
        }
    }
}

impl FromStr for Operator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "array-contains" => Operator::ArrayContains,
            "array-contains-any" => Operator::ArrayContainsAny,
            "in" => Operator::In,
            "not-in" => Operator::NotIn,
            other => return Err(ConfigError::UnknownOperator(other.to_string())),
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortOrder::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortOrder::Desc)
        } else {
            Err(ConfigError::UnknownSortOrder(s.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self { field: field.into(), operator, value }
    }

    /// Evaluates the filter against a document's fields. A document without
    /// the field never matches, whatever the operator.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        let Some(actual) = fields.get(&self.field) else {
            return false;
        };

        match self.operator {
            Operator::Eq => values_eq(actual, &self.value),
            Operator::Ne => !values_eq(actual, &self.value),
            Operator::Lt => same_type_cmp(actual, &self.value) == Some(Ordering::Less),
            Operator::Lte => matches!(same_type_cmp(actual, &self.value), Some(Ordering::Less | Ordering::Equal)),
            Operator::Gt => same_type_cmp(actual, &self.value) == Some(Ordering::Greater),
            Operator::Gte => matches!(same_type_cmp(actual, &self.value), Some(Ordering::Greater | Ordering::Equal)),
            Operator::ArrayContains => actual.as_array().map(|arr| contains(arr, &self.value)).unwrap_or(false),
            Operator::ArrayContainsAny => match (actual.as_array(), self.value.as_array()) {
                (Some(arr), Some(wanted)) => wanted.iter().any(|w| contains(arr, w)),
                _ => false,
            },
            Operator::In => self.value.as_array().map(|arr| contains(arr, actual)).unwrap_or(false),
            Operator::NotIn => self.value.as_array().map(|arr| !contains(arr, actual)).unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub order: SortOrder,
}

/// Filters, ordering and limit for a collection read. An empty query is a full scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreQuery {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl StoreQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, operator: Operator, value: Value) -> Self {
        self.filters.push(Filter::new(field, operator, value));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.order_by = Some(OrderBy { field: field.into(), order });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        self.filters.iter().all(|f| f.matches(fields))
            && self.order_by.as_ref().map(|o| fields.contains_key(&o.field)).unwrap_or(true)
    }
}

/// Equality between JSON values where numbers compare by value, so `18` equals `18.0`.
pub fn values_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(x), Value::Array(y)) => x.len() == y.len() && x.iter().zip(y).all(|(v, w)| values_eq(v, w)),
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len() && x.iter().all(|(k, v)| y.get(k).map(|w| values_eq(v, w)).unwrap_or(false))
        }
        _ => a == b,
    }
}

fn contains(arr: &[Value], value: &Value) -> bool {
    arr.iter().any(|v| values_eq(v, value))
}

/// Ordering between two values of the same JSON type; `None` across types.
pub fn same_type_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order used for `orderBy`: values rank by type first, then by value.
pub fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    same_type_cmp(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn parses_operators() {
        assert_eq!("==".parse::<Operator>().unwrap(), Operator::Eq);
        assert_eq!("not-in".parse::<Operator>().unwrap(), Operator::NotIn);
        assert!(matches!("~=".parse::<Operator>(), Err(ConfigError::UnknownOperator(_))));
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn range_filters_only_match_same_type() {
        let f = Filter::new("age", Operator::Gte, json!(18));
        assert!(f.matches(&doc(json!({"age": 18}))));
        assert!(f.matches(&doc(json!({"age": 40.5}))));
        assert!(!f.matches(&doc(json!({"age": 12}))));
        assert!(!f.matches(&doc(json!({"age": "40"}))));
        assert!(!f.matches(&doc(json!({"name": "Ann"}))));
    }

    #[test]
    fn inequality_excludes_missing_fields() {
        let f = Filter::new("role", Operator::Ne, json!("admin"));
        assert!(f.matches(&doc(json!({"role": "user"}))));
        assert!(!f.matches(&doc(json!({"role": "admin"}))));
        assert!(!f.matches(&doc(json!({}))));
    }

    #[test]
    fn array_operators() {
        let d = doc(json!({"tags": ["a", "b"], "kind": "x"}));
        assert!(Filter::new("tags", Operator::ArrayContains, json!("a")).matches(&d));
        assert!(Filter::new("tags", Operator::ArrayContainsAny, json!(["z", "b"])).matches(&d));
        assert!(Filter::new("kind", Operator::In, json!(["x", "y"])).matches(&d));
        assert!(!Filter::new("kind", Operator::NotIn, json!(["x"])).matches(&d));
    }

    #[test]
    fn equality_treats_integer_and_float_numbers_alike() {
        let d = doc(json!({"age": 18.0, "scores": [1.0, 2.5], "meta": {"rank": 3.0}}));
        assert!(Filter::new("age", Operator::Eq, json!(18)).matches(&d));
        assert!(!Filter::new("age", Operator::Ne, json!(18)).matches(&d));
        assert!(Filter::new("age", Operator::Gte, json!(18)).matches(&d));
        assert!(Filter::new("age", Operator::In, json!([17, 18])).matches(&d));
        assert!(!Filter::new("age", Operator::NotIn, json!([18])).matches(&d));
        assert!(Filter::new("scores", Operator::ArrayContains, json!(1)).matches(&d));
        assert!(Filter::new("scores", Operator::ArrayContainsAny, json!([9, 1])).matches(&d));
        assert!(Filter::new("meta", Operator::Eq, json!({"rank": 3})).matches(&d));
        assert!(!Filter::new("age", Operator::Eq, json!("18")).matches(&d));
    }

    #[test]
    fn ordering_requires_field() {
        let q = StoreQuery::new().order_by("age", SortOrder::Asc);
        assert!(q.matches(&doc(json!({"age": 1}))));
        assert!(!q.matches(&doc(json!({"name": "Ann"}))));
    }
}
