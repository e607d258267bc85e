use serde_json::Value;

use super::action::{QuerySpec, Verb};
use crate::error::ConfigError;
use crate::store::{Operator, SortOrder, StoreQuery};

/// Handler template installed for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// GET filtered by `paramKey <op> <path value>`, refined by the query
    ParamQuery,
    /// GET of one document by the id in the path
    PointLookup,
    /// GET filtered/ordered/limited per the query
    CollectionQuery,
    /// GET of every document
    CollectionScan,
    Create,
    Replace,
    PartialUpdate,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRule {
    None,
    /// Every attribute must be present
    Full,
    /// At least one attribute must be present; falsy entries are dropped
    Partial,
}

/// What the shared validation pipeline enforces before a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requirements {
    pub body: BodyRule,
    pub param: bool,
}

impl HandlerKind {
    /// Picks the template from the verb and which optional parts the action declares.
    pub fn select(verb: Verb, has_param: bool, has_query: bool) -> Self {
        match verb {
            Verb::Get => match (has_param, has_query) {
                (true, true) => HandlerKind::ParamQuery,
                (true, false) => HandlerKind::PointLookup,
                (false, true) => HandlerKind::CollectionQuery,
                (false, false) => HandlerKind::CollectionScan,
            },
            Verb::Post => HandlerKind::Create,
            Verb::Put => HandlerKind::Replace,
            Verb::Patch => HandlerKind::PartialUpdate,
            Verb::Delete => HandlerKind::Delete,
        }
    }

    pub fn verb(&self) -> Verb {
        match self {
            HandlerKind::ParamQuery
            | HandlerKind::PointLookup
            | HandlerKind::CollectionQuery
            | HandlerKind::CollectionScan => Verb::Get,
            HandlerKind::Create => Verb::Post,
            HandlerKind::Replace => Verb::Put,
            HandlerKind::PartialUpdate => Verb::Patch,
            HandlerKind::Delete => Verb::Delete,
        }
    }

    pub fn requirements(&self) -> Requirements {
        let (body, param) = match self {
            HandlerKind::ParamQuery | HandlerKind::PointLookup | HandlerKind::Delete => (BodyRule::None, true),
            HandlerKind::CollectionQuery | HandlerKind::CollectionScan => (BodyRule::None, false),
            HandlerKind::Create => (BodyRule::Full, false),
            HandlerKind::Replace => (BodyRule::Full, true),
            HandlerKind::PartialUpdate => (BodyRule::Partial, true),
        };
        Requirements { body, param }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HandlerKind::ParamQuery => "param-query",
            HandlerKind::PointLookup => "point-lookup",
            HandlerKind::CollectionQuery => "collection-query",
            HandlerKind::CollectionScan => "collection-scan",
            HandlerKind::Create => "create",
            HandlerKind::Replace => "replace",
            HandlerKind::PartialUpdate => "partial-update",
            HandlerKind::Delete => "delete",
        }
    }
}

/// A query checked at install time.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// Static part of the read: attribute filter, ordering and limit
    pub base: StoreQuery,
    /// Operator applied between `paramKey` and the path value (param queries only)
    pub param_operator: Operator,
}

impl CompiledQuery {
    pub fn scan() -> Self {
        Self { base: StoreQuery::new(), param_operator: Operator::Eq }
    }
}

/// Validates a declared query and turns it into a store query.
pub fn compile_query(endpoint: &str, kind: HandlerKind, spec: &QuerySpec) -> Result<CompiledQuery, ConfigError> {
    let operator = spec.operator.as_deref().map(str::parse::<Operator>).transpose()?;
    let order = spec.order.as_deref().map(str::parse::<SortOrder>).transpose()?;

    if let Some(limit) = spec.limit {
        if order.is_none() && operator.is_none() {
            return Err(ConfigError::LimitWithoutOrder(endpoint.to_string()));
        }
        if limit <= 0 {
            return Err(ConfigError::InvalidLimit(endpoint.to_string()));
        }
    }

    let mut base = StoreQuery::new();

    if kind == HandlerKind::CollectionQuery {
        match (operator, &spec.attribute) {
            (Some(op), Some(attribute)) => base = base.filter(attribute.clone(), op, spec.value.clone()),
            (Some(_), None) => return Err(ConfigError::MissingQueryAttribute(endpoint.to_string())),
            (None, Some(attribute)) => {
                tracing::warn!("Query on {} names attribute '{}' without an operator; no filter applied", endpoint, attribute);
            }
            (None, None) => {}
        }
    } else if spec.attribute.is_some() || spec.value != Value::Null {
        tracing::warn!("Query on {} filters by its path parameter; attribute/value are ignored", endpoint);
    }

    match (&spec.order_by, order) {
        (Some(field), Some(order)) => base = base.order_by(field.clone(), order),
        (Some(field), None) => {
            tracing::warn!("Query on {} has orderBy '{}' without order; results are unordered", endpoint, field);
        }
        (None, Some(_)) => {
            tracing::warn!("Query on {} has order without orderBy; results are unordered", endpoint);
        }
        (None, None) => {}
    }

    if let Some(limit) = spec.limit {
        base = base.limit(limit as usize);
    }

    Ok(CompiledQuery { base, param_operator: operator.unwrap_or(Operator::Eq) })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn selection_table() {
        use HandlerKind::*;
        assert_eq!(HandlerKind::select(Verb::Get, true, true), ParamQuery);
        assert_eq!(HandlerKind::select(Verb::Get, true, false), PointLookup);
        assert_eq!(HandlerKind::select(Verb::Get, false, true), CollectionQuery);
        assert_eq!(HandlerKind::select(Verb::Get, false, false), CollectionScan);
        for (has_param, has_query) in [(true, true), (false, false)] {
            assert_eq!(HandlerKind::select(Verb::Post, has_param, has_query), Create);
            assert_eq!(HandlerKind::select(Verb::Put, has_param, has_query), Replace);
            assert_eq!(HandlerKind::select(Verb::Patch, has_param, has_query), PartialUpdate);
            assert_eq!(HandlerKind::select(Verb::Delete, has_param, has_query), Delete);
        }
    }

    #[test]
    fn requirements_per_template() {
        let r = HandlerKind::PartialUpdate.requirements();
        assert_eq!(r, Requirements { body: BodyRule::Partial, param: true });
        let r = HandlerKind::Create.requirements();
        assert_eq!(r, Requirements { body: BodyRule::Full, param: false });
        assert!(HandlerKind::PointLookup.requirements().param);
        assert!(!HandlerKind::CollectionScan.requirements().param);
    }

    #[test]
    fn limit_on_its_own_is_rejected() {
        let spec = QuerySpec { limit: Some(5), order_by: Some("age".into()), ..Default::default() };
        let err = compile_query("/users", HandlerKind::CollectionQuery, &spec).unwrap_err();
        assert!(matches!(err, ConfigError::LimitWithoutOrder(_)));
    }

    #[test]
    fn limit_with_order_or_operator_is_accepted() {
        let spec = QuerySpec { limit: Some(5), order: Some("asc".into()), ..Default::default() };
        let compiled = compile_query("/users", HandlerKind::CollectionQuery, &spec).unwrap();
        assert_eq!(compiled.base.limit, Some(5));
        assert!(compiled.base.order_by.is_none());

        let spec = QuerySpec {
            attribute: Some("age".into()),
            operator: Some(">".into()),
            value: json!(20),
            limit: Some(2),
            ..Default::default()
        };
        let compiled = compile_query("/users", HandlerKind::CollectionQuery, &spec).unwrap();
        assert_eq!(compiled.base.filters.len(), 1);
        assert_eq!(compiled.base.filters[0].operator, Operator::Gt);
    }

    #[test]
    fn non_positive_limit_is_rejected() {
        let spec = QuerySpec { limit: Some(0), order: Some("asc".into()), ..Default::default() };
        let err = compile_query("/users", HandlerKind::CollectionQuery, &spec).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLimit(_)));
    }

    #[test]
    fn operator_needs_attribute_for_collection_query() {
        let spec = QuerySpec { operator: Some("==".into()), value: json!("x"), ..Default::default() };
        let err = compile_query("/users", HandlerKind::CollectionQuery, &spec).unwrap_err();
        assert!(matches!(err, ConfigError::MissingQueryAttribute(_)));

        // the path parameter supplies the field for param queries
        let compiled = compile_query("/users/:city", HandlerKind::ParamQuery, &spec).unwrap();
        assert!(compiled.base.filters.is_empty());
        assert_eq!(compiled.param_operator, Operator::Eq);
    }

    #[test]
    fn unknown_operator_and_order_are_rejected() {
        let spec = QuerySpec { operator: Some("like".into()), attribute: Some("a".into()), ..Default::default() };
        assert!(matches!(
            compile_query("/x", HandlerKind::CollectionQuery, &spec),
            Err(ConfigError::UnknownOperator(_))
        ));

        let spec = QuerySpec { order_by: Some("a".into()), order: Some("up".into()), ..Default::default() };
        assert!(matches!(
            compile_query("/x", HandlerKind::CollectionQuery, &spec),
            Err(ConfigError::UnknownSortOrder(_))
        ));
    }

    #[test]
    fn order_requires_both_fields() {
        let spec = QuerySpec { order_by: Some("age".into()), order: Some("desc".into()), ..Default::default() };
        let compiled = compile_query("/users", HandlerKind::CollectionQuery, &spec).unwrap();
        let order_by = compiled.base.order_by.unwrap();
        assert_eq!(order_by.field, "age");
        assert_eq!(order_by.order, SortOrder::Desc);
    }
}
