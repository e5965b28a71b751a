//! Filter evaluation and ordering over stored BSON documents.

use bson::{Bson, Document, datetime::DateTime};
use std::{cmp::Ordering, collections::HashMap};

use docflow_core::{
    document::ID_FIELD,
    error::DocumentStoreError,
    query::{Expr, FieldOp, QueryVisitor, Sort, SortDirection},
};

/// Normalized view of a BSON value for comparisons.
///
/// Integers and doubles compare as `f64`; types without a natural order only support
/// equality.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            _ => Comparable::Null,
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a dotted path (`address.city`) through nested documents.
pub(crate) fn resolve<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }

    Some(current)
}

/// Evaluates a filter against one document.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn matches(document: &'a Document, expr: &Expr) -> bool {
        DocumentEvaluator::new(document)
            .visit_expr(expr)
            .unwrap_or(false)
    }
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(resolve(self.document, field).is_some() == should_exist)
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = resolve(self.document, field) else {
            return Ok(op == FieldOp::Ne);
        };

        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        Ok(match op {
            FieldOp::Eq => left == right,
            FieldOp::Ne => left != right,
            FieldOp::Gt => left.partial_cmp(&right) == Some(Ordering::Greater),
            FieldOp::Gte => matches!(
                left.partial_cmp(&right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            FieldOp::Lt => left.partial_cmp(&right) == Some(Ordering::Less),
            FieldOp::Lte => matches!(
                left.partial_cmp(&right),
                Some(Ordering::Less | Ordering::Equal)
            ),
            FieldOp::StartsWith => match (left, right) {
                (Comparable::String(left), Comparable::String(prefix)) => left.starts_with(prefix),
                _ => false,
            },
            FieldOp::AnyOf => match right {
                Comparable::Array(values) => values.iter().any(|candidate| candidate == &left),
                single => single == left,
            },
        })
    }
}

/// Orders documents by the sort field, falling back to id order.
///
/// Documents missing the sort field, or holding an incomparable value, sort first in
/// ascending order. Ties break on id so the order is total and stable across pages.
pub(crate) fn compare(a: &Document, b: &Document, sort: Option<&Sort>) -> Ordering {
    let by_id = || {
        let left = a.get_str(ID_FIELD).unwrap_or_default();
        let right = b.get_str(ID_FIELD).unwrap_or_default();
        left.cmp(right)
    };

    let Some(sort) = sort else {
        return by_id();
    };

    let ordering = match (resolve(a, &sort.field), resolve(b, &sort.field)) {
        (Some(left), Some(right)) => Comparable::from(left)
            .partial_cmp(&Comparable::from(right))
            .unwrap_or(Ordering::Equal),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    let ordering = match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    };

    ordering.then_with(by_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docflow_core::query::Filter;

    fn andersen() -> Document {
        doc! {
            "id": "Andersen.1",
            "lastName": "Andersen",
            "address": { "state": "WA", "county": "King", "city": "Seattle" },
            "children": [ { "firstName": "Henriette Thaulow", "grade": 5 } ],
            "isRegistered": true,
        }
    }

    #[test]
    fn resolves_nested_paths() {
        let doc = andersen();
        assert_eq!(resolve(&doc, "address.city"), Some(&Bson::String("Seattle".into())));
        assert_eq!(resolve(&doc, "address.zip"), None);
        assert_eq!(resolve(&doc, "lastName.length"), None);
    }

    #[test]
    fn evaluates_field_operators() {
        let doc = andersen();
        let cases = [
            (Filter::eq("lastName", "Andersen"), true),
            (Filter::eq("lastName", "Wakefield"), false),
            (Filter::ne("lastName", "Wakefield"), true),
            (Filter::ne("nickname", "x"), true),
            (Filter::starts_with("address.county", "Ki"), true),
            (Filter::any_of("address.state", ["NY", "WA"]), true),
            (Filter::any_of("address.state", ["NY"]), false),
            (Filter::gt("lastName", "A"), true),
            (Filter::lte("lastName", "Andersen"), true),
            (Filter::lt("isRegistered", 3), false),
            (Filter::exists("address.county"), true),
            (Filter::not_exists("address.zip"), true),
        ];

        for (expr, expected) in cases {
            assert_eq!(DocumentEvaluator::matches(&doc, &expr), expected, "{expr:?}");
        }
    }

    #[test]
    fn combines_expressions() {
        let doc = andersen();
        let expr = Filter::eq("lastName", "Andersen")
            .and(Filter::eq("isRegistered", true).or(Filter::eq("address.state", "NY")));
        assert!(DocumentEvaluator::matches(&doc, &expr));
        assert!(!DocumentEvaluator::matches(&doc, &expr.not()));
    }

    #[test]
    fn numbers_compare_across_widths() {
        let doc = doc! { "id": "x", "grade": 5_i64 };
        assert!(DocumentEvaluator::matches(&doc, &Filter::eq("grade", 5_i32)));
        assert!(DocumentEvaluator::matches(&doc, &Filter::gte("grade", 4.5)));
    }

    #[test]
    fn sorts_by_field_then_id() {
        let a = doc! { "id": "a", "rank": 2 };
        let b = doc! { "id": "b", "rank": 1 };
        let c = doc! { "id": "c", "rank": 1 };
        let sort = Sort { field: "rank".into(), direction: SortDirection::Asc };

        let mut docs = vec![a.clone(), b.clone(), c.clone()];
        docs.sort_by(|x, y| compare(x, y, Some(&sort)));
        assert_eq!(docs, vec![b.clone(), c.clone(), a.clone()]);

        docs.sort_by(|x, y| compare(x, y, None));
        assert_eq!(docs, vec![a, b, c]);
    }
}
