//! Query - equality filters, single-field ordering and a limit.

use std::cmp::Ordering;

use serde_json::Value;

use super::Document;

/// Equality filter on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A collection query. The default query returns every document.
///
/// ```
/// use portfolio_sync::store::Query;
///
/// let q = Query::new().filter_eq("categoryName", "Databases").limit(1);
/// assert_eq!(q.limit, Some(1));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.filters
            .iter()
            .all(|f| doc.get(&f.field) == Some(&f.value))
    }

    /// Filter, sort and truncate `docs` according to this query.
    ///
    /// Documents missing the ordering field sort after every document that has
    /// it, in either direction.
    pub fn apply(&self, docs: impl IntoIterator<Item = Document>) -> Vec<Document> {
        let mut out: Vec<Document> = docs.into_iter().filter(|d| self.matches(d)).collect();

        if let Some(order_by) = &self.order_by {
            out.sort_by(|a, b| {
                match (a.get(&order_by.field), b.get(&order_by.field)) {
                    (Some(x), Some(y)) => {
                        let ord = compare_values(x, y);
                        match order_by.direction {
                            Direction::Asc => ord,
                            Direction::Desc => ord.reverse(),
                        }
                    }
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
                .then_with(|| a.id.cmp(&b.id))
            });
        }

        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::MAX);
            let y = y.as_f64().unwrap_or(f64::MAX);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}
