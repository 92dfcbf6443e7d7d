use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$neq")] Neq,
    #[serde(rename = "$gt")] Gt,
    #[serde(rename = "$gte")] Gte,
    #[serde(rename = "$lt")] Lt,
    #[serde(rename = "$lte")] Lte,
    #[serde(rename = "$in")] In,
    /// `data: true` is `IS NULL`, `data: false` is `IS NOT NULL`.
    #[serde(rename = "$null")] Null,
}

#[derive(Debug, Clone)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

/// Predicates, ordering and paging for a list query.
#[derive(Debug, Clone, Default)]
pub struct FilterData {
    pub where_clause: Vec<FilterWhereInfo>,
    pub order: Vec<FilterOrderInfo>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl FilterData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, column: impl Into<String>, operator: FilterOp, data: Value) -> Self {
        self.where_clause.push(FilterWhereInfo { column: column.into(), operator, data });
        self
    }

    pub fn eq(self, column: impl Into<String>, data: impl Into<Value>) -> Self {
        self.condition(column, FilterOp::Eq, data.into())
    }

    pub fn gte(self, column: impl Into<String>, data: impl Into<Value>) -> Self {
        self.condition(column, FilterOp::Gte, data.into())
    }

    pub fn lte(self, column: impl Into<String>, data: impl Into<Value>) -> Self {
        self.condition(column, FilterOp::Lte, data.into())
    }

    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.condition(column, FilterOp::Null, Value::Bool(true))
    }

    pub fn page(mut self, limit: Option<i64>, offset: Option<i64>) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }
}

/// Statement text plus its positional parameters.
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
