use serde_json::Value;

use crate::database::topology::{SqlType, TableDef};

use super::error::FilterError;
use super::types::{FilterOp, FilterWhereInfo};

/// Renders WHERE conditions for one table alias, appending bound values to a
/// shared parameter list so placeholders stay in sequence with the rest of the
/// statement.
pub struct FilterWhere<'a> {
    def: &'static TableDef,
    alias: &'a str,
    params: &'a mut Vec<Value>,
}

impl<'a> FilterWhere<'a> {
    pub fn new(def: &'static TableDef, alias: &'a str, params: &'a mut Vec<Value>) -> Self {
        Self { def, alias, params }
    }

    pub fn generate(&mut self, conditions: &[FilterWhereInfo]) -> Result<Vec<String>, FilterError> {
        conditions.iter().map(|c| self.build_sql_condition(c)).collect()
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let sql_type = self
            .def
            .column_type(&condition.column)
            .ok_or_else(|| FilterError::InvalidColumn(format!("{}.{}", self.def.table, condition.column)))?;
        let column = format!("{}.\"{}\"", self.alias, condition.column);

        Ok(match condition.operator {
            FilterOp::Eq if condition.data.is_null() => format!("{} IS NULL", column),
            FilterOp::Neq if condition.data.is_null() => format!("{} IS NOT NULL", column),
            FilterOp::Eq => format!("{} = {}", column, self.param(condition.data.clone(), sql_type)),
            FilterOp::Neq => format!("{} <> {}", column, self.param(condition.data.clone(), sql_type)),
            FilterOp::Gt => format!("{} > {}", column, self.param(condition.data.clone(), sql_type)),
            FilterOp::Gte => format!("{} >= {}", column, self.param(condition.data.clone(), sql_type)),
            FilterOp::Lt => format!("{} < {}", column, self.param(condition.data.clone(), sql_type)),
            FilterOp::Lte => format!("{} <= {}", column, self.param(condition.data.clone(), sql_type)),
            FilterOp::In => match &condition.data {
                Value::Array(values) if values.is_empty() => "1=0".to_string(),
                Value::Array(values) => {
                    let params: Vec<String> = values.iter().map(|v| self.param(v.clone(), sql_type)).collect();
                    format!("{} IN ({})", column, params.join(", "))
                }
                _ => return Err(FilterError::InvalidOperatorData("$in requires an array".to_string())),
            },
            FilterOp::Null => match condition.data {
                Value::Bool(true) => format!("{} IS NULL", column),
                Value::Bool(false) => format!("{} IS NOT NULL", column),
                _ => return Err(FilterError::InvalidOperatorData("$null requires a boolean".to_string())),
            },
        })
    }

    fn param(&mut self, value: Value, sql_type: SqlType) -> String {
        push_param(self.params, value, sql_type)
    }
}

/// Append a value and return its placeholder cast to the column's type.
///
/// JSONB values travel as their serialized text so every parameter binds as a
/// scalar.
pub fn push_param(params: &mut Vec<Value>, value: Value, sql_type: SqlType) -> String {
    let value = match (sql_type, value) {
        (SqlType::Jsonb, Value::Null) => Value::Null,
        (SqlType::Jsonb, v) => Value::String(v.to_string()),
        (_, v) => v,
    };
    params.push(value);
    format!("${}::{}", params.len(), sql_type.as_sql())
}
