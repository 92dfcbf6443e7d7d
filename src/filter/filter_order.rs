use crate::database::topology::TableDef;

use super::error::FilterError;
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse `"date desc, created_at"` style ordering from a query string.
    pub fn parse(clause: &str) -> Vec<FilterOrderInfo> {
        let mut out = Vec::new();
        for part in clause.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() { continue; }
            let mut it = trimmed.split_whitespace();
            if let Some(col) = it.next() {
                let dir = it.next().unwrap_or("asc");
                let sort = if dir.eq_ignore_ascii_case("desc") { SortDirection::Desc } else { SortDirection::Asc };
                out.push(FilterOrderInfo { column: col.to_string(), sort });
            }
        }
        out
    }

    pub fn generate(def: &TableDef, alias: &str, infos: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if infos.is_empty() { return Ok(String::new()); }
        let mut parts = Vec::with_capacity(infos.len());
        for info in infos {
            if def.column_type(&info.column).is_none() {
                return Err(FilterError::InvalidColumn(format!("{}.{}", def.table, info.column)));
            }
            parts.push(format!("{}.\"{}\" {}", alias, info.column, info.sort.to_sql()));
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }

    pub fn generate_limit(limit: Option<i64>, offset: Option<i64>) -> Result<String, FilterError> {
        if let Some(l) = limit { if l < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); } }
        if let Some(o) = offset { if o < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }
        Ok(match (limit, offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::identifier::LogicalTable;
    use crate::database::topology::table_def;

    #[test]
    fn parses_order_strings() {
        let infos = FilterOrder::parse("date desc, created_at");
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].column, "date");
        assert_eq!(infos[0].sort, SortDirection::Desc);
        assert_eq!(infos[1].sort, SortDirection::Asc);
    }

    #[test]
    fn generates_quoted_order_by() {
        let infos = FilterOrder::parse("order asc");
        let sql = FilterOrder::generate(table_def(LogicalTable::Todos), "t", &infos).unwrap();
        assert_eq!(sql, "ORDER BY t.\"order\" ASC");
    }

    #[test]
    fn rejects_unknown_order_column() {
        let infos = FilterOrder::parse("1; DROP TABLE todos");
        assert!(FilterOrder::generate(table_def(LogicalTable::Todos), "t", &infos).is_err());
    }

    #[test]
    fn rejects_negative_paging() {
        assert!(FilterOrder::generate_limit(Some(-1), None).is_err());
        assert!(FilterOrder::generate_limit(None, Some(-5)).is_err());
        assert_eq!(FilterOrder::generate_limit(Some(10), Some(20)).unwrap(), "LIMIT 10 OFFSET 20");
    }
}
