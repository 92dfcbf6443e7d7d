use serde_json::{Map, Value};
use sqlx::{self, postgres::PgArguments, Executor, Postgres, Row};
use uuid::Uuid;

use crate::database::identifier::{LogicalTable, TenantSchema};
use crate::database::manager::DatabaseError;
use crate::database::topology::{table_def, Owner, SqlType, TableDef};
use crate::filter::filter_order::FilterOrder;
use crate::filter::filter_where::{push_param, FilterWhere};
use crate::filter::types::{FilterData, FilterOrderInfo, SqlResult};
use crate::filter::FilterError;

const ALIAS: &str = "t";

/// Builds and runs statements against one table of one tenant schema, always
/// on behalf of one owner.
///
/// Rows come back as JSON objects (`row_to_json`) so the same builder serves
/// every table in the topology.
pub struct QueryBuilder<'a> {
    schema: &'a TenantSchema,
    def: &'static TableDef,
    owner_id: Uuid,
    filter: FilterData,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(schema: &'a TenantSchema, table: LogicalTable, owner_id: Uuid) -> Self {
        Self {
            schema,
            def: table_def(table),
            owner_id,
            filter: FilterData::default(),
        }
    }

    pub fn filter(mut self, filter_data: FilterData) -> Self {
        self.filter = filter_data;
        self
    }

    pub fn table(&self) -> LogicalTable {
        self.def.table
    }

    pub fn find_by_id_sql(&self, id: Uuid) -> SqlResult {
        let mut params = vec![Value::String(self.owner_id.to_string())];
        let owner = ownership_clause(self.schema, self.def, ALIAS, "$1::UUID");
        let id_ph = push_param(&mut params, Value::String(id.to_string()), SqlType::Uuid);
        SqlResult {
            query: format!(
                "SELECT row_to_json({a}) AS row FROM {table} {a} WHERE {a}.\"id\" = {id} AND {owner}",
                a = ALIAS,
                table = self.schema.qualify(self.def.table),
                id = id_ph,
                owner = owner,
            ),
            params,
        }
    }

    pub fn list_sql(&self) -> Result<SqlResult, DatabaseError> {
        let mut params = vec![Value::String(self.owner_id.to_string())];
        let mut conditions = vec![ownership_clause(self.schema, self.def, ALIAS, "$1::UUID")];
        conditions.extend(FilterWhere::new(self.def, ALIAS, &mut params).generate(&self.filter.where_clause)?);

        let order_infos: Vec<FilterOrderInfo> = if self.filter.order.is_empty() {
            self.def
                .default_order
                .iter()
                .map(|(column, sort)| FilterOrderInfo { column: column.to_string(), sort: *sort })
                .collect()
        } else {
            self.filter.order.clone()
        };
        let order = FilterOrder::generate(self.def, ALIAS, &order_infos)?;
        let limit = FilterOrder::generate_limit(self.filter.limit, self.filter.offset)?;

        let mut query = format!(
            "SELECT row_to_json({a}) AS row FROM {table} {a} WHERE {conditions}",
            a = ALIAS,
            table = self.schema.qualify(self.def.table),
            conditions = conditions.join(" AND "),
        );
        for clause in [order, limit] {
            if !clause.is_empty() {
                query.push(' ');
                query.push_str(&clause);
            }
        }
        Ok(SqlResult { query, params })
    }

    /// Insert with a generated id; `user_id` is stamped from the owner.
    ///
    /// Tables that inherit ownership insert through `SELECT ... WHERE EXISTS`
    /// on the parent chain, so a foreign parent yields no row.
    pub fn insert_sql(&self, data: &Map<String, Value>, skip_conflicts: bool) -> Result<SqlResult, DatabaseError> {
        self.check_writable(data)?;

        let mut params = vec![];
        let mut columns = vec!["\"id\"".to_string()];
        let mut values = vec![push_param(&mut params, Value::String(Uuid::new_v4().to_string()), SqlType::Uuid)];

        if self.def.owner == Owner::Direct {
            columns.push("\"user_id\"".to_string());
            values.push(push_param(&mut params, Value::String(self.owner_id.to_string()), SqlType::Uuid));
        }

        let mut parent_link = None;
        for column in self.def.columns {
            if let Some(value) = data.get(column.name) {
                let placeholder = push_param(&mut params, value.clone(), column.sql_type);
                if let Owner::Via { column: link, .. } = self.def.owner {
                    if link == column.name {
                        parent_link = Some(placeholder.clone());
                    }
                }
                columns.push(format!("\"{}\"", column.name));
                values.push(placeholder);
            }
        }

        let target = self.schema.qualify(self.def.table);
        let conflict = if skip_conflicts { " ON CONFLICT DO NOTHING" } else { "" };
        let insert = match self.def.owner {
            Owner::Direct => format!(
                "INSERT INTO {} ({}) VALUES ({}){} RETURNING *",
                target,
                columns.join(", "),
                values.join(", "),
                conflict
            ),
            Owner::Via { column, parent } => {
                let link = match parent_link {
                    Some(link) if !data.get(column).map_or(true, Value::is_null) => link,
                    _ => return Err(DatabaseError::InvalidValue(format!("{} is required", column))),
                };
                let owner_ph = push_param(&mut params, Value::String(self.owner_id.to_string()), SqlType::Uuid);
                format!(
                    "INSERT INTO {} ({}) SELECT {} WHERE {}{} RETURNING *",
                    target,
                    columns.join(", "),
                    values.join(", "),
                    parent_chain(self.schema, &link, parent, &owner_ph),
                    conflict
                )
            }
        };

        Ok(SqlResult { query: wrap_written(&insert), params })
    }

    /// Partial update of the supplied fields; `updated_at` is bumped.
    pub fn update_sql(&self, id: Uuid, data: &Map<String, Value>) -> Result<SqlResult, DatabaseError> {
        self.check_writable(data)?;
        if let Owner::Via { column, .. } = self.def.owner {
            if data.contains_key(column) {
                return Err(DatabaseError::InvalidValue(format!("{} cannot be changed", column)));
            }
        }

        let mut params = vec![Value::String(self.owner_id.to_string())];
        let owner = ownership_clause(self.schema, self.def, ALIAS, "$1::UUID");
        let mut assignments = vec![];
        for column in self.def.columns {
            if let Some(value) = data.get(column.name) {
                let placeholder = push_param(&mut params, value.clone(), column.sql_type);
                assignments.push(format!("\"{}\" = {}", column.name, placeholder));
            }
        }
        assignments.push("\"updated_at\" = NOW()".to_string());
        let id_ph = push_param(&mut params, Value::String(id.to_string()), SqlType::Uuid);

        let update = format!(
            "UPDATE {table} {a} SET {set} WHERE {a}.\"id\" = {id} AND {owner} RETURNING {a}.*",
            table = self.schema.qualify(self.def.table),
            a = ALIAS,
            set = assignments.join(", "),
            id = id_ph,
            owner = owner,
        );
        Ok(SqlResult { query: wrap_written(&update), params })
    }

    pub fn delete_sql(&self, id: Uuid) -> SqlResult {
        let mut params = vec![Value::String(self.owner_id.to_string())];
        let owner = ownership_clause(self.schema, self.def, ALIAS, "$1::UUID");
        let id_ph = push_param(&mut params, Value::String(id.to_string()), SqlType::Uuid);
        let delete = format!(
            "DELETE FROM {table} {a} WHERE {a}.\"id\" = {id} AND {owner} RETURNING {a}.*",
            table = self.schema.qualify(self.def.table),
            a = ALIAS,
            id = id_ph,
            owner = owner,
        );
        SqlResult { query: wrap_written(&delete), params }
    }

    pub async fn find_by_id<'c, E>(&self, executor: E, id: Uuid) -> Result<Value, DatabaseError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        fetch_optional(executor, &self.find_by_id_sql(id))
            .await?
            .ok_or_else(|| self.not_found())
    }

    pub async fn list<'c, E>(&self, executor: E) -> Result<Vec<Value>, DatabaseError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let sql_result = self.list_sql()?;
        let rows = bind_all(sqlx::query(&sql_result.query), &sql_result.params)
            .fetch_all(executor)
            .await?;
        rows.into_iter()
            .map(|row| row.try_get::<Value, _>("row").map_err(DatabaseError::from))
            .collect()
    }

    pub async fn insert<'c, E>(&self, executor: E, data: &Map<String, Value>) -> Result<Value, DatabaseError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let sql_result = self.insert_sql(data, false)?;
        fetch_optional(executor, &sql_result).await?.ok_or_else(|| match self.def.owner {
            Owner::Via { parent, .. } => DatabaseError::NotFound(format!("{} not found", parent)),
            Owner::Direct => DatabaseError::NotFound(format!("{} insert returned no row", self.def.table)),
        })
    }

    /// Insert unless a unique constraint already holds an equivalent row.
    pub async fn insert_if_absent<'c, E>(
        &self,
        executor: E,
        data: &Map<String, Value>,
    ) -> Result<Option<Value>, DatabaseError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        let sql_result = self.insert_sql(data, true)?;
        fetch_optional(executor, &sql_result).await
    }

    /// Update only the supplied fields. An empty update returns the current row.
    pub async fn update<'c, E>(&self, executor: E, id: Uuid, data: &Map<String, Value>) -> Result<Value, DatabaseError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        if data.is_empty() {
            return self.find_by_id(executor, id).await;
        }
        let sql_result = self.update_sql(id, data)?;
        fetch_optional(executor, &sql_result)
            .await?
            .ok_or_else(|| self.not_found())
    }

    /// Delete by id; returns the removed row.
    pub async fn delete<'c, E>(&self, executor: E, id: Uuid) -> Result<Value, DatabaseError>
    where
        E: Executor<'c, Database = Postgres>,
    {
        fetch_optional(executor, &self.delete_sql(id))
            .await?
            .ok_or_else(|| self.not_found())
    }

    fn check_writable(&self, data: &Map<String, Value>) -> Result<(), DatabaseError> {
        match data.keys().find(|key| !self.def.is_writable(key)) {
            Some(column) => Err(DatabaseError::UnknownColumn {
                table: self.def.table.to_string(),
                column: column.clone(),
            }),
            None => Ok(()),
        }
    }

    fn not_found(&self) -> DatabaseError {
        DatabaseError::NotFound(format!("{} record not found", self.def.table))
    }
}

/// Ownership predicate for rows of `def` aliased as `alias`.
fn ownership_clause(schema: &TenantSchema, def: &TableDef, alias: &str, owner_ph: &str) -> String {
    match def.owner {
        Owner::Direct => format!("{}.\"user_id\" = {}", alias, owner_ph),
        Owner::Via { column, parent } => {
            parent_chain(schema, &format!("{}.\"{}\"", alias, column), parent, owner_ph)
        }
    }
}

/// `EXISTS` check that the `parent` row referenced by `link` belongs to the
/// owner, following inherited ownership up to a table with `user_id`.
fn parent_chain(schema: &TenantSchema, link: &str, parent: LogicalTable, owner_ph: &str) -> String {
    let mut depth = 1;
    let mut last = format!("o{}", depth);
    let mut from = format!("{} {}", schema.qualify(parent), last);
    let mut current = parent;

    while let Owner::Via { column, parent: next } = table_def(current).owner {
        depth += 1;
        let alias = format!("o{}", depth);
        from.push_str(&format!(
            " JOIN {} {} ON {}.\"id\" = {}.\"{}\"",
            schema.qualify(next),
            alias,
            alias,
            last,
            column
        ));
        last = alias;
        current = next;
    }

    format!(
        "EXISTS (SELECT 1 FROM {} WHERE o1.\"id\" = {} AND {}.\"user_id\" = {})",
        from, link, last, owner_ph
    )
}

fn wrap_written(statement: &str) -> String {
    format!(
        "WITH written AS ({}) SELECT row_to_json(written) AS row FROM written",
        statement
    )
}

async fn fetch_optional<'c, E>(executor: E, sql_result: &SqlResult) -> Result<Option<Value>, DatabaseError>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = bind_all(sqlx::query(&sql_result.query), &sql_result.params)
        .fetch_optional(executor)
        .await?;
    match row {
        Some(row) => Ok(Some(row.try_get::<Value, _>("row")?)),
        None => Ok(None),
    }
}

fn bind_all<'q>(
    mut q: sqlx::query::Query<'q, Postgres, PgArguments>,
    params: &'q [Value],
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    for p in params {
        q = bind_param_query(q, p);
    }
    q
}

/// Bind a JSON value; every placeholder carries its own cast, so the Rust
/// type only has to be castable to the column type.
fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.to_string()),
    }
}

impl From<FilterError> for DatabaseError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::InvalidColumn(qualified) => {
                let (table, column) = qualified.split_once('.').unwrap_or(("", qualified.as_str()));
                DatabaseError::UnknownColumn { table: table.to_string(), column: column.to_string() }
            }
            other => DatabaseError::InvalidValue(other.to_string()),
        }
    }
}
