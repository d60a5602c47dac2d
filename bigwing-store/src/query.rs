//! Generic select/insert/update/delete over any table, driven by
//! [`SelectQuery`](bigwing_core::query::SelectQuery). Rows come back as JSON objects.
//! Driver errors are returned as they are.

use bigwing_core::query::{Filter, FilterOp, FilterValue, Ident, SearchColumn, SelectQuery};
use bigwing_core::{CoreError, CoreResult};
use bigwing_shared::{PageRequest, PaginatedResponse};
use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, QueryBuilder};

/// Column values for an insert or update. Never empty. Columns render in name order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Vec<Ident>,
    values: Map<String, Value>,
}

impl Record {
    pub fn from_json(values: Map<String, Value>) -> CoreResult<Self> {
        if values.is_empty() {
            return Err(CoreError::ValidationError("record has no columns".to_string()));
        }
        let mut columns = values.keys().map(|k| Ident::parse(k)).collect::<CoreResult<Vec<_>>>()?;
        columns.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(Self { columns, values })
    }
}

#[derive(Clone)]
pub struct QueryComposer {
    pool: PgPool,
}

impl QueryComposer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn select(&self, table: &Ident, query: &SelectQuery) -> Result<Vec<Value>, sqlx::Error> {
        build_select(table, query)
            .build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await
    }

    /// Runs the count query, then the select restricted to `page`. Any window already
    /// on `query` is replaced.
    pub async fn select_page(
        &self,
        table: &Ident,
        query: SelectQuery,
        page: PageRequest,
    ) -> Result<PaginatedResponse<Value>, sqlx::Error> {
        let query = query.page(page);
        let total: i64 = build_count(table, &query)
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let rows = self.select(table, &query).await?;
        Ok(PaginatedResponse::new(rows, page, total))
    }

    pub async fn insert(&self, table: &Ident, record: &Record) -> Result<Vec<Value>, sqlx::Error> {
        build_insert(table, record)
            .build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await
    }

    /// Updates the rows matching every filter. No filters matches no rows.
    pub async fn update(
        &self,
        table: &Ident,
        changes: &Record,
        filters: &[Filter],
    ) -> Result<Vec<Value>, sqlx::Error> {
        build_update(table, changes, filters)
            .build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await
    }

    /// Deletes the rows matching every filter. No filters matches no rows.
    pub async fn delete(&self, table: &Ident, filters: &[Filter]) -> Result<u64, sqlx::Error> {
        let result = build_delete(table, filters).build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

fn projection(query: &SelectQuery) -> String {
    if query.columns.is_empty() {
        return "to_jsonb(t.*)".to_string();
    }
    let pairs: Vec<String> = query
        .columns
        .iter()
        .map(|c| format!("'{}', t.{}", c.as_str(), c.quoted()))
        .collect();
    format!("jsonb_build_object({})", pairs.join(", "))
}

pub(crate) fn build_select(table: &Ident, query: &SelectQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM {} AS t",
        projection(query),
        table.quoted()
    ));
    push_where(&mut qb, &query.filters, &query.search);

    if let Some(order) = &query.order_by {
        qb.push(format!(
            " ORDER BY t.{} {}",
            order.column.quoted(),
            if order.ascending { "ASC" } else { "DESC" }
        ));
    }

    if let Some(window) = &query.window {
        let (offset, limit) = window.offset_limit();
        qb.push(" LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);
    }
    qb
}

pub(crate) fn build_count(table: &Ident, query: &SelectQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} AS t", table.quoted()));
    push_where(&mut qb, &query.filters, &query.search);
    qb
}

fn column_list(record: &Record) -> String {
    record.columns.iter().map(Ident::quoted).collect::<Vec<_>>().join(", ")
}

// jsonb_populate_record casts every JSON value to the column's own type, so a single
// jsonb parameter covers all columns. Columns not named keep their defaults.
pub(crate) fn build_insert(table: &Ident, record: &Record) -> QueryBuilder<'static, Postgres> {
    let columns = column_list(record);
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {table} AS t ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, ",
        table = table.quoted(),
        columns = columns,
    ));
    qb.push_bind(Value::Object(record.values.clone()));
    qb.push(") RETURNING to_jsonb(t.*)");
    qb
}

pub(crate) fn build_update(
    table: &Ident,
    changes: &Record,
    filters: &[Filter],
) -> QueryBuilder<'static, Postgres> {
    let columns = column_list(changes);
    let mut qb = QueryBuilder::new(format!(
        "UPDATE {table} AS t SET ({columns}) = (SELECT {columns} FROM jsonb_populate_record(NULL::{table}, ",
        table = table.quoted(),
        columns = columns,
    ));
    qb.push_bind(Value::Object(changes.values.clone()));
    qb.push("))");
    push_required_where(&mut qb, filters);
    qb.push(" RETURNING to_jsonb(t.*)");
    qb
}

pub(crate) fn build_delete(table: &Ident, filters: &[Filter]) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("DELETE FROM {} AS t", table.quoted()));
    push_required_where(&mut qb, filters);
    qb
}

fn push_required_where(qb: &mut QueryBuilder<'static, Postgres>, filters: &[Filter]) {
    if filters.is_empty() {
        qb.push(" WHERE FALSE");
    } else {
        push_where(qb, filters, &[]);
    }
}

fn push_where(qb: &mut QueryBuilder<'static, Postgres>, filters: &[Filter], search: &[SearchColumn]) {
    let mut keyword = " WHERE ";

    for filter in filters {
        qb.push(keyword);
        keyword = " AND ";
        push_filter(qb, filter);
    }

    if !search.is_empty() {
        qb.push(keyword);
        qb.push("(");
        for (i, column) in search.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(format!("t.{}::text ILIKE ", column.column.quoted()));
            qb.push_bind(column.pattern());
        }
        qb.push(")");
    }
}

fn push_filter(qb: &mut QueryBuilder<'static, Postgres>, filter: &Filter) {
    let column = format!("t.{}", filter.column.quoted());
    match &filter.op {
        FilterOp::Eq(value) => {
            qb.push(column);
            qb.push(" = ");
            push_value(qb, value);
        }
        FilterOp::In(values) if values.is_empty() => {
            qb.push("FALSE");
        }
        FilterOp::In(values) => {
            qb.push(column);
            qb.push(" IN (");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                push_value(qb, value);
            }
            qb.push(")");
        }
    }
}

fn push_value(qb: &mut QueryBuilder<'static, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(v) => qb.push_bind(v.clone()),
        FilterValue::Uuid(v) => qb.push_bind(*v),
        FilterValue::Bool(v) => qb.push_bind(*v),
        FilterValue::Int(v) => qb.push_bind(*v),
        FilterValue::Float(v) => qb.push_bind(*v),
    };
}
