//! Esecuzione SQL delle query di paginazione
//!
//! I filtri arrivano già validati da `PaginationQuery::parse`, quindi le colonne
//! sono sempre quelle della whitelist della risorsa; i valori passano sempre come bind.

use crate::core::pagination::{Filter, FilterOperator, FilterValue, PaginationQuery};
use sqlx::mysql::MySqlRow;
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};
use tracing::debug;

/// Sorgente da paginare: SELECT e COUNT sulla stessa tabella, con un eventuale vincolo fisso
pub struct PageSource {
    pub select: &'static str,
    pub count: &'static str,
    /// es. `("post_id", 3)` per i commenti di un post
    pub scope: Option<(&'static str, i32)>,
}

#[derive(Debug)]
pub struct PageResult<T> {
    pub rows: Vec<T>,
    /// valorizzato solo in modalità pagina
    pub total: Option<i64>,
}

fn push_value(qb: &mut QueryBuilder<'_, MySql>, value: &FilterValue) {
    match value {
        FilterValue::Int(v) => {
            qb.push_bind(*v);
        }
        FilterValue::Text(v) => {
            qb.push_bind(v.clone());
        }
        FilterValue::DateTime(v) => {
            qb.push_bind(*v);
        }
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, MySql>, filter: &Filter) {
    let column = filter.column;
    match &filter.operator {
        FilterOperator::Equal(v) => {
            qb.push(format!("{} = ", column));
            push_value(qb, v);
        }
        FilterOperator::Not(v) => {
            qb.push(format!("{} <> ", column));
            push_value(qb, v);
        }
        FilterOperator::LessThan(v) => {
            qb.push(format!("{} < ", column));
            push_value(qb, v);
        }
        FilterOperator::LessThanOrEqual(v) => {
            qb.push(format!("{} <= ", column));
            push_value(qb, v);
        }
        FilterOperator::MoreThan(v) => {
            qb.push(format!("{} > ", column));
            push_value(qb, v);
        }
        FilterOperator::MoreThanOrEqual(v) => {
            qb.push(format!("{} >= ", column));
            push_value(qb, v);
        }
        FilterOperator::Like(pattern) => {
            qb.push(format!("{} LIKE ", column));
            qb.push_bind(pattern.clone());
        }
        FilterOperator::ILike(pattern) => {
            qb.push(format!("LOWER({}) LIKE LOWER(", column));
            qb.push_bind(pattern.clone());
            qb.push(")");
        }
        FilterOperator::Between(lower, upper) => {
            qb.push(format!("{} BETWEEN ", column));
            push_value(qb, lower);
            qb.push(" AND ");
            push_value(qb, upper);
        }
        FilterOperator::In(values) => {
            qb.push(format!("{} IN (", column));
            let mut separated = qb.separated(", ");
            for value in values {
                match value {
                    FilterValue::Int(v) => separated.push_bind(*v),
                    FilterValue::Text(v) => separated.push_bind(v.clone()),
                    FilterValue::DateTime(v) => separated.push_bind(*v),
                };
            }
            separated.push_unseparated(")");
        }
        FilterOperator::IsNull(true) => {
            qb.push(format!("{} IS NULL", column));
        }
        FilterOperator::IsNull(false) => {
            qb.push(format!("{} IS NOT NULL", column));
        }
    }
}

/// Aggiunge `WHERE scope AND filtro AND ...` alla query in costruzione
fn push_where(qb: &mut QueryBuilder<'_, MySql>, source: &PageSource, query: &PaginationQuery) {
    let mut first = true;
    let mut next_clause = |qb: &mut QueryBuilder<'_, MySql>| {
        qb.push(if first { " WHERE " } else { " AND " });
        first = false;
    };

    if let Some((column, id)) = source.scope {
        next_clause(qb);
        qb.push(format!("{} = ", column));
        qb.push_bind(id);
    }
    for filter in &query.filters {
        next_clause(qb);
        push_filter(qb, filter);
    }
}

/// Esegue SELECT con filtri, ordinamento e limiti; in modalità pagina anche il COUNT
pub async fn fetch_page<T>(
    pool: &MySqlPool,
    source: &PageSource,
    query: &PaginationQuery,
) -> Result<PageResult<T>, sqlx::Error>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    let mut qb = QueryBuilder::<MySql>::new(source.select);
    push_where(&mut qb, source, query);

    let order = query
        .order
        .iter()
        .map(|o| format!("{} {}", o.column, o.direction.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");
    qb.push(format!(" ORDER BY {}", order));
    qb.push(" LIMIT ");
    qb.push_bind(query.take as i64);
    if let Some(offset) = query.offset() {
        qb.push(" OFFSET ");
        qb.push_bind(offset as i64);
    }

    debug!(sql = qb.sql(), "Paginated select");
    let rows = qb.build_query_as::<T>().fetch_all(pool).await?;

    let total = if query.is_page_based() {
        let mut count_qb = QueryBuilder::<MySql>::new(source.count);
        push_where(&mut count_qb, source, query);
        let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;
        Some(total)
    } else {
        None
    };

    Ok(PageResult { rows, total })
}
