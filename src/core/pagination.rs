//! Pagination - parsing delle query `where__campo__operatore` / `order__campo`
//!
//! Ogni risorsa dichiara i campi su cui si può filtrare/ordinare (whitelist),
//! con il nome esposto in query string (camelCase) e la colonna SQL reale.
//! Il parsing produce filtri tipizzati che i repository traducono con `QueryBuilder`.
//!
//! Due modalità:
//! - `page` presente -> paginazione per pagina (`LIMIT take OFFSET take*(page-1)`), risposta `{data, total}`
//! - altrimenti -> paginazione a cursore, risposta `{data, cursor: {after}, count, next}`

use crate::core::AppError;
use crate::dtos::{CursorDTO, Paginated};
use crate::entities::{Chat, Comment, Message, Post, User};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

pub const DEFAULT_TAKE: u32 = 20;
pub const MAX_TAKE: u32 = 100;

const CURSOR_MORE_THAN: &str = "where__id__more_than";
const CURSOR_LESS_THAN: &str = "where__id__less_than";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Int,
    Text,
    DateTime,
}

/// Campo paginabile: nome in query string -> colonna SQL
#[derive(Debug, Clone, Copy)]
pub struct PaginatedField {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

impl PaginatedField {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { name, column, kind }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Int(i64),
    Text(String),
    DateTime(DateTime<Utc>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOperator {
    Equal(FilterValue),
    Not(FilterValue),
    LessThan(FilterValue),
    LessThanOrEqual(FilterValue),
    MoreThan(FilterValue),
    MoreThanOrEqual(FilterValue),
    /// pattern passato così com'è (`%` a carico del client)
    Like(String),
    /// case-insensitive, il valore viene racchiuso in `%...%`
    ILike(String),
    Between(FilterValue, FilterValue),
    In(Vec<FilterValue>),
    /// `true` -> IS NULL, `false` -> IS NOT NULL
    IsNull(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub operator: FilterOperator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "ASC" => Some(SortDirection::Asc),
            "DESC" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// Entità con chiave primaria intera, usata per il cursore
pub trait Identifiable {
    fn id(&self) -> i32;
}

macro_rules! identifiable {
    ($($entity:ty),*) => {
        $(impl Identifiable for $entity {
            fn id(&self) -> i32 {
                self.id
            }
        })*
    };
}

identifiable!(Post, Comment, Chat, Message, User);

#[derive(Debug, Clone)]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub take: u32,
    pub filters: Vec<Filter>,
    pub order: Vec<Ordering>,
    created_at_direction: SortDirection,
    /// coppie originali, riusate per costruire l'URL `next`
    raw: Vec<(String, String)>,
}

impl PaginationQuery {
    /// Interpreta le coppie chiave/valore della query string rispetto ai campi ammessi.
    /// Qualsiasi chiave sconosciuta o malformata produce un 400.
    pub fn parse(raw: Vec<(String, String)>, fields: &[PaginatedField]) -> Result<Self, AppError> {
        let mut page = None;
        let mut take = DEFAULT_TAKE;
        let mut filters = Vec::new();
        let mut order = Vec::new();
        let mut created_at_direction = SortDirection::Asc;

        for (key, value) in &raw {
            if key == "page" {
                let parsed = value.parse::<u32>().ok().filter(|p| *p >= 1).ok_or_else(|| {
                    AppError::bad_request("page must be a positive integer")
                        .with_details(format!("page={}", value))
                })?;
                page = Some(parsed);
            } else if key == "take" {
                take = value
                    .parse::<u32>()
                    .ok()
                    .filter(|t| (1..=MAX_TAKE).contains(t))
                    .ok_or_else(|| {
                        AppError::bad_request("take must be an integer between 1 and 100")
                            .with_details(format!("take={}", value))
                    })?;
            } else if key.starts_with("where__") {
                filters.push(parse_where_filter(key, value, fields)?);
            } else if key.starts_with("order__") {
                let ordering = parse_order(key, value, fields)?;
                if ordering.column == "created_at" {
                    created_at_direction = ordering.direction;
                }
                order.push(ordering);
            } else {
                warn!("Unknown pagination key: {}", key);
                return Err(AppError::bad_request("Unknown query parameter")
                    .with_details(format!("key: {}", key)));
            }
        }

        if order.is_empty() {
            order.push(Ordering {
                column: "created_at",
                direction: SortDirection::Asc,
            });
        }
        // tie-break sull'id: l'ordine deve essere totale perché il cursore funzioni
        if !order.iter().any(|o| o.column == "id") {
            order.push(Ordering {
                column: "id",
                direction: created_at_direction,
            });
        }

        debug!(
            filters = filters.len(),
            orderings = order.len(),
            take,
            ?page,
            "Pagination query parsed"
        );

        Ok(Self {
            page,
            take,
            filters,
            order,
            created_at_direction,
            raw,
        })
    }

    pub fn is_page_based(&self) -> bool {
        self.page.is_some()
    }

    /// OFFSET da applicare in modalità pagina
    pub fn offset(&self) -> Option<u64> {
        self.page.map(|p| self.take as u64 * (p as u64 - 1))
    }

    /// Id dell'ultimo elemento se la pagina è piena, altrimenti non c'è una pagina successiva
    pub fn cursor_after<T: Identifiable>(&self, rows: &[T]) -> Option<i32> {
        if !rows.is_empty() && rows.len() == self.take as usize {
            rows.last().map(|r| r.id())
        } else {
            None
        }
    }

    /// Costruisce `{base_url}/{path}?...` riportando tutti i parametri ricevuti
    /// tranne i cursori, più il nuovo cursore nella direzione di `order__createdAt`.
    pub fn next_url(&self, base_url: &str, path: &str, after: i32) -> String {
        let mut params: Vec<(String, String)> = self
            .raw
            .iter()
            .filter(|(k, _)| k != CURSOR_MORE_THAN && k != CURSOR_LESS_THAN)
            .cloned()
            .collect();

        if !params.iter().any(|(k, _)| k == "take") {
            params.push(("take".to_string(), self.take.to_string()));
        }
        if !params.iter().any(|(k, _)| k == "order__createdAt") {
            params.push((
                "order__createdAt".to_string(),
                self.created_at_direction.as_sql().to_string(),
            ));
        }

        let cursor_key = match self.created_at_direction {
            SortDirection::Asc => CURSOR_MORE_THAN,
            SortDirection::Desc => CURSOR_LESS_THAN,
        };
        params.push((cursor_key.to_string(), after.to_string()));

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        format!(
            "{}/{}?{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/'),
            query
        )
    }

    /// Assembla la risposta paginata. `after` va calcolato sulle entità prima della conversione in DTO.
    pub fn into_response<D>(
        &self,
        data: Vec<D>,
        after: Option<i32>,
        total: Option<i64>,
        base_url: &str,
        path: &str,
    ) -> Paginated<D> {
        if self.is_page_based() {
            Paginated::Page {
                data,
                total: total.unwrap_or_default(),
            }
        } else {
            Paginated::Cursor {
                count: data.len(),
                data,
                next: after.map(|id| self.next_url(base_url, path, id)),
                cursor: CursorDTO { after },
            }
        }
    }
}

fn find_field<'a>(
    name: &str,
    fields: &'a [PaginatedField],
    key: &str,
) -> Result<&'a PaginatedField, AppError> {
    fields.iter().find(|f| f.name == name).ok_or_else(|| {
        warn!("Field {} is not allowed for this resource", name);
        AppError::bad_request("Field not allowed").with_details(format!("key: {}", key))
    })
}

fn parse_value(raw: &str, kind: FieldKind, key: &str) -> Result<FilterValue, AppError> {
    let invalid = || AppError::bad_request("Invalid filter value").with_details(format!("{}={}", key, raw));
    match kind {
        FieldKind::Int => raw.trim().parse::<i64>().map(FilterValue::Int).map_err(|_| invalid()),
        FieldKind::Text => Ok(FilterValue::Text(raw.to_string())),
        FieldKind::DateTime => DateTime::parse_from_rfc3339(raw.trim())
            .map(|d| FilterValue::DateTime(d.with_timezone(&Utc)))
            .map_err(|_| invalid()),
    }
}

fn parse_list(raw: &str, kind: FieldKind, key: &str) -> Result<Vec<FilterValue>, AppError> {
    raw.split(',')
        .filter(|s| !s.is_empty())
        .map(|s| parse_value(s, kind, key))
        .collect()
}

fn parse_where_filter(
    key: &str,
    value: &str,
    fields: &[PaginatedField],
) -> Result<Filter, AppError> {
    let split: Vec<&str> = key.split("__").collect();
    match split.as_slice() {
        // where__id=3 -> uguaglianza
        [_, name] => {
            let field = find_field(name, fields, key)?;
            Ok(Filter {
                column: field.column,
                operator: FilterOperator::Equal(parse_value(value, field.kind, key)?),
            })
        }
        // where__id__more_than=3
        [_, name, operator] => {
            let field = find_field(name, fields, key)?;
            let operator = match *operator {
                "equal" => FilterOperator::Equal(parse_value(value, field.kind, key)?),
                "not" => FilterOperator::Not(parse_value(value, field.kind, key)?),
                "less_than" => FilterOperator::LessThan(parse_value(value, field.kind, key)?),
                "less_than_or_equal" => {
                    FilterOperator::LessThanOrEqual(parse_value(value, field.kind, key)?)
                }
                "more_than" => FilterOperator::MoreThan(parse_value(value, field.kind, key)?),
                "more_than_or_equal" => {
                    FilterOperator::MoreThanOrEqual(parse_value(value, field.kind, key)?)
                }
                "like" => FilterOperator::Like(value.to_string()),
                "i_like" => FilterOperator::ILike(format!("%{}%", value)),
                "between" => {
                    let mut bounds = parse_list(value, field.kind, key)?;
                    if bounds.len() != 2 {
                        return Err(AppError::bad_request("between requires exactly two values")
                            .with_details(format!("{}={}", key, value)));
                    }
                    let upper = bounds.remove(1);
                    let lower = bounds.remove(0);
                    FilterOperator::Between(lower, upper)
                }
                "in" => {
                    let values = parse_list(value, field.kind, key)?;
                    if values.is_empty() {
                        return Err(AppError::bad_request("in requires at least one value")
                            .with_details(format!("{}={}", key, value)));
                    }
                    FilterOperator::In(values)
                }
                "is_null" => FilterOperator::IsNull(value != "false"),
                _ => {
                    return Err(AppError::bad_request("Unknown filter operator")
                        .with_details(format!("key: {}", key)));
                }
            };
            Ok(Filter {
                column: field.column,
                operator,
            })
        }
        _ => Err(AppError::bad_request(
            "where filter must split into 2 or 3 parts on '__'",
        )
        .with_details(format!("key: {}", key))),
    }
}

fn parse_order(key: &str, value: &str, fields: &[PaginatedField]) -> Result<Ordering, AppError> {
    let split: Vec<&str> = key.split("__").collect();
    let [_, name] = split.as_slice() else {
        return Err(AppError::bad_request("order must split into 2 parts on '__'")
            .with_details(format!("key: {}", key)));
    };
    let field = find_field(name, fields, key)?;
    let direction = SortDirection::parse(value).ok_or_else(|| {
        AppError::bad_request("order must be ASC or DESC").with_details(format!("{}={}", key, value))
    })?;
    Ok(Ordering {
        column: field.column,
        direction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[PaginatedField] = &[
        PaginatedField::new("id", "id", FieldKind::Int),
        PaginatedField::new("title", "title", FieldKind::Text),
        PaginatedField::new("likeCount", "like_count", FieldKind::Int),
        PaginatedField::new("createdAt", "created_at", FieldKind::DateTime),
    ];

    struct Row(i32);

    impl Identifiable for Row {
        fn id(&self) -> i32 {
            self.0
        }
    }

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn parse(raw: &[(&str, &str)]) -> Result<PaginationQuery, AppError> {
        PaginationQuery::parse(pairs(raw), FIELDS)
    }

    #[test]
    fn defaults_to_cursor_mode_ordered_by_created_at() {
        let q = parse(&[]).unwrap();
        assert!(!q.is_page_based());
        assert_eq!(q.take, DEFAULT_TAKE);
        assert_eq!(
            q.order,
            vec![
                Ordering { column: "created_at", direction: SortDirection::Asc },
                Ordering { column: "id", direction: SortDirection::Asc },
            ]
        );
    }

    #[test]
    fn parses_two_part_key_as_equality() {
        let q = parse(&[("where__id", "3")]).unwrap();
        assert_eq!(
            q.filters,
            vec![Filter { column: "id", operator: FilterOperator::Equal(FilterValue::Int(3)) }]
        );
    }

    #[test]
    fn parses_three_part_key_with_operator() {
        let q = parse(&[("where__likeCount__more_than", "10"), ("where__title__i_like", "rust")]).unwrap();
        assert_eq!(q.filters[0].column, "like_count");
        assert_eq!(q.filters[0].operator, FilterOperator::MoreThan(FilterValue::Int(10)));
        assert_eq!(q.filters[1].operator, FilterOperator::ILike("%rust%".to_string()));
    }

    #[test]
    fn parses_between_and_in() {
        let q = parse(&[("where__id__between", "1,5"), ("where__id__in", "2,4,6")]).unwrap();
        assert_eq!(
            q.filters[0].operator,
            FilterOperator::Between(FilterValue::Int(1), FilterValue::Int(5))
        );
        assert_eq!(
            q.filters[1].operator,
            FilterOperator::In(vec![FilterValue::Int(2), FilterValue::Int(4), FilterValue::Int(6)])
        );
        assert!(parse(&[("where__id__between", "1")]).is_err());
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(parse(&[("where__id__more_than__x", "1")]).is_err());
        assert!(parse(&[("where__password", "x")]).is_err());
        assert!(parse(&[("where__id__around", "1")]).is_err());
        assert!(parse(&[("where__id__more_than", "abc")]).is_err());
        assert!(parse(&[("order__createdAt", "UP")]).is_err());
        assert!(parse(&[("order__createdAt__x", "ASC")]).is_err());
        assert!(parse(&[("foo", "bar")]).is_err());
        assert!(parse(&[("take", "0")]).is_err());
        assert!(parse(&[("page", "0")]).is_err());
    }

    #[test]
    fn rejected_key_status_is_400() {
        let err = parse(&[("where__secret", "1")]).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn page_mode_computes_offset() {
        let q = parse(&[("page", "3"), ("take", "10")]).unwrap();
        assert!(q.is_page_based());
        assert_eq!(q.offset(), Some(20));
    }

    #[test]
    fn cursor_only_when_page_is_full() {
        let q = parse(&[("take", "2")]).unwrap();
        assert_eq!(q.cursor_after(&[Row(1), Row(2)]), Some(2));
        assert_eq!(q.cursor_after(&[Row(1)]), None);
        assert_eq!(q.cursor_after::<Row>(&[]), None);
    }

    #[test]
    fn next_url_ascending_uses_more_than() {
        let q = parse(&[("take", "5"), ("where__id__more_than", "10")]).unwrap();
        assert_eq!(
            q.next_url("http://localhost:3000", "posts", 15),
            "http://localhost:3000/posts?take=5&order__createdAt=ASC&where__id__more_than=15"
        );
    }

    #[test]
    fn next_url_descending_uses_less_than() {
        let q = parse(&[("order__createdAt", "DESC"), ("where__id__less_than", "30")]).unwrap();
        assert_eq!(
            q.next_url("http://localhost:3000/", "/posts/1/comments", 10),
            "http://localhost:3000/posts/1/comments?order__createdAt=DESC&take=20&where__id__less_than=10"
        );
        assert_eq!(
            q.order.last(),
            Some(&Ordering { column: "id", direction: SortDirection::Desc })
        );
    }

    #[test]
    fn next_url_encodes_values() {
        let q = parse(&[("where__title__i_like", "a b&c")]).unwrap();
        let url = q.next_url("http://h", "posts", 1);
        assert!(url.contains("where__title__i_like=a%20b%26c"));
    }

    #[test]
    fn into_response_shapes() {
        let cursor = parse(&[("take", "1")]).unwrap();
        let json = serde_json::to_value(cursor.into_response(vec![7], Some(7), None, "http://h", "posts")).unwrap();
        assert_eq!(json["cursor"]["after"], 7);
        assert_eq!(json["count"], 1);
        assert!(json["next"].as_str().unwrap().ends_with("where__id__more_than=7"));

        let page = parse(&[("page", "1")]).unwrap();
        let json = serde_json::to_value(page.into_response(vec![1, 2], None, Some(42), "http://h", "posts")).unwrap();
        assert_eq!(json["total"], 42);
        assert!(json.get("cursor").is_none());
    }
}
