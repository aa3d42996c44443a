use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CursorDTO {
    pub after: Option<i32>,
}

/// Risposta di `paginate`: la forma dipende dalla presenza di `page` nella query
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum Paginated<T> {
    Page {
        data: Vec<T>,
        total: i64,
    },
    Cursor {
        data: Vec<T>,
        cursor: CursorDTO,
        count: usize,
        next: Option<String>,
    },
}

impl<T> Paginated<T> {
    pub fn data(&self) -> &[T] {
        match self {
            Paginated::Page { data, .. } | Paginated::Cursor { data, .. } => data,
        }
    }
}
