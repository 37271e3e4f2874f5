//! Types shared by the relational record stores.

use erudio_http::paging::PagingError;

use crate::error::ServiceError;

/// One page of rows plus the size of the whole result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Slice<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Slice<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Slice<U> {
        Slice {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

/// SQLite reports counts as signed integers.
pub(crate) fn total_from(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

impl From<PagingError> for ServiceError {
    fn from(error: PagingError) -> Self {
        ServiceError::InvalidInput(error.to_string())
    }
}
