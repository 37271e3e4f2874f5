//! Page requests and sort direction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PAGE: u32 = 0;
pub const DEFAULT_SIZE: u32 = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PagingError {
    #[error("page size must be greater than zero")]
    ZeroSize,

    #[error("invalid sort direction '{0}'; expected asc or desc")]
    InvalidDirection(String),
}

/// Sort direction of a paged query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }

    /// SQL keyword for an `ORDER BY` clause.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = PagingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(Direction::Asc),
            "desc" => Ok(Direction::Desc),
            _ => Err(PagingError::InvalidDirection(value.to_string())),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated window request: zero-based page number, positive size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pageable {
    page: u32,
    size: u32,
    direction: Direction,
}

impl Pageable {
    pub fn new(page: u32, size: u32, direction: Direction) -> Result<Self, PagingError> {
        if size == 0 {
            return Err(PagingError::ZeroSize);
        }
        Ok(Self {
            page,
            size,
            direction,
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Row offset of the first element of this page.
    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    /// Same size and direction, another page number.
    pub fn with_page(&self, page: u32) -> Self {
        Self { page, ..*self }
    }
}

impl Default for Pageable {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            size: DEFAULT_SIZE,
            direction: Direction::Asc,
        }
    }
}

/// Raw `?page=&size=&direction=` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub direction: Option<String>,
}

impl TryFrom<PageParams> for Pageable {
    type Error = PagingError;

    fn try_from(params: PageParams) -> Result<Self, Self::Error> {
        let direction = match params.direction.as_deref() {
            Some(raw) => raw.parse()?,
            None => Direction::Asc,
        };
        Pageable::new(
            params.page.unwrap_or(DEFAULT_PAGE),
            params.size.unwrap_or(DEFAULT_SIZE),
            direction,
        )
    }
}
