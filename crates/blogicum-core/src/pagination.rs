//! Fixed-size page arithmetic for post listings.

use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::error::DomainError;

/// Number of posts per listing page.
pub const PAGE_SIZE: u64 = 10;

/// A requested page: a 1-based number or the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(u64),
    Last,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::Number(1)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page '{0}' is not a number")]
    Invalid(String),

    #[error("page {0} is out of range")]
    OutOfRange(u64),
}

impl From<PaginationError> for DomainError {
    fn from(err: PaginationError) -> Self {
        let key = match err {
            PaginationError::Invalid(raw) => raw,
            PaginationError::OutOfRange(number) => number.to_string(),
        };
        DomainError::not_found("page", key)
    }
}

impl FromStr for PageRequest {
    type Err = PaginationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw == "last" {
            return Ok(Self::Last);
        }
        raw.parse::<u64>()
            .map(Self::Number)
            .map_err(|_| PaginationError::Invalid(raw.to_string()))
    }
}

impl PageRequest {
    /// Parse an optional `?page=` query value; absent means the first page.
    pub fn parse(raw: Option<&str>) -> Result<Self, PaginationError> {
        raw.map_or(Ok(Self::default()), |raw| raw.parse())
    }

    /// Resolve to a concrete 1-based page number within `total_items`.
    ///
    /// An empty collection still has one (empty) page.
    pub fn resolve(self, total_items: u64, page_size: u64) -> Result<u64, PaginationError> {
        let pages = page_count(total_items, page_size);
        match self {
            Self::Last => Ok(pages),
            Self::Number(n) if n >= 1 && n <= pages => Ok(n),
            Self::Number(n) => Err(PaginationError::OutOfRange(n)),
        }
    }
}

pub fn page_count(total_items: u64, page_size: u64) -> u64 {
    total_items.div_ceil(page_size).max(1)
}

/// Offset/limit window handed to repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub offset: u64,
    pub limit: u64,
}

impl Slice {
    pub fn for_page(number: u64, page_size: u64) -> Self {
        Self {
            offset: number.saturating_sub(1) * page_size,
            limit: page_size,
        }
    }
}

/// One page of results plus the cursor information a client needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub num_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: u64, page_size: u64, total_items: u64) -> Self {
        Self {
            items,
            number,
            page_size,
            total_items,
            num_pages: page_count(total_items, page_size),
        }
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            page_size: self.page_size,
            total_items: self.total_items,
            num_pages: self.num_pages,
        }
    }
}
