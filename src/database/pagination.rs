use serde::Serialize;

use crate::constants::{MAX_PAGE, MAX_PAGE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Serialize, Debug)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn from_rows(results: Vec<T>, count: i64, request: PageRequest) -> Self {
        let next = if request.offset().saturating_add(request.limit) < count {
            Some(request.page + 1)
        } else {
            None
        };
        let previous = if request.page > 1 {
            Some(request.page - 1)
        } else {
            None
        };

        Self {
            count,
            next,
            previous,
            results,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
