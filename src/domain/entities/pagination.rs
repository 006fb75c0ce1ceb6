use serde::Serialize;

use crate::{filters::FilterParams, settings::AppConfig};

/// 1-based page request with a clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        PageRequest { page: page.max(1), per_page: per_page.max(1) }
    }

    /// Reads `page` and `per_page` from the query, clamped by configuration.
    pub fn from_params(params: &FilterParams, config: &AppConfig) -> Self {
        let page = params.parsed::<i64>("page").filter(|p| *p > 0).unwrap_or(1);
        let per_page = config.page_size(params.parsed::<i64>("per_page"));
        PageRequest::new(page.min(u32::MAX as i64) as u32, per_page)
    }

    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * (self.per_page as i64)
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub current_page: u32,
    pub per_page: u32,
    pub total: i64,
    pub last_page: u32,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        let per_page = request.per_page as i64;
        let last_page = ((total + per_page - 1) / per_page).max(1) as u32;
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let from = request.offset() + 1;
            (Some(from), Some(from + data.len() as i64 - 1))
        };

        Paginated {
            data,
            current_page: request.page,
            per_page: request.per_page,
            total,
            last_page,
            from,
            to,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page,
            from: self.from,
            to: self.to,
        }
    }
}
