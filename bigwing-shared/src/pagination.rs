use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_PAGE_SIZE: u32 = 7;
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request. Both fields are at least 1 and `page_size` is at most
/// [`MAX_PAGE_SIZE`], so the offset always fits in an `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Option<Self> {
        if page == 0 || page_size == 0 || page_size > MAX_PAGE_SIZE {
            return None;
        }
        (page as i64 - 1).checked_mul(page_size as i64)?;
        Some(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.page_size as i64
    }

    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: Option<i64>,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        let size = request.page_size as i64;
        let total = total.max(0);
        Self {
            page: request.page,
            page_size: request.page_size,
            total: Some(total),
            total_pages: ((total + size - 1) / size) as u32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, request: PageRequest, total: i64) -> Self {
        Self {
            data,
            pagination: Pagination::new(request, total),
        }
    }

    /// Slices an already loaded, already ordered set. Used where rows are not paged by SQL.
    pub fn from_all(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as i64;
        let data = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.limit() as usize)
            .collect();
        Self::new(data, request, total)
    }

    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<PaginatedResponse<U>, E> {
        let data = self.data.into_iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(PaginatedResponse {
            data,
            pagination: self.pagination,
        })
    }
}
