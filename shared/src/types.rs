//! Common types used across the service

use serde::{Deserialize, Serialize};

/// Pagination parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

impl Pagination {
    /// Build from optional query values, clamping to `1..=max_per_page`
    pub fn from_query(page: Option<u32>, per_page: Option<u32>, default_per_page: u32, max_per_page: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(default_per_page).clamp(1, max_per_page.max(1)),
        }
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1) as i64 * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page.max(1) as i64
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
}

impl<T> PaginatedResponse<T> {
    /// Wrap one page that was cut out of `total_items` by the query
    pub fn new(data: Vec<T>, pagination: &Pagination, total_items: u64) -> Self {
        let per_page = pagination.per_page.max(1);
        let total_pages = total_items.div_ceil(per_page as u64) as u32;

        Self {
            data,
            pagination: PaginationMeta {
                page: pagination.page,
                per_page,
                total_items,
                total_pages,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_query_clamps() {
        let p = Pagination::from_query(Some(0), Some(500), 20, 100);
        assert_eq!(p.page, 1);
        assert_eq!(p.per_page, 100);

        let p = Pagination::from_query(None, None, 20, 100);
        assert_eq!(p.per_page, 20);
    }

    #[test]
    fn test_page_meta() {
        let pagination = Pagination { page: 3, per_page: 20 };
        assert_eq!(pagination.offset(), 40);
        assert_eq!(pagination.limit(), 20);

        let page = PaginatedResponse::new(vec![41, 42, 43, 44, 45], &pagination, 45);
        assert_eq!(page.pagination.total_pages, 3);
        assert_eq!(page.pagination.total_items, 45);

        let empty: PaginatedResponse<u32> = PaginatedResponse::new(Vec::new(), &pagination, 0);
        assert_eq!(empty.pagination.total_pages, 0);
    }
}
