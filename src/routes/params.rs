use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self { page, per_page }
    }

    /// Returns `(page, per_page, offset)` with page >= 1 and per_page clamped.
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    #[default]
    Name,
    Price,
    Date,
    Popularity,
    Sales,
}

// Query structs keep paging fields inline: serde's flatten breaks numeric
// parsing for url-encoded queries.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CountQuery {
    pub count: Option<u64>,
}

impl CountQuery {
    pub fn count_or(&self, default: u64) -> u64 {
        self.count.unwrap_or(default).clamp(1, MAX_PAGE_SIZE as u64)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default().normalize(), (1, 10, 0));
        assert_eq!(Pagination::new(Some(3), Some(20)).normalize(), (3, 20, 40));
        assert_eq!(Pagination::new(Some(0), Some(500)).normalize(), (1, 50, 0));
        assert_eq!(Pagination::new(Some(-4), Some(0)).normalize(), (1, 1, 0));
        assert_eq!(
            Pagination::new(Some(i64::MAX), Some(50)).normalize(),
            (i64::MAX, 50, i64::MAX)
        );
    }

    #[test]
    fn count_query_is_bounded() {
        assert_eq!(CountQuery { count: None }.count_or(4), 4);
        assert_eq!(CountQuery { count: Some(0) }.count_or(4), 1);
        assert_eq!(CountQuery { count: Some(1000) }.count_or(4), 50);
    }
}
