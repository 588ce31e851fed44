use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
            has_previous: page > 1,
            has_next: page < total_pages,
        }
    }
}

/// Uniform envelope for every API response, success or failure.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: Vec::new(),
            meta,
        }
    }

    pub fn failure(message: impl Into<String>, errors: Vec<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors,
            meta: None,
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// Success without a payload, used by deletes and acknowledgements.
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            errors: Vec::new(),
            meta: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Meta;

    #[test]
    fn meta_computes_page_flags() {
        let meta = Meta::new(2, 10, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_previous);
        assert!(meta.has_next);

        let last = Meta::new(3, 10, 25);
        assert!(!last.has_next);

        let empty = Meta::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_previous);
        assert!(!empty.has_next);
    }
}
