pub mod protected;
pub mod public;

use serde::Deserialize;

use crate::config;

/// Common pagination query params, accepted on every listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Normalize requested page/limit against the configured bounds.
pub(crate) fn page_limit(query: &PageQuery) -> (i64, i64) {
    let api = &config::config().api;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(api.default_page_limit)
        .clamp(1, api.max_page_limit);
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_limit_clamps_to_bounds() {
        let (page, limit) = page_limit(&PageQuery {
            page: Some(0),
            limit: Some(0),
        });
        assert_eq!(page, 1);
        assert_eq!(limit, 1);

        let (_, limit) = page_limit(&PageQuery {
            page: None,
            limit: Some(10_000_000),
        });
        assert_eq!(limit, crate::config::config().api.max_page_limit);

        let (page, limit) = page_limit(&PageQuery::default());
        assert_eq!(page, 1);
        assert_eq!(limit, crate::config::config().api.default_page_limit);
    }
}
