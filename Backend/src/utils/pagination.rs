use serde::Deserialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Paramètres bruts ?page=&limit= (parsés avec tolérance comme parseInt)
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    /// Valeur absente, non numérique ou < 1 → valeur par défaut
    pub fn from_query(query: &PageQuery) -> Self {
        let page = parse_positive(query.page.as_deref()).unwrap_or(DEFAULT_PAGE);
        let limit = parse_positive(query.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);

        Self { page, limit }
    }

    /// Index de page pour le Paginator de SeaORM (commence à 0)
    pub fn page_index(&self) -> u64 {
        self.page - 1
    }

    /// Décalage SQL de la page, None s'il dépasse i64::MAX (page forcément vide)
    pub fn offset(&self) -> Option<u64> {
        self.limit
            .checked_mul(self.page_index())
            .filter(|offset| *offset <= i64::MAX as u64)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn query(page: Option<&str>, limit: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[rstest]
    #[case(None, None, 1, 10)]
    #[case(Some("3"), Some("5"), 3, 5)]
    #[case(Some("abc"), Some("0"), 1, 10)]
    #[case(Some("-2"), Some("-1"), 1, 10)]
    #[case(Some("2"), Some("1000"), 2, 100)]
    fn test_from_query(
        #[case] page: Option<&str>,
        #[case] limit: Option<&str>,
        #[case] expected_page: u64,
        #[case] expected_limit: u64,
    ) {
        let pagination = Pagination::from_query(&query(page, limit));
        assert_eq!(pagination.page, expected_page);
        assert_eq!(pagination.limit, expected_limit);
    }

    #[rstest]
    #[case(1, 10, Some(0))]
    #[case(3, 25, Some(50))]
    #[case(u64::MAX, 100, None)]
    #[case(u64::MAX / 2, 4, None)]
    fn test_offset(#[case] page: u64, #[case] limit: u64, #[case] expected: Option<u64>) {
        assert_eq!(Pagination { page, limit }.offset(), expected);
    }

    #[rstest]
    #[case(0, 10, 0)]
    #[case(10, 10, 1)]
    #[case(11, 10, 2)]
    #[case(25, 7, 4)]
    fn test_total_pages(#[case] total: u64, #[case] limit: u64, #[case] expected: u64) {
        let pagination = Pagination { page: 1, limit };
        assert_eq!(pagination.total_pages(total), expected);
    }
}
