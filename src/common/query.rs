//! Pagination, free-text search and ordering shared by the list endpoints.

use super::models::Paginated;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait, Select,
};
use serde::Deserialize;
use utoipa::IntoParams;

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 500;

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<u64>,
    /// Items per page, defaults to 10
    pub page_size: Option<u64>,
}

impl PageParams {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

/// Runs `select` one page at a time and converts each row.
pub async fn fetch_page<E, T>(
    db: &DatabaseConnection,
    select: Select<E>,
    params: &PageParams,
) -> Result<Paginated<T>, DbErr>
where
    E: EntityTrait,
    E::Model: Sync + 'static,
    T: From<E::Model>,
{
    let page = params.page();
    let page_size = params.page_size();

    let paginator = select.paginate(db, page_size);
    let total = paginator.num_items().await?;
    let items = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(T::from)
        .collect();

    Ok(Paginated::new(items, total, page, page_size))
}

/// Case-insensitive substring match of `term` against any of `columns`.
pub fn search_condition<C>(term: &str, columns: &[C]) -> Condition
where
    C: ColumnTrait + 'static,
{
    let pattern = format!("%{}%", term.trim().to_lowercase());
    columns.iter().fold(Condition::any(), |condition, column| {
        condition.add(Expr::expr(Func::lower(Expr::col(*column))).like(pattern.clone()))
    })
}

/// Resolves `name` / `-name` style ordering against the allowed columns.
/// Unknown fields are ignored.
pub fn parse_ordering<C: Copy>(ordering: Option<&str>, allowed: &[(&str, C)]) -> Option<(C, Order)> {
    let raw = ordering?.trim();
    let (field, direction) = match raw.strip_prefix('-') {
        Some(field) => (field, Order::Desc),
        None => (raw, Order::Asc),
    };

    allowed
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, column)| (*column, direction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, 1, DEFAULT_PAGE_SIZE)]
    #[case(Some(0), Some(0), 1, 1)]
    #[case(Some(3), Some(25), 3, 25)]
    #[case(Some(2), Some(10_000), 2, MAX_PAGE_SIZE)]
    fn test_page_params_bounds(
        #[case] page: Option<u64>,
        #[case] page_size: Option<u64>,
        #[case] expected_page: u64,
        #[case] expected_size: u64,
    ) {
        let params = PageParams { page, page_size };
        assert_eq!(params.page(), expected_page);
        assert_eq!(params.page_size(), expected_size);
    }

    #[rstest]
    #[case(Some("name"), Some(("name", Order::Asc)))]
    #[case(Some("-created_at"), Some(("created_at", Order::Desc)))]
    #[case(Some("secope_number"), None)]
    #[case(None, None)]
    fn test_parse_ordering(#[case] raw: Option<&str>, #[case] expected: Option<(&str, Order)>) {
        let allowed = [("name", "name"), ("created_at", "created_at")];
        assert_eq!(parse_ordering(raw, &allowed), expected);
    }
}
