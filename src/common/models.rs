use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Education level shared by questionnaire templates and collections.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
pub enum EducationLevel {
    #[sea_orm(string_value = "pre-scolaire")]
    #[serde(rename = "pre-scolaire")]
    PreScolaire,
    #[sea_orm(string_value = "primaire")]
    #[serde(rename = "primaire")]
    Primaire,
    #[sea_orm(string_value = "secondaire")]
    #[serde(rename = "secondaire")]
    Secondaire,
}

#[derive(ToSchema, Deserialize, Serialize)]
pub struct HealthCheck {
    pub status: String,
}

/// One page of a list endpoint.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, page_size: u64) -> Self {
        Self {
            items,
            total,
            page,
            page_size,
            pages: total.div_ceil(page_size.max(1)),
        }
    }

    /// Same page metadata around converted items.
    pub fn with_items<U>(self, items: Vec<U>) -> Paginated<U> {
        Paginated {
            items,
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_education_level_wire_names() {
        assert_eq!(
            serde_json::to_string(&EducationLevel::PreScolaire).unwrap(),
            r#""pre-scolaire""#
        );
        let level: EducationLevel = serde_json::from_str(r#""secondaire""#).unwrap();
        assert_eq!(level, EducationLevel::Secondaire);
        assert!(serde_json::from_str::<EducationLevel>(r#""universitaire""#).is_err());
    }

    #[test]
    fn test_paginated_page_count() {
        let page = Paginated::new(vec![1, 2, 3], 21, 1, 10);
        assert_eq!(page.pages, 3);
        let empty: Paginated<i32> = Paginated::new(vec![], 0, 1, 10);
        assert_eq!(empty.pages, 0);
    }
}
