use crate::common::forms::blank_string_as_none;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "divisions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub province_id: i32,
    #[sea_orm(unique)]
    pub code: Option<String>,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::provinces::Entity",
        from = "Column::ProvinceId",
        to = "super::provinces::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Provinces,
    #[sea_orm(has_many = "super::sub_divisions::Entity")]
    SubDivisions,
}

impl Related<super::provinces::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provinces.def()
    }
}

impl Related<super::sub_divisions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubDivisions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct Division {
    pub id: i32,
    pub province_id: i32,
    pub province_name: Option<String>,
    pub code: Option<String>,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Model> for Division {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            province_id: model.province_id,
            province_name: None,
            code: model.code,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(ToSchema, Deserialize, Clone, Debug)]
pub struct DivisionCreate {
    pub province_id: i32,
    #[serde(default, deserialize_with = "blank_string_as_none")]
    pub code: Option<String>,
    pub name: String,
}
