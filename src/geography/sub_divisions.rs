use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sub_divisions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub division_id: i32,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::divisions::Entity",
        from = "Column::DivisionId",
        to = "super::divisions::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Divisions,
}

impl Related<super::divisions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Divisions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct SubDivision {
    pub id: i32,
    pub division_id: i32,
    pub division_name: Option<String>,
    pub code: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Model> for SubDivision {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            division_id: model.division_id,
            division_name: None,
            code: model.code,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(ToSchema, Deserialize, Clone, Debug)]
pub struct SubDivisionCreate {
    pub division_id: i32,
    pub code: String,
    pub name: String,
}
