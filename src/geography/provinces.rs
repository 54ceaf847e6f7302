use crate::common::forms::{blank_as_none, blank_string_as_none};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "provinces")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: Option<String>,
    #[sea_orm(unique)]
    pub code: Option<String>,
    pub principal_town: Option<String>,
    pub surface: Option<String>,
    pub population: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::divisions::Entity")]
    Divisions,
    #[sea_orm(has_many = "super::cities::Entity")]
    Cities,
    #[sea_orm(has_many = "super::territories::Entity")]
    Territories,
    #[sea_orm(has_many = "crate::schools::models::Entity")]
    Schools,
}

impl Related<super::divisions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Divisions.def()
    }
}

impl Related<super::cities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cities.def()
    }
}

impl Related<super::territories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Territories.def()
    }
}

impl Related<crate::schools::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schools.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct Province {
    pub id: i32,
    pub name: Option<String>,
    pub code: Option<String>,
    pub principal_town: Option<String>,
    pub surface: Option<String>,
    pub population: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<Model> for Province {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            principal_town: model.principal_town,
            surface: model.surface,
            population: model.population,
            latitude: model.latitude,
            longitude: model.longitude,
        }
    }
}

/// Body for creating or replacing a province. Coordinates may be sent as
/// strings; blank values are stored as null.
#[derive(ToSchema, Deserialize, Clone, Debug, Default)]
pub struct ProvinceCreate {
    #[serde(default, deserialize_with = "blank_string_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "blank_string_as_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub principal_town: Option<String>,
    #[serde(default)]
    pub surface: Option<String>,
    #[serde(default)]
    pub population: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<f64>)]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<f64>)]
    pub longitude: Option<f64>,
}

impl ProvinceCreate {
    pub fn apply(self, mut active: ActiveModel) -> ActiveModel {
        active.name = sea_orm::Set(self.name);
        active.code = sea_orm::Set(self.code);
        active.principal_town = sea_orm::Set(self.principal_town);
        active.surface = sea_orm::Set(self.surface);
        active.population = sea_orm::Set(self.population);
        active.latitude = sea_orm::Set(self.latitude);
        active.longitude = sea_orm::Set(self.longitude);
        active
    }
}
