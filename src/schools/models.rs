use crate::common::errors::BusinessResult;
use crate::common::forms::{blank_as_none, nullable};
use crate::validation_error;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use sea_orm::{FromQueryResult, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
pub enum ManagementRegime {
    #[sea_orm(string_value = "École Non Conventionnée")]
    #[serde(rename = "École Non Conventionnée")]
    NonConventionnee,
    #[sea_orm(string_value = "Catholique")]
    Catholique,
    #[sea_orm(string_value = "Protestant")]
    Protestant,
    #[sea_orm(string_value = "Kimbaguiste")]
    Kimbaguiste,
    #[sea_orm(string_value = "Islamique")]
    Islamique,
    #[sea_orm(string_value = "Salutiste")]
    Salutiste,
    #[sea_orm(string_value = "Fraternité")]
    #[serde(rename = "Fraternité")]
    Fraternite,
    #[sea_orm(string_value = "Privée")]
    #[serde(rename = "Privée")]
    Privee,
    #[sea_orm(string_value = "Autres")]
    Autres,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "snake_case")]
pub enum MechanizedStatus {
    #[sea_orm(string_value = "mecanise_paye")]
    MecanisePaye,
    #[sea_orm(string_value = "mecanise_non_paye")]
    MecaniseNonPaye,
    #[sea_orm(string_value = "non_mecanise")]
    NonMecanise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "snake_case")]
pub enum OwnershipStatus {
    #[sea_orm(string_value = "proprietaire")]
    Proprietaire,
    #[sea_orm(string_value = "locataire")]
    Locataire,
    #[sea_orm(string_value = "coproprietaire")]
    Coproprietaire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    #[sea_orm(string_value = "rural")]
    Rural,
    #[sea_orm(string_value = "urbain")]
    Urbain,
}

/// GPS position stored in the `geo_coord` JSON column.
#[derive(ToSchema, Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GeoCoord {
    pub lat: f64,
    pub lng: f64,
}

impl GeoCoord {
    fn to_json(self) -> Json {
        serde_json::json!({"lat": self.lat, "lng": self.lng})
    }

    fn from_json(value: Option<Json>) -> Option<Self> {
        value.and_then(|value| serde_json::from_value(value).ok())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "schools")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub address: String,
    pub head_name: String,
    pub head_phone: String,
    pub province_id: i32,
    pub city_id: Option<i32>,
    pub territory_id: Option<i32>,
    pub division_id: i32,
    pub sub_division_id: i32,
    pub village: Option<String>,
    #[sea_orm(unique)]
    pub adm_code: String,
    pub legal_reference: String,
    pub secope_number: String,
    pub management_regime: ManagementRegime,
    pub mechanized_status: MechanizedStatus,
    pub ownership_status: OwnershipStatus,
    pub environment: Environment,
    #[sea_orm(column_type = "Json", nullable)]
    pub geo_coord: Option<Json>,
    pub regroupment_center: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::geography::provinces::Entity",
        from = "Column::ProvinceId",
        to = "crate::geography::provinces::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Provinces,
    #[sea_orm(
        belongs_to = "crate::geography::divisions::Entity",
        from = "Column::DivisionId",
        to = "crate::geography::divisions::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Divisions,
    #[sea_orm(
        belongs_to = "crate::geography::sub_divisions::Entity",
        from = "Column::SubDivisionId",
        to = "crate::geography::sub_divisions::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    SubDivisions,
    #[sea_orm(
        belongs_to = "crate::geography::cities::Entity",
        from = "Column::CityId",
        to = "crate::geography::cities::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Cities,
    #[sea_orm(
        belongs_to = "crate::geography::territories::Entity",
        from = "Column::TerritoryId",
        to = "crate::geography::territories::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Territories,
    #[sea_orm(has_many = "crate::recoltes::models::Entity")]
    Recoltes,
}

impl Related<crate::geography::provinces::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provinces.def()
    }
}

impl Related<crate::geography::divisions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Divisions.def()
    }
}

impl Related<crate::geography::sub_divisions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubDivisions.def()
    }
}

impl Related<crate::geography::cities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cities.def()
    }
}

impl Related<crate::geography::territories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Territories.def()
    }
}

impl Related<crate::recoltes::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recoltes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct School {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub head_name: String,
    pub head_phone: String,
    pub province_id: i32,
    pub province_name: Option<String>,
    pub city_id: Option<i32>,
    pub territory_id: Option<i32>,
    pub division_id: i32,
    pub division_name: Option<String>,
    pub sub_division_id: i32,
    pub sub_division_name: Option<String>,
    pub village: Option<String>,
    pub adm_code: String,
    pub legal_reference: String,
    pub secope_number: String,
    pub management_regime: ManagementRegime,
    pub mechanized_status: MechanizedStatus,
    pub ownership_status: OwnershipStatus,
    pub environment: Environment,
    pub geo_coord: Option<GeoCoord>,
    pub regroupment_center: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Model> for School {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            address: model.address,
            head_name: model.head_name,
            head_phone: model.head_phone,
            province_id: model.province_id,
            province_name: None,
            city_id: model.city_id,
            territory_id: model.territory_id,
            division_id: model.division_id,
            division_name: None,
            sub_division_id: model.sub_division_id,
            sub_division_name: None,
            village: model.village,
            adm_code: model.adm_code,
            legal_reference: model.legal_reference,
            secope_number: model.secope_number,
            management_regime: model.management_regime,
            mechanized_status: model.mechanized_status,
            ownership_status: model.ownership_status,
            environment: model.environment,
            geo_coord: GeoCoord::from_json(model.geo_coord),
            regroupment_center: model.regroupment_center,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Lightweight row for the map view.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct SchoolMarker {
    pub id: i32,
    pub name: String,
    pub adm_code: String,
    pub management_regime: ManagementRegime,
    pub geo_coord: Option<GeoCoord>,
}

impl From<Model> for SchoolMarker {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            adm_code: model.adm_code,
            management_regime: model.management_regime,
            geo_coord: GeoCoord::from_json(model.geo_coord),
        }
    }
}

/// Offline clients compare this against their local copy.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug, FromQueryResult)]
pub struct SchoolSyncEntry {
    pub adm_code: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(ToSchema, Deserialize, Clone, Debug)]
pub struct SyncByCodes {
    #[serde(default)]
    pub codes: Vec<String>,
}

/// Explicit `latitude`/`longitude` win over a `geo_coord` object.
fn resolve_geo_coord(
    latitude: Option<f64>,
    longitude: Option<f64>,
    geo_coord: Option<GeoCoord>,
) -> Option<GeoCoord> {
    match (latitude, longitude) {
        (Some(lat), Some(lng)) => Some(GeoCoord { lat, lng }),
        _ => geo_coord,
    }
}

#[derive(ToSchema, Deserialize, Clone, Debug)]
pub struct SchoolCreate {
    pub name: String,
    pub address: String,
    pub head_name: String,
    pub head_phone: String,
    pub province_id: i32,
    #[serde(default)]
    pub city_id: Option<i32>,
    #[serde(default)]
    pub territory_id: Option<i32>,
    pub division_id: i32,
    pub sub_division_id: i32,
    #[serde(default)]
    pub village: Option<String>,
    pub adm_code: String,
    pub legal_reference: String,
    pub secope_number: String,
    pub management_regime: ManagementRegime,
    pub mechanized_status: MechanizedStatus,
    pub ownership_status: OwnershipStatus,
    pub environment: Environment,
    #[serde(default)]
    pub geo_coord: Option<GeoCoord>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<f64>)]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<f64>)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub regroupment_center: Option<String>,
}

impl SchoolCreate {
    /// Overwrites every writable column; timestamps are left to the caller.
    pub fn apply(self, mut active: ActiveModel) -> ActiveModel {
        let geo_coord = resolve_geo_coord(self.latitude, self.longitude, self.geo_coord);
        active.name = Set(self.name);
        active.address = Set(self.address);
        active.head_name = Set(self.head_name);
        active.head_phone = Set(self.head_phone);
        active.province_id = Set(self.province_id);
        active.city_id = Set(self.city_id);
        active.territory_id = Set(self.territory_id);
        active.division_id = Set(self.division_id);
        active.sub_division_id = Set(self.sub_division_id);
        active.village = Set(self.village);
        active.adm_code = Set(self.adm_code);
        active.legal_reference = Set(self.legal_reference);
        active.secope_number = Set(self.secope_number);
        active.management_regime = Set(self.management_regime);
        active.mechanized_status = Set(self.mechanized_status);
        active.ownership_status = Set(self.ownership_status);
        active.environment = Set(self.environment);
        active.geo_coord = Set(geo_coord.map(GeoCoord::to_json));
        active.regroupment_center = Set(self.regroupment_center);
        active
    }
}

/// Partial update: only fields present in the body are written.
#[derive(ToSchema, Deserialize, Clone, Debug, Default)]
pub struct SchoolUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
    pub head_name: Option<String>,
    pub head_phone: Option<String>,
    pub province_id: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub city_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<i32>)]
    pub territory_id: Option<Option<i32>>,
    pub division_id: Option<i32>,
    pub sub_division_id: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub village: Option<Option<String>>,
    pub adm_code: Option<String>,
    pub legal_reference: Option<String>,
    pub secope_number: Option<String>,
    pub management_regime: Option<ManagementRegime>,
    pub mechanized_status: Option<MechanizedStatus>,
    pub ownership_status: Option<OwnershipStatus>,
    pub environment: Option<Environment>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<GeoCoord>)]
    pub geo_coord: Option<Option<GeoCoord>>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<f64>)]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    #[schema(value_type = Option<f64>)]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub regroupment_center: Option<Option<String>>,
}

impl SchoolUpdate {
    /// A partial update cannot move a school with half a coordinate pair.
    pub fn check_coordinates(&self) -> BusinessResult<()> {
        match (self.latitude, self.longitude) {
            (Some(_), None) => Err(validation_error!("longitude", "required when latitude is given")),
            (None, Some(_)) => Err(validation_error!("latitude", "required when longitude is given")),
            _ => Ok(()),
        }
    }

    pub fn apply(self, mut active: ActiveModel) -> ActiveModel {
        if let Some(name) = self.name {
            active.name = Set(name);
        }
        if let Some(address) = self.address {
            active.address = Set(address);
        }
        if let Some(head_name) = self.head_name {
            active.head_name = Set(head_name);
        }
        if let Some(head_phone) = self.head_phone {
            active.head_phone = Set(head_phone);
        }
        if let Some(province_id) = self.province_id {
            active.province_id = Set(province_id);
        }
        if let Some(city_id) = self.city_id {
            active.city_id = Set(city_id);
        }
        if let Some(territory_id) = self.territory_id {
            active.territory_id = Set(territory_id);
        }
        if let Some(division_id) = self.division_id {
            active.division_id = Set(division_id);
        }
        if let Some(sub_division_id) = self.sub_division_id {
            active.sub_division_id = Set(sub_division_id);
        }
        if let Some(village) = self.village {
            active.village = Set(village);
        }
        if let Some(adm_code) = self.adm_code {
            active.adm_code = Set(adm_code);
        }
        if let Some(legal_reference) = self.legal_reference {
            active.legal_reference = Set(legal_reference);
        }
        if let Some(secope_number) = self.secope_number {
            active.secope_number = Set(secope_number);
        }
        if let Some(regime) = self.management_regime {
            active.management_regime = Set(regime);
        }
        if let Some(status) = self.mechanized_status {
            active.mechanized_status = Set(status);
        }
        if let Some(status) = self.ownership_status {
            active.ownership_status = Set(status);
        }
        if let Some(environment) = self.environment {
            active.environment = Set(environment);
        }
        if let (Some(lat), Some(lng)) = (self.latitude, self.longitude) {
            active.geo_coord = Set(Some(GeoCoord { lat, lng }.to_json()));
        } else if let Some(geo_coord) = self.geo_coord {
            active.geo_coord = Set(geo_coord.map(GeoCoord::to_json));
        }
        if let Some(center) = self.regroupment_center {
            active.regroupment_center = Set(center);
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(-4.3), Some(15.3), None, Some(GeoCoord { lat: -4.3, lng: 15.3 }))]
    #[case(Some(-4.3), None, None, None)]
    #[case(None, None, Some(GeoCoord { lat: 1.0, lng: 2.0 }), Some(GeoCoord { lat: 1.0, lng: 2.0 }))]
    #[case(Some(5.0), Some(6.0), Some(GeoCoord { lat: 1.0, lng: 2.0 }), Some(GeoCoord { lat: 5.0, lng: 6.0 }))]
    fn test_resolve_geo_coord(
        #[case] latitude: Option<f64>,
        #[case] longitude: Option<f64>,
        #[case] geo_coord: Option<GeoCoord>,
        #[case] expected: Option<GeoCoord>,
    ) {
        assert_eq!(resolve_geo_coord(latitude, longitude, geo_coord), expected);
    }

    #[rstest]
    #[case(Some(-4.3), None, false)]
    #[case(None, Some(15.3), false)]
    #[case(Some(-4.3), Some(15.3), true)]
    #[case(None, None, true)]
    fn test_partial_update_needs_both_coordinates(
        #[case] latitude: Option<f64>,
        #[case] longitude: Option<f64>,
        #[case] accepted: bool,
    ) {
        let update = SchoolUpdate {
            latitude,
            longitude,
            ..Default::default()
        };
        assert_eq!(update.check_coordinates().is_ok(), accepted);
    }

    #[test]
    fn test_management_regime_accented_values() {
        let regime: ManagementRegime = serde_json::from_str(r#""École Non Conventionnée""#).unwrap();
        assert_eq!(regime, ManagementRegime::NonConventionnee);
        assert_eq!(serde_json::to_string(&ManagementRegime::Privee).unwrap(), r#""Privée""#);
        assert!(serde_json::from_str::<ManagementRegime>(r#""Laïque""#).is_err());
    }

    #[test]
    fn test_geo_coord_ignores_malformed_json() {
        assert_eq!(GeoCoord::from_json(Some(serde_json::json!({"lat": "x"}))), None);
        assert_eq!(
            GeoCoord::from_json(Some(GeoCoord { lat: 1.5, lng: 2.5 }.to_json())),
            Some(GeoCoord { lat: 1.5, lng: 2.5 })
        );
    }
}
