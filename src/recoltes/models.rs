use crate::common::models::EducationLevel;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::StringLen;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Review state of a collected questionnaire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, EnumIter, DeriveActiveEnum, ToSchema, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum RecolteStatus {
    #[default]
    #[sea_orm(string_value = "en_attente")]
    EnAttente,
    #[sea_orm(string_value = "valide")]
    Valide,
    #[sea_orm(string_value = "rejete")]
    Rejete,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "recoltes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub establishment_id: i32,
    pub campaign_id: Option<i32>,
    pub date: DateTime<Utc>,
    pub collector_name: String,
    pub collector_id: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub notes: String,
    pub r#type: EducationLevel,
    #[sea_orm(column_type = "Json")]
    pub answers: Json,
    pub status: RecolteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::schools::models::Entity",
        from = "Column::EstablishmentId",
        to = "crate::schools::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Schools,
    #[sea_orm(
        belongs_to = "crate::campaigns::models::Entity",
        from = "Column::CampaignId",
        to = "crate::campaigns::models::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Campaigns,
}

impl Related<crate::schools::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schools.def()
    }
}

impl Related<crate::campaigns::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaigns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct Recolte {
    pub id: Uuid,
    pub establishment_id: i32,
    pub campaign_id: Option<i32>,
    pub date: DateTime<Utc>,
    pub collector_name: String,
    pub collector_id: Option<String>,
    pub notes: String,
    pub r#type: EducationLevel,
    /// Answers keyed by question id
    #[schema(value_type = Object)]
    pub answers: Value,
    pub status: RecolteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Model> for Recolte {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            establishment_id: model.establishment_id,
            campaign_id: model.campaign_id,
            date: model.date,
            collector_name: model.collector_name,
            collector_id: model.collector_id,
            notes: model.notes,
            r#type: model.r#type,
            answers: model.answers,
            status: model.status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Answers are stored as sent; they are not checked against the template.
#[derive(ToSchema, Deserialize, Clone, Debug)]
pub struct RecolteCreate {
    pub establishment_id: i32,
    #[serde(default)]
    pub campaign_id: Option<i32>,
    pub date: DateTime<Utc>,
    pub collector_name: String,
    #[serde(default)]
    pub collector_id: Option<String>,
    #[serde(default)]
    pub notes: String,
    pub r#type: EducationLevel,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub answers: Map<String, Value>,
    /// Defaults to `en_attente` on create and is kept unchanged on update
    #[serde(default)]
    pub status: Option<RecolteStatus>,
}

impl RecolteCreate {
    pub fn apply(self, mut active: ActiveModel) -> ActiveModel {
        active.establishment_id = sea_orm::Set(self.establishment_id);
        active.campaign_id = sea_orm::Set(self.campaign_id);
        active.date = sea_orm::Set(self.date);
        active.collector_name = sea_orm::Set(self.collector_name);
        active.collector_id = sea_orm::Set(self.collector_id);
        active.notes = sea_orm::Set(self.notes);
        active.r#type = sea_orm::Set(self.r#type);
        active.answers = sea_orm::Set(Value::Object(self.answers));
        if let Some(status) = self.status {
            active.status = sea_orm::Set(status);
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RecolteStatus::EnAttente, "\"en_attente\"")]
    #[case(RecolteStatus::Valide, "\"valide\"")]
    #[case(RecolteStatus::Rejete, "\"rejete\"")]
    fn test_status_wire_names(#[case] status: RecolteStatus, #[case] expected: &str) {
        assert_eq!(serde_json::to_string(&status).unwrap(), expected);
    }

    #[test]
    fn test_status_defaults_to_pending() {
        assert_eq!(RecolteStatus::default(), RecolteStatus::EnAttente);
        assert!(serde_json::from_str::<RecolteStatus>("\"archive\"").is_err());
    }

    #[test]
    fn test_answers_must_be_an_object() {
        let body = serde_json::json!({
            "establishment_id": 1,
            "date": "2025-03-14T09:30:00Z",
            "collector_name": "Agent",
            "type": "primaire",
            "answers": ["not", "an", "object"]
        });
        assert!(serde_json::from_value::<RecolteCreate>(body).is_err());
    }
}
