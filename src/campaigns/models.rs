use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[sea_orm(column_type = "Text", nullable)]
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::campaign_templates::Entity")]
    CampaignTemplates,
    #[sea_orm(has_many = "crate::recoltes::models::Entity")]
    Recoltes,
}

impl Related<super::campaign_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CampaignTemplates.def()
    }
}

impl Related<crate::questionnaires::templates::Entity> for Entity {
    fn to() -> RelationDef {
        super::campaign_templates::Relation::QuestionTemplates.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::campaign_templates::Relation::Campaigns.def().rev())
    }
}

impl Related<crate::recoltes::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recoltes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct Campaign {
    pub id: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub comments: Option<String>,
    /// Ids of the questionnaires used during the campaign
    pub question_templates: Vec<Uuid>,
    /// Number of recoltes attached to the campaign
    pub recolte_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn build(model: Model, question_templates: Vec<Uuid>, recolte_count: u64) -> Self {
        Self {
            id: model.id,
            name: model.name,
            start_date: model.start_date,
            end_date: model.end_date,
            comments: model.comments,
            question_templates,
            recolte_count,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(ToSchema, Deserialize, Clone, Debug)]
pub struct CampaignCreate {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub question_templates: Vec<Uuid>,
}
