use super::questions::Question;
use crate::common::models::EducationLevel;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "question_templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub r#type: EducationLevel,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::questions::Entity")]
    Questions,
    #[sea_orm(has_many = "crate::campaigns::campaign_templates::Entity")]
    CampaignTemplates,
}

impl Related<super::questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl Related<crate::campaigns::campaign_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CampaignTemplates.def()
    }
}

impl Related<crate::campaigns::models::Entity> for Entity {
    fn to() -> RelationDef {
        crate::campaigns::campaign_templates::Relation::Campaigns.def()
    }

    fn via() -> Option<RelationDef> {
        Some(
            crate::campaigns::campaign_templates::Relation::QuestionTemplates
                .def()
                .rev(),
        )
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A questionnaire with its questions inlined.
#[derive(ToSchema, Serialize, Deserialize, Clone, Debug)]
pub struct QuestionTemplate {
    pub id: Uuid,
    pub r#type: EducationLevel,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub questions: Vec<Question>,
}

impl QuestionTemplate {
    pub fn with_questions(model: Model, questions: Vec<super::questions::Model>) -> Self {
        Self {
            id: model.id,
            r#type: model.r#type,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
            questions: questions.into_iter().map(Question::from).collect(),
        }
    }
}

#[derive(ToSchema, Deserialize, Clone, Debug)]
pub struct QuestionTemplateCreate {
    pub r#type: EducationLevel,
    pub name: String,
}
