//! Junction table binding campaigns to the questionnaires they use.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "campaign_question_templates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub campaign_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub question_template_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::models::Entity",
        from = "Column::CampaignId",
        to = "super::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Campaigns,
    #[sea_orm(
        belongs_to = "crate::questionnaires::templates::Entity",
        from = "Column::QuestionTemplateId",
        to = "crate::questionnaires::templates::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    QuestionTemplates,
}

impl Related<super::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Campaigns.def()
    }
}

impl Related<crate::questionnaires::templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuestionTemplates.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
