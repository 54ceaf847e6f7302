use crate::m20250301_000001_create_geography_and_schools::Schools;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QuestionTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuestionTemplates::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QuestionTemplates::Type).string_len(50).not_null())
                    .col(ColumnDef::new(QuestionTemplates::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(QuestionTemplates::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(QuestionTemplates::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Groupes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Groupes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Groupes::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Groupes::Description).text())
                    .col(
                        ColumnDef::new(Groupes::Order)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Questions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Questions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Questions::TemplateId).uuid().not_null())
                    .col(ColumnDef::new(Questions::GroupeId).integer())
                    .col(ColumnDef::new(Questions::Text).text().not_null())
                    .col(ColumnDef::new(Questions::Kind).string_len(20).not_null())
                    .col(ColumnDef::new(Questions::Options).json().not_null())
                    .col(
                        ColumnDef::new(Questions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Questions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_questions_template_id")
                            .from(Questions::Table, Questions::TemplateId)
                            .to(QuestionTemplates::Table, QuestionTemplates::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_questions_groupe_id")
                            .from(Questions::Table, Questions::GroupeId)
                            .to(Groupes::Table, Groupes::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Campaigns::StartDate).date().not_null())
                    .col(ColumnDef::new(Campaigns::EndDate).date().not_null())
                    .col(ColumnDef::new(Campaigns::Comments).text())
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Campaigns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CampaignQuestionTemplates::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CampaignQuestionTemplates::CampaignId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CampaignQuestionTemplates::QuestionTemplateId)
                            .uuid()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(CampaignQuestionTemplates::CampaignId)
                            .col(CampaignQuestionTemplates::QuestionTemplateId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_question_templates_campaign_id")
                            .from(
                                CampaignQuestionTemplates::Table,
                                CampaignQuestionTemplates::CampaignId,
                            )
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_campaign_question_templates_template_id")
                            .from(
                                CampaignQuestionTemplates::Table,
                                CampaignQuestionTemplates::QuestionTemplateId,
                            )
                            .to(QuestionTemplates::Table, QuestionTemplates::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Recoltes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Recoltes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Recoltes::EstablishmentId).integer().not_null())
                    .col(ColumnDef::new(Recoltes::CampaignId).integer())
                    .col(
                        ColumnDef::new(Recoltes::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Recoltes::CollectorName).string_len(255).not_null())
                    .col(ColumnDef::new(Recoltes::CollectorId).string_len(255))
                    .col(ColumnDef::new(Recoltes::Notes).text().not_null().default(""))
                    .col(ColumnDef::new(Recoltes::Type).string_len(50).not_null())
                    .col(ColumnDef::new(Recoltes::Answers).json().not_null())
                    .col(
                        ColumnDef::new(Recoltes::Status)
                            .string_len(20)
                            .not_null()
                            .default("en_attente"),
                    )
                    .col(
                        ColumnDef::new(Recoltes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Recoltes::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recoltes_establishment_id")
                            .from(Recoltes::Table, Recoltes::EstablishmentId)
                            .to(Schools::Table, Schools::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recoltes_campaign_id")
                            .from(Recoltes::Table, Recoltes::CampaignId)
                            .to(Campaigns::Table, Campaigns::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recoltes_type_status")
                    .table(Recoltes::Table)
                    .col(Recoltes::Type)
                    .col(Recoltes::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Recoltes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CampaignQuestionTemplates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Questions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Groupes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QuestionTemplates::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum QuestionTemplates {
    Table,
    Id,
    Type,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Groupes {
    Table,
    Id,
    Name,
    Description,
    Order,
}

#[derive(DeriveIden)]
enum Questions {
    Table,
    Id,
    TemplateId,
    GroupeId,
    Text,
    Kind,
    Options,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    Name,
    StartDate,
    EndDate,
    Comments,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CampaignQuestionTemplates {
    Table,
    CampaignId,
    QuestionTemplateId,
}

#[derive(DeriveIden)]
enum Recoltes {
    Table,
    Id,
    EstablishmentId,
    CampaignId,
    Date,
    CollectorName,
    CollectorId,
    Notes,
    Type,
    Answers,
    Status,
    CreatedAt,
    UpdatedAt,
}
