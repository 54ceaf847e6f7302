use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)] // One table definition per administrative level
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Provinces::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Provinces::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Provinces::Name).string_len(255).unique_key())
                    .col(ColumnDef::new(Provinces::Code).string_len(50).unique_key())
                    .col(ColumnDef::new(Provinces::PrincipalTown).string_len(255))
                    .col(ColumnDef::new(Provinces::Surface).string_len(50))
                    .col(ColumnDef::new(Provinces::Population).string_len(50))
                    .col(ColumnDef::new(Provinces::Latitude).double())
                    .col(ColumnDef::new(Provinces::Longitude).double())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Divisions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Divisions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Divisions::ProvinceId).integer().not_null())
                    .col(ColumnDef::new(Divisions::Code).string_len(255).unique_key())
                    .col(ColumnDef::new(Divisions::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Divisions::CreatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Divisions::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_divisions_province_id")
                            .from(Divisions::Table, Divisions::ProvinceId)
                            .to(Provinces::Table, Provinces::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubDivisions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubDivisions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SubDivisions::DivisionId).integer().not_null())
                    .col(
                        ColumnDef::new(SubDivisions::Code)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(SubDivisions::Name).string_len(255).not_null())
                    .col(ColumnDef::new(SubDivisions::CreatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(SubDivisions::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sub_divisions_division_id")
                            .from(SubDivisions::Table, SubDivisions::DivisionId)
                            .to(Divisions::Table, Divisions::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_sub_divisions_division_name")
                    .table(SubDivisions::Table)
                    .col(SubDivisions::DivisionId)
                    .col(SubDivisions::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cities::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cities::ProvinceId).integer().not_null())
                    .col(ColumnDef::new(Cities::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Cities::Code).string_len(255).unique_key())
                    .col(ColumnDef::new(Cities::CreatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Cities::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cities_province_id")
                            .from(Cities::Table, Cities::ProvinceId)
                            .to(Provinces::Table, Provinces::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_cities_province_name")
                    .table(Cities::Table)
                    .col(Cities::ProvinceId)
                    .col(Cities::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Territories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Territories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Territories::ProvinceId).integer().not_null())
                    .col(
                        ColumnDef::new(Territories::Code)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Territories::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Territories::CreatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Territories::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_territories_province_id")
                            .from(Territories::Table, Territories::ProvinceId)
                            .to(Provinces::Table, Provinces::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_territories_province_name")
                    .table(Territories::Table)
                    .col(Territories::ProvinceId)
                    .col(Territories::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Schools::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Schools::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Schools::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Schools::Address).string_len(255).not_null())
                    .col(ColumnDef::new(Schools::HeadName).string_len(255).not_null())
                    .col(ColumnDef::new(Schools::HeadPhone).string_len(255).not_null())
                    .col(ColumnDef::new(Schools::ProvinceId).integer().not_null())
                    .col(ColumnDef::new(Schools::CityId).integer())
                    .col(ColumnDef::new(Schools::TerritoryId).integer())
                    .col(ColumnDef::new(Schools::DivisionId).integer().not_null())
                    .col(ColumnDef::new(Schools::SubDivisionId).integer().not_null())
                    .col(ColumnDef::new(Schools::Village).string_len(255))
                    .col(
                        ColumnDef::new(Schools::AdmCode)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Schools::LegalReference).string_len(255).not_null())
                    .col(ColumnDef::new(Schools::SecopeNumber).string_len(255).not_null())
                    .col(ColumnDef::new(Schools::ManagementRegime).string_len(50).not_null())
                    .col(ColumnDef::new(Schools::MechanizedStatus).string_len(50).not_null())
                    .col(ColumnDef::new(Schools::OwnershipStatus).string_len(50).not_null())
                    .col(ColumnDef::new(Schools::Environment).string_len(20).not_null())
                    .col(ColumnDef::new(Schools::GeoCoord).json())
                    .col(ColumnDef::new(Schools::RegroupmentCenter).string_len(255))
                    .col(ColumnDef::new(Schools::CreatedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Schools::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schools_province_id")
                            .from(Schools::Table, Schools::ProvinceId)
                            .to(Provinces::Table, Provinces::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schools_city_id")
                            .from(Schools::Table, Schools::CityId)
                            .to(Cities::Table, Cities::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schools_territory_id")
                            .from(Schools::Table, Schools::TerritoryId)
                            .to(Territories::Table, Territories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schools_division_id")
                            .from(Schools::Table, Schools::DivisionId)
                            .to(Divisions::Table, Divisions::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schools_sub_division_id")
                            .from(Schools::Table, Schools::SubDivisionId)
                            .to(SubDivisions::Table, SubDivisions::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Sync endpoints and search hit these constantly
        manager
            .create_index(
                Index::create()
                    .name("idx_schools_name")
                    .table(Schools::Table)
                    .col(Schools::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_schools_updated_at")
                    .table(Schools::Table)
                    .col(Schools::UpdatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Schools::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Territories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Cities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SubDivisions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Divisions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Provinces::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Provinces {
    Table,
    Id,
    Name,
    Code,
    PrincipalTown,
    Surface,
    Population,
    Latitude,
    Longitude,
}

#[derive(DeriveIden)]
enum Divisions {
    Table,
    Id,
    ProvinceId,
    Code,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SubDivisions {
    Table,
    Id,
    DivisionId,
    Code,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Cities {
    Table,
    Id,
    ProvinceId,
    Name,
    Code,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Territories {
    Table,
    Id,
    ProvinceId,
    Code,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum Schools {
    Table,
    Id,
    Name,
    Address,
    HeadName,
    HeadPhone,
    ProvinceId,
    CityId,
    TerritoryId,
    DivisionId,
    SubDivisionId,
    Village,
    AdmCode,
    LegalReference,
    SecopeNumber,
    ManagementRegime,
    MechanizedStatus,
    OwnershipStatus,
    Environment,
    GeoCoord,
    RegroupmentCenter,
    CreatedAt,
    UpdatedAt,
}
