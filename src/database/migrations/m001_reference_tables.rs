use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PlanStatuses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlanStatuses::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(PlanStatuses::Code).string().not_null().unique_key())
                    .col(ColumnDef::new(PlanStatuses::Name).string().not_null())
                    .col(ColumnDef::new(PlanStatuses::Active).boolean().not_null().default(true))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AmendmentTypes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AmendmentTypes::Id).integer().not_null().primary_key())
                    .col(ColumnDef::new(AmendmentTypes::Code).string().not_null().unique_key())
                    .col(ColumnDef::new(AmendmentTypes::Description).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Clients::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Clients::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Clients::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Users::Username).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::DisplayName).string().not_null())
                    .col(ColumnDef::new(Users::Roles).text().not_null().default("[]"))
                    .col(ColumnDef::new(Users::ClientId).integer())
                    .col(ColumnDef::new(Users::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Users::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_users_client_id")
                            .from(Users::Table, Users::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Zones::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Zones::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Zones::Code).string().not_null().unique_key())
                    .col(ColumnDef::new(Zones::Description).string())
                    .col(ColumnDef::new(Zones::UserId).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_zones_user_id")
                            .from(Zones::Table, Zones::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Agreements::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Agreements::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Agreements::ForestFileId).string().not_null().unique_key())
                    .col(ColumnDef::new(Agreements::ZoneId).integer().not_null())
                    .col(ColumnDef::new(Agreements::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Agreements::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_agreements_zone_id")
                            .from(Agreements::Table, Agreements::ZoneId)
                            .to(Zones::Table, Zones::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ClientMemberships::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ClientMemberships::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(ClientMemberships::AgreementId).integer().not_null())
                    .col(ColumnDef::new(ClientMemberships::ClientId).integer().not_null())
                    .col(ColumnDef::new(ClientMemberships::ClientTypeId).integer().not_null())
                    .col(ColumnDef::new(ClientMemberships::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_client_memberships_agreement_id")
                            .from(ClientMemberships::Table, ClientMemberships::AgreementId)
                            .to(Agreements::Table, Agreements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_client_memberships_client_id")
                            .from(ClientMemberships::Table, ClientMemberships::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_client_memberships_agreement_client")
                    .table(ClientMemberships::Table)
                    .col(ClientMemberships::AgreementId)
                    .col(ClientMemberships::ClientId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClientMemberships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Agreements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Zones::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Clients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AmendmentTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PlanStatuses::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum PlanStatuses {
    Table,
    Id,
    Code,
    Name,
    Active,
}

#[derive(DeriveIden)]
pub(crate) enum AmendmentTypes {
    Table,
    Id,
    Code,
    Description,
}

#[derive(DeriveIden)]
pub(crate) enum Clients {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Username,
    DisplayName,
    Roles,
    ClientId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Zones {
    Table,
    Id,
    Code,
    Description,
    UserId,
}

#[derive(DeriveIden)]
pub(crate) enum Agreements {
    Table,
    Id,
    ForestFileId,
    ZoneId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ClientMemberships {
    Table,
    Id,
    AgreementId,
    ClientId,
    ClientTypeId,
    CreatedAt,
}
