use sea_orm_migration::prelude::*;

use super::m001_reference_tables::{Agreements, Clients, PlanStatuses, Users};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Plans::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Plans::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Plans::AgreementId).integer().not_null())
                    .col(ColumnDef::new(Plans::StatusId).integer().not_null())
                    .col(ColumnDef::new(Plans::CreatorId).integer().not_null())
                    .col(ColumnDef::new(Plans::RangeName).string().not_null())
                    .col(ColumnDef::new(Plans::EffectiveAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Plans::SubmittedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Plans::AmendmentTypeId).integer())
                    .col(ColumnDef::new(Plans::ExtensionId).integer())
                    .col(ColumnDef::new(Plans::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Plans::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plans_agreement_id")
                            .from(Plans::Table, Plans::AgreementId)
                            .to(Agreements::Table, Agreements::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plans_status_id")
                            .from(Plans::Table, Plans::StatusId)
                            .to(PlanStatuses::Table, PlanStatuses::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plans_creator_id")
                            .from(Plans::Table, Plans::CreatorId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Pastures::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Pastures::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(Pastures::PlanId).integer().not_null())
                    .col(ColumnDef::new(Pastures::Name).string().not_null())
                    .col(ColumnDef::new(Pastures::AllowableAum).integer())
                    .col(ColumnDef::new(Pastures::GraceDays).integer())
                    .col(ColumnDef::new(Pastures::Notes).text())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_pastures_plan_id")
                            .from(Pastures::Table, Pastures::PlanId)
                            .to(Plans::Table, Plans::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlanSnapshots::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlanSnapshots::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(PlanSnapshots::PlanId).integer().not_null())
                    .col(ColumnDef::new(PlanSnapshots::Version).integer().not_null())
                    .col(ColumnDef::new(PlanSnapshots::Snapshot).json().not_null())
                    .col(ColumnDef::new(PlanSnapshots::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(PlanSnapshots::UserId).integer())
                    .col(ColumnDef::new(PlanSnapshots::IsDiscarded).boolean().not_null().default(false))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plan_snapshots_plan_id")
                            .from(PlanSnapshots::Table, PlanSnapshots::PlanId)
                            .to(Plans::Table, Plans::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Versions are never reused; a racing append fails on this index.
        manager
            .create_index(
                Index::create()
                    .name("idx_plan_snapshots_plan_version")
                    .table(PlanSnapshots::Table)
                    .col(PlanSnapshots::PlanId)
                    .col(PlanSnapshots::Version)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlanStatusHistory::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlanStatusHistory::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(PlanStatusHistory::PlanId).integer().not_null())
                    .col(ColumnDef::new(PlanStatusHistory::FromStatusId).integer())
                    .col(ColumnDef::new(PlanStatusHistory::ToStatusId).integer().not_null())
                    .col(ColumnDef::new(PlanStatusHistory::UserId).integer().not_null())
                    .col(ColumnDef::new(PlanStatusHistory::Note).text())
                    .col(ColumnDef::new(PlanStatusHistory::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plan_status_history_plan_id")
                            .from(PlanStatusHistory::Table, PlanStatusHistory::PlanId)
                            .to(Plans::Table, Plans::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_plan_status_history_plan_id")
                    .table(PlanStatusHistory::Table)
                    .col(PlanStatusHistory::PlanId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlanConfirmations::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlanConfirmations::Id).integer().not_null().auto_increment().primary_key())
                    .col(ColumnDef::new(PlanConfirmations::PlanId).integer().not_null())
                    .col(ColumnDef::new(PlanConfirmations::ClientId).integer().not_null())
                    .col(ColumnDef::new(PlanConfirmations::Confirmed).boolean().not_null().default(false))
                    .col(ColumnDef::new(PlanConfirmations::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(PlanConfirmations::UpdatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plan_confirmations_plan_id")
                            .from(PlanConfirmations::Table, PlanConfirmations::PlanId)
                            .to(Plans::Table, Plans::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plan_confirmations_client_id")
                            .from(PlanConfirmations::Table, PlanConfirmations::ClientId)
                            .to(Clients::Table, Clients::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_plan_confirmations_plan_client")
                    .table(PlanConfirmations::Table)
                    .col(PlanConfirmations::PlanId)
                    .col(PlanConfirmations::ClientId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlanConfirmations::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PlanStatusHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PlanSnapshots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Pastures::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Plans::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Plans {
    Table,
    Id,
    AgreementId,
    StatusId,
    CreatorId,
    RangeName,
    EffectiveAt,
    SubmittedAt,
    AmendmentTypeId,
    ExtensionId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Pastures {
    Table,
    Id,
    PlanId,
    Name,
    AllowableAum,
    GraceDays,
    Notes,
}

#[derive(DeriveIden)]
enum PlanSnapshots {
    Table,
    Id,
    PlanId,
    Version,
    Snapshot,
    CreatedAt,
    UserId,
    IsDiscarded,
}

#[derive(DeriveIden)]
enum PlanStatusHistory {
    Table,
    Id,
    PlanId,
    FromStatusId,
    ToStatusId,
    UserId,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PlanConfirmations {
    Table,
    Id,
    PlanId,
    ClientId,
    Confirmed,
    CreatedAt,
    UpdatedAt,
}
