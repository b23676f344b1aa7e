use sea_orm_migration::prelude::*;
use strum::IntoEnumIterator;

use super::m001_reference_tables::{AmendmentTypes, PlanStatuses};
use crate::database::entities::amendment_types::AmendmentKind;
use crate::plan_status::PlanStatusCode;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut statuses = Query::insert();
        statuses.into_table(PlanStatuses::Table).columns([
            PlanStatuses::Id,
            PlanStatuses::Code,
            PlanStatuses::Name,
            PlanStatuses::Active,
        ]);
        for status in PlanStatusCode::iter() {
            statuses
                .values([
                    status.id().into(),
                    status.code().into(),
                    status.name().into(),
                    status.seeded_active().into(),
                ])
                .map_err(|e| DbErr::Migration(e.to_string()))?;
        }
        manager.exec_stmt(statuses).await?;

        let mut amendment_types = Query::insert();
        amendment_types.into_table(AmendmentTypes::Table).columns([
            AmendmentTypes::Id,
            AmendmentTypes::Code,
            AmendmentTypes::Description,
        ]);
        for kind in AmendmentKind::ALL {
            amendment_types
                .values([kind.id().into(), kind.code().into(), kind.description().into()])
                .map_err(|e| DbErr::Migration(e.to_string()))?;
        }
        manager.exec_stmt(amendment_types).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::delete().from_table(AmendmentTypes::Table).to_owned())
            .await?;
        manager
            .exec_stmt(Query::delete().from_table(PlanStatuses::Table).to_owned())
            .await?;

        Ok(())
    }
}
