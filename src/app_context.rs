use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::services::{
    AccessGate, ConfirmationCoordinator, MembershipService, PlanReportService, PlanService,
    PlanStateMachine, SnapshotStore, StatusHistoryService,
};

/// Shared application context exposing the lifecycle services to the HTTP layer.
#[derive(Clone)]
pub struct AppContext {
    db: DatabaseConnection,
    access_gate: Arc<AccessGate>,
    plan_service: Arc<PlanService>,
    state_machine: Arc<PlanStateMachine>,
    confirmations: Arc<ConfirmationCoordinator>,
    memberships: Arc<MembershipService>,
    snapshots: Arc<SnapshotStore>,
    history: Arc<StatusHistoryService>,
    reports: Arc<PlanReportService>,
}

impl AppContext {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            access_gate: Arc::new(AccessGate::new(db.clone())),
            plan_service: Arc::new(PlanService::new(db.clone())),
            state_machine: Arc::new(PlanStateMachine::new(db.clone())),
            confirmations: Arc::new(ConfirmationCoordinator::new(db.clone())),
            memberships: Arc::new(MembershipService::new(db.clone())),
            snapshots: Arc::new(SnapshotStore::new(db.clone())),
            history: Arc::new(StatusHistoryService::new(db.clone())),
            reports: Arc::new(PlanReportService::new(db.clone())),
            db,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn access_gate(&self) -> &Arc<AccessGate> {
        &self.access_gate
    }

    pub fn plan_service(&self) -> &Arc<PlanService> {
        &self.plan_service
    }

    pub fn state_machine(&self) -> &Arc<PlanStateMachine> {
        &self.state_machine
    }

    pub fn confirmations(&self) -> &Arc<ConfirmationCoordinator> {
        &self.confirmations
    }

    pub fn memberships(&self) -> &Arc<MembershipService> {
        &self.memberships
    }

    pub fn snapshots(&self) -> &Arc<SnapshotStore> {
        &self.snapshots
    }

    pub fn history(&self) -> &Arc<StatusHistoryService> {
        &self.history
    }

    pub fn reports(&self) -> &Arc<PlanReportService> {
        &self.reports
    }
}
