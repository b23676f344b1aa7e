use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{debug, warn};

use crate::auth::Actor;
use crate::database::entities::plan_snapshots::PlanSnapshotDocument;
use crate::errors::{CoreError, CoreResult};
use crate::services::access_gate::{load_agreement, AccessGate};
use crate::services::legal_window::{chronological, LegalWindowResolver, SnapshotPoint};
use crate::services::plan_state_machine::load_plan;
use crate::services::privacy_view::{PrivacyView, PrivacyViewResolver, RULESET_VERSION};
use crate::services::snapshot_store::SnapshotStore;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotReportRow {
    pub snapshot_id: i32,
    pub version: i32,
    pub status_id: i32,
    /// Status of the preceding non-discarded snapshot
    pub from_status_id: Option<i32>,
    pub is_discarded: bool,
    pub created_at: DateTime<Utc>,
    pub effective_legal_start: Option<DateTime<Utc>>,
    pub effective_legal_end: Option<DateTime<Utc>>,
    pub privacy_view: PrivacyView,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotReport {
    pub plan_id: i32,
    pub current_status_id: i32,
    pub privacy_ruleset: u32,
    pub snapshots: Vec<SnapshotReportRow>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotView {
    pub snapshot_id: i32,
    pub version: i32,
    pub privacy_view: PrivacyView,
    pub document: PlanSnapshotDocument,
}

/// Read model over a plan's snapshot history. Legal windows and privacy views are
/// derived on every call from committed snapshots and the plan's current status.
#[derive(Clone)]
pub struct PlanReportService {
    db: DatabaseConnection,
    snapshots: SnapshotStore,
}

impl PlanReportService {
    pub fn new(db: DatabaseConnection) -> Self {
        let snapshots = SnapshotStore::new(db.clone());
        Self { db, snapshots }
    }

    pub async fn snapshot_report(
        &self,
        actor: &Actor,
        plan_id: i32,
    ) -> CoreResult<SnapshotReport> {
        let plan = load_plan(&self.db, plan_id).await?;
        let agreement = load_agreement(&self.db, plan.agreement_id).await?;
        AccessGate::require(&self.db, actor, &agreement).await?;

        let points = self.points(plan_id).await?;
        let rows = build_report(plan.status_id, &points);

        debug!(
            "Built snapshot report for plan {} with {} rows",
            plan_id,
            rows.len()
        );

        Ok(SnapshotReport {
            plan_id,
            current_status_id: plan.status_id,
            privacy_ruleset: RULESET_VERSION,
            snapshots: rows,
        })
    }

    /// The snapshot document, if its current privacy view admits the viewer.
    pub async fn snapshot_for_viewer(
        &self,
        actor: &Actor,
        plan_id: i32,
        snapshot_id: i32,
    ) -> CoreResult<SnapshotView> {
        let plan = load_plan(&self.db, plan_id).await?;
        let agreement = load_agreement(&self.db, plan.agreement_id).await?;
        AccessGate::require(&self.db, actor, &agreement).await?;

        let snapshot = self.snapshots.find(plan_id, snapshot_id).await?;
        let points = self.points(plan_id).await?;
        let view = PrivacyViewResolver::resolve(plan.status_id, &points)
            .get(&snapshot_id)
            .copied()
            .unwrap_or(PrivacyView::Both);

        if !view.admits(actor) {
            return Err(CoreError::forbidden(format!(
                "Snapshot {} is not visible to this user",
                snapshot_id
            )));
        }

        Ok(SnapshotView {
            snapshot_id,
            version: snapshot.version,
            privacy_view: view,
            document: snapshot.document()?,
        })
    }

    /// Discarded captures whose document no longer parses are left out; an unreadable
    /// live snapshot is still an error.
    async fn points(&self, plan_id: i32) -> CoreResult<Vec<SnapshotPoint>> {
        let models = self.snapshots.all_for_plan(plan_id).await?;
        let mut points = Vec::with_capacity(models.len());
        for model in &models {
            match SnapshotPoint::from_model(model) {
                Ok(point) => points.push(point),
                Err(err) if model.is_discarded => {
                    warn!(
                        "Skipping discarded snapshot {} of plan {}: {}",
                        model.id, plan_id, err
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(points)
    }
}

/// One row per snapshot in chronological order.
pub fn build_report(current_status_id: i32, points: &[SnapshotPoint]) -> Vec<SnapshotReportRow> {
    let mut ordered: Vec<&SnapshotPoint> = points.iter().collect();
    ordered.sort_by(|a, b| chronological(a, b));

    let windows = LegalWindowResolver::resolve(points);
    let views = PrivacyViewResolver::resolve(current_status_id, points);

    let mut previous_status: Option<i32> = None;
    ordered
        .into_iter()
        .map(|point| {
            let window = windows.iter().find(|w| w.snapshot_id == point.snapshot_id);
            let row = SnapshotReportRow {
                snapshot_id: point.snapshot_id,
                version: point.version,
                status_id: point.status_id,
                from_status_id: previous_status,
                is_discarded: point.is_discarded,
                created_at: point.created_at,
                effective_legal_start: window.map(|w| w.start),
                effective_legal_end: window.and_then(|w| w.end),
                privacy_view: views
                    .get(&point.snapshot_id)
                    .copied()
                    .unwrap_or(PrivacyView::Both),
            };
            if !point.is_discarded {
                previous_status = Some(point.status_id);
            }
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan_status::PlanStatusCode;
    use chrono::{Duration, TimeZone};

    #[test]
    fn report_links_previous_status_and_windows() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let point = |id: i32, status: PlanStatusCode, discarded: bool| SnapshotPoint {
            snapshot_id: id,
            version: id,
            status_id: status.id(),
            created_at: base + Duration::hours(id as i64),
            is_discarded: discarded,
        };
        let points = vec![
            point(1, PlanStatusCode::StaffDraft, false),
            point(2, PlanStatusCode::SubmittedForReview, true),
            point(3, PlanStatusCode::Approved, false),
            point(4, PlanStatusCode::Stands, false),
        ];

        let rows = build_report(PlanStatusCode::Stands.id(), &points);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].from_status_id, None);
        assert_eq!(rows[1].from_status_id, Some(PlanStatusCode::StaffDraft.id()));
        assert_eq!(rows[2].from_status_id, Some(PlanStatusCode::StaffDraft.id()));
        assert_eq!(rows[3].from_status_id, Some(PlanStatusCode::Approved.id()));

        assert_eq!(rows[2].effective_legal_start, Some(points[2].created_at));
        assert_eq!(rows[2].effective_legal_end, Some(points[3].created_at));
        assert_eq!(rows[3].effective_legal_end, None);
        assert_eq!(rows[1].effective_legal_start, None);

        assert_eq!(rows[0].privacy_view, PrivacyView::Both);
    }
}
