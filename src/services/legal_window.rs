//! Legal effective-date windows derived from a plan's snapshot sequence.
//!
//! Each non-discarded snapshot captured in a legally effective status opens a window at
//! its `created_at`; the window closes when the next non-discarded legal snapshot of the
//! same plan is captured. Windows are recomputed on every read.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::entities::plan_snapshots;
use crate::errors::PlanError;
use crate::plan_status::PlanStatusCode;

/// The fields of a stored snapshot that derived views depend on.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotPoint {
    pub snapshot_id: i32,
    pub version: i32,
    pub status_id: i32,
    pub created_at: DateTime<Utc>,
    pub is_discarded: bool,
}

impl SnapshotPoint {
    pub fn from_model(model: &plan_snapshots::Model) -> Result<Self, PlanError> {
        Ok(Self {
            snapshot_id: model.id,
            version: model.version,
            status_id: model.status_id()?,
            created_at: model.created_at,
            is_discarded: model.is_discarded,
        })
    }

    pub fn status(&self) -> Option<PlanStatusCode> {
        PlanStatusCode::from_id(self.status_id)
    }

    fn is_legal(&self) -> bool {
        self.status().map(PlanStatusCode::is_legal).unwrap_or(false)
    }
}

/// Chronological order: capture time, then version for captures in the same instant.
pub fn chronological(a: &SnapshotPoint, b: &SnapshotPoint) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.version.cmp(&b.version))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalWindow {
    pub snapshot_id: i32,
    pub status_id: i32,
    pub start: DateTime<Utc>,
    /// `None` while the snapshot is still in force
    pub end: Option<DateTime<Utc>>,
}

impl LegalWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && self.end.map_or(true, |end| at < end)
    }
}

pub struct LegalWindowResolver;

impl LegalWindowResolver {
    /// Windows for every non-discarded legal snapshot, in chronological order.
    pub fn resolve(points: &[SnapshotPoint]) -> Vec<LegalWindow> {
        let mut legal: Vec<&SnapshotPoint> = points
            .iter()
            .filter(|p| !p.is_discarded && p.is_legal())
            .collect();
        legal.sort_by(|a, b| chronological(a, b));

        legal
            .iter()
            .enumerate()
            .map(|(idx, point)| LegalWindow {
                snapshot_id: point.snapshot_id,
                status_id: point.status_id,
                start: point.created_at,
                end: legal.get(idx + 1).map(|next| next.created_at),
            })
            .collect()
    }

    pub fn window_for(points: &[SnapshotPoint], snapshot_id: i32) -> Option<LegalWindow> {
        Self::resolve(points)
            .into_iter()
            .find(|w| w.snapshot_id == snapshot_id)
    }

    /// The snapshot that was the legally effective version of the plan at `at`.
    pub fn in_force_at(points: &[SnapshotPoint], at: DateTime<Utc>) -> Option<LegalWindow> {
        Self::resolve(points).into_iter().find(|w| w.contains(at))
    }
}
