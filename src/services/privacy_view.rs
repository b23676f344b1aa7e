//! Per-snapshot visibility for agreement holders and staff.
//!
//! The decision is a versioned lookup table over the plan's current status, the status
//! embedded in a snapshot, and whether that snapshot is the most recent non-discarded
//! one captured in its status. The table distinguishes the normal cycle (staff drafts,
//! agreement holders give input) from the mandatory amendment cycle where staff work
//! privately on top of agreement-holder input. Results depend on the current status and
//! are never cached.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::auth::Actor;
use crate::plan_status::PlanStatusCode;
use crate::services::legal_window::{chronological, SnapshotPoint};

pub const RULESET_VERSION: u32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrivacyView {
    AgreementHolder,
    StaffOnly,
    Both,
}

impl PrivacyView {
    pub fn admits(self, actor: &Actor) -> bool {
        match self {
            PrivacyView::Both => true,
            PrivacyView::StaffOnly => actor.is_staff(),
            PrivacyView::AgreementHolder => !actor.is_staff(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StatusGroup {
    AgreementHolderInput,
    StaffDrafting,
    Mandatory,
    Other,
}

impl StatusGroup {
    fn of(status: Option<PlanStatusCode>) -> Self {
        match status {
            Some(PlanStatusCode::Created) | Some(PlanStatusCode::Draft) => {
                StatusGroup::AgreementHolderInput
            }
            Some(PlanStatusCode::StaffDraft) => StatusGroup::StaffDrafting,
            Some(PlanStatusCode::MandatoryAmendmentStaff) => StatusGroup::Mandatory,
            _ => StatusGroup::Other,
        }
    }
}

struct Rule {
    current: Option<StatusGroup>,
    snapshot: StatusGroup,
    most_recent: Option<bool>,
    view: PrivacyView,
}

const fn rule(
    current: Option<StatusGroup>,
    snapshot: StatusGroup,
    most_recent: Option<bool>,
    view: PrivacyView,
) -> Rule {
    Rule {
        current,
        snapshot,
        most_recent,
        view,
    }
}

use PrivacyView::{AgreementHolder, Both, StaffOnly};
use StatusGroup::{AgreementHolderInput, Mandatory, StaffDrafting};

// First match wins.
const RULES_V1: &[Rule] = &[
    rule(Some(Mandatory), Mandatory, Some(true), StaffOnly),
    rule(Some(Mandatory), AgreementHolderInput, None, Both),
    rule(None, Mandatory, Some(false), StaffOnly),
    rule(None, Mandatory, None, Both),
    rule(Some(StaffDrafting), StaffDrafting, Some(true), StaffOnly),
    rule(None, StaffDrafting, Some(false), StaffOnly),
    rule(None, StaffDrafting, None, Both),
    rule(Some(AgreementHolderInput), AgreementHolderInput, Some(true), AgreementHolder),
    rule(None, AgreementHolderInput, Some(false), AgreementHolder),
    rule(None, AgreementHolderInput, None, Both),
];

impl Rule {
    fn matches(&self, current: StatusGroup, snapshot: StatusGroup, most_recent: bool) -> bool {
        self.current.map_or(true, |c| c == current)
            && self.snapshot == snapshot
            && self.most_recent.map_or(true, |m| m == most_recent)
    }
}

pub struct PrivacyViewResolver;

impl PrivacyViewResolver {
    pub fn decide(current_status_id: i32, snapshot_status_id: i32, most_recent: bool) -> PrivacyView {
        let current = StatusGroup::of(PlanStatusCode::from_id(current_status_id));
        let snapshot = StatusGroup::of(PlanStatusCode::from_id(snapshot_status_id));

        RULES_V1
            .iter()
            .find(|r| r.matches(current, snapshot, most_recent))
            .map(|r| r.view)
            .unwrap_or(PrivacyView::Both)
    }

    /// Views for a whole snapshot sequence, keyed by snapshot id.
    ///
    /// "Most recent" is judged per embedded status over non-discarded snapshots, so a
    /// discarded capture is never the most recent one.
    pub fn resolve(current_status_id: i32, points: &[SnapshotPoint]) -> HashMap<i32, PrivacyView> {
        let mut latest_by_status: HashMap<i32, &SnapshotPoint> = HashMap::new();
        for point in points.iter().filter(|p| !p.is_discarded) {
            latest_by_status
                .entry(point.status_id)
                .and_modify(|current| {
                    if chronological(point, current).is_gt() {
                        *current = point;
                    }
                })
                .or_insert(point);
        }

        points
            .iter()
            .map(|point| {
                let most_recent = latest_by_status
                    .get(&point.status_id)
                    .map_or(false, |latest| latest.snapshot_id == point.snapshot_id);
                (
                    point.snapshot_id,
                    Self::decide(current_status_id, point.status_id, most_recent),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::PrivacyView::{AgreementHolder, Both, StaffOnly};
    use chrono::{Duration, TimeZone, Utc};
    use PlanStatusCode::*;

    fn decide(current: PlanStatusCode, snapshot: PlanStatusCode, most_recent: bool) -> PrivacyView {
        PrivacyViewResolver::decide(current.id(), snapshot.id(), most_recent)
    }

    #[test]
    fn normal_cycle() {
        assert_eq!(decide(StaffDraft, StaffDraft, true), StaffOnly);
        assert_eq!(decide(Draft, StaffDraft, true), Both);
        assert_eq!(decide(Draft, StaffDraft, false), StaffOnly);
        assert_eq!(decide(Draft, Draft, true), AgreementHolder);
        assert_eq!(decide(SubmittedForReview, Draft, true), Both);
        assert_eq!(decide(SubmittedForReview, Draft, false), AgreementHolder);
    }

    #[test]
    fn mandatory_amendment_cycle_inverts_visibility() {
        assert_eq!(
            decide(MandatoryAmendmentStaff, MandatoryAmendmentStaff, true),
            StaffOnly
        );
        assert_eq!(decide(MandatoryAmendmentStaff, Draft, true), Both);
        assert_eq!(decide(AwaitingConfirmation, MandatoryAmendmentStaff, true), Both);
        assert_eq!(decide(Stands, MandatoryAmendmentStaff, false), StaffOnly);
    }

    #[test]
    fn other_statuses_are_shared() {
        assert_eq!(decide(Approved, Approved, true), Both);
        assert_eq!(PrivacyViewResolver::decide(999, 998, true), Both);
    }

    #[test]
    fn most_recent_is_per_status_and_skips_discards() {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let point = |id: i32, status: PlanStatusCode, discarded: bool| SnapshotPoint {
            snapshot_id: id,
            version: id,
            status_id: status.id(),
            created_at: base + Duration::minutes(id as i64),
            is_discarded: discarded,
        };
        let points = vec![
            point(1, StaffDraft, false),
            point(2, StaffDraft, false),
            point(3, StaffDraft, true),
        ];

        let views = PrivacyViewResolver::resolve(StaffDraft.id(), &points);
        assert_eq!(views[&1], StaffOnly);
        assert_eq!(views[&2], StaffOnly);
        assert_eq!(views[&3], StaffOnly);

        let views = PrivacyViewResolver::resolve(Draft.id(), &points);
        assert_eq!(views[&2], Both);
        assert_eq!(views[&1], StaffOnly);
    }

    #[test]
    fn viewer_admission() {
        let staff = Actor::new(1).with_role("range_officer");
        let holder = Actor::new(2).with_role("agreement_holder").with_client(7);
        assert!(StaffOnly.admits(&staff));
        assert!(!StaffOnly.admits(&holder));
        assert!(AgreementHolder.admits(&holder));
        assert!(!AgreementHolder.admits(&staff));
        assert!(Both.admits(&holder));
    }
}
