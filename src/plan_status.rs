//! The plan status vocabulary.
//!
//! `plan_statuses` is reference data: ids and codes are fixed and seeded from
//! [`PlanStatusCode`], so the state machine, the legal window resolver and the privacy
//! table can reason over a closed Rust enum instead of string codes read at runtime.

use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum PlanStatusCode {
    #[strum(serialize = "C")]
    Created,
    #[strum(serialize = "D")]
    Draft,
    #[strum(serialize = "SD")]
    StaffDraft,
    #[strum(serialize = "SR")]
    SubmittedForReview,
    #[strum(serialize = "SFD")]
    SubmittedForFinalDecision,
    #[strum(serialize = "R")]
    ChangesRequested,
    #[strum(serialize = "RR")]
    RecommendReady,
    #[strum(serialize = "RNR")]
    RecommendNotReady,
    #[strum(serialize = "NF")]
    NotApprovedFurtherWorkRequired,
    #[strum(serialize = "NA")]
    NotApproved,
    #[strum(serialize = "O")]
    Completed,
    #[strum(serialize = "A")]
    Approved,
    #[strum(serialize = "WM")]
    WronglyMadeWithoutEffect,
    #[strum(serialize = "SW")]
    StandsWronglyMade,
    #[strum(serialize = "S")]
    Stands,
    #[strum(serialize = "SRV")]
    StandsReview,
    #[strum(serialize = "AC")]
    AwaitingConfirmation,
    #[strum(serialize = "MA")]
    MandatoryAmendmentStaff,
    #[strum(serialize = "RT")]
    Retired,
    #[strum(serialize = "EX")]
    Expired,
    #[strum(serialize = "P")]
    Pending,
    #[strum(serialize = "IP")]
    InProgress,
    #[strum(serialize = "SB")]
    Submitted,
}

/// Statuses during which a plan is the legally effective version.
pub const LEGAL_STATUSES: &[PlanStatusCode] = &[
    PlanStatusCode::Approved,
    PlanStatusCode::StandsWronglyMade,
    PlanStatusCode::Stands,
    PlanStatusCode::StandsReview,
];

impl PlanStatusCode {
    pub fn id(self) -> i32 {
        use PlanStatusCode::*;
        match self {
            Created => 1,
            Draft => 2,
            StaffDraft => 3,
            SubmittedForReview => 4,
            SubmittedForFinalDecision => 5,
            ChangesRequested => 6,
            RecommendReady => 7,
            RecommendNotReady => 8,
            NotApprovedFurtherWorkRequired => 9,
            NotApproved => 10,
            Completed => 11,
            Approved => 12,
            WronglyMadeWithoutEffect => 13,
            StandsWronglyMade => 14,
            Stands => 15,
            StandsReview => 16,
            AwaitingConfirmation => 17,
            MandatoryAmendmentStaff => 18,
            Retired => 19,
            Expired => 20,
            Pending => 21,
            InProgress => 22,
            Submitted => 23,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::iter().find(|status| status.id() == id)
    }

    pub fn code(self) -> &'static str {
        self.into()
    }

    pub fn name(self) -> &'static str {
        use PlanStatusCode::*;
        match self {
            Created => "Created",
            Draft => "Draft",
            StaffDraft => "Staff Draft",
            SubmittedForReview => "Submitted For Review",
            SubmittedForFinalDecision => "Submitted For Final Decision",
            ChangesRequested => "Changes Requested",
            RecommendReady => "Recommend Ready",
            RecommendNotReady => "Recommend Not Ready",
            NotApprovedFurtherWorkRequired => "Not Approved - Further Work Required",
            NotApproved => "Not Approved",
            Completed => "Completed",
            Approved => "Approved",
            WronglyMadeWithoutEffect => "Wrongly Made - Without Effect",
            StandsWronglyMade => "Stands - Wrongly Made",
            Stands => "Stands",
            StandsReview => "Stands - Review",
            AwaitingConfirmation => "Awaiting Confirmation",
            MandatoryAmendmentStaff => "Mandatory Amendment - Staff",
            Retired => "Retired",
            Expired => "Expired",
            Pending => "Pending",
            InProgress => "In Progress",
            Submitted => "Submitted",
        }
    }

    /// Legacy codes kept for historical rows; never a valid transition target.
    pub fn seeded_active(self) -> bool {
        !matches!(
            self,
            PlanStatusCode::Pending | PlanStatusCode::InProgress | PlanStatusCode::Submitted
        )
    }

    pub fn is_legal(self) -> bool {
        LEGAL_STATUSES.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PlanStatusCode::Retired | PlanStatusCode::Expired)
    }

    /// Whether reaching this status ends an amendment's voting round.
    pub fn concludes_amendment(self) -> bool {
        self.is_legal()
            || self.is_terminal()
            || matches!(
                self,
                PlanStatusCode::NotApproved | PlanStatusCode::WronglyMadeWithoutEffect
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_and_codes_are_unique() {
        let ids: HashSet<i32> = PlanStatusCode::iter().map(PlanStatusCode::id).collect();
        let codes: HashSet<&str> = PlanStatusCode::iter().map(PlanStatusCode::code).collect();
        assert_eq!(ids.len(), PlanStatusCode::iter().count());
        assert_eq!(codes.len(), PlanStatusCode::iter().count());
    }

    #[test]
    fn approved_is_twelve() {
        assert_eq!(PlanStatusCode::Approved.id(), 12);
        assert_eq!(PlanStatusCode::from_id(12), Some(PlanStatusCode::Approved));
        assert_eq!(PlanStatusCode::from_id(100), None);
    }

    #[test]
    fn codes_are_static_labels() {
        assert_eq!(PlanStatusCode::StandsReview.code(), "SRV");
        assert_eq!(PlanStatusCode::MandatoryAmendmentStaff.code(), "MA");
        let code: &'static str = PlanStatusCode::Approved.code();
        assert_eq!(code, "A");
    }

    #[test]
    fn legal_set_is_closed() {
        let legal: Vec<_> = PlanStatusCode::iter().filter(|s| s.is_legal()).collect();
        assert_eq!(legal.len(), 4);
        assert!(!PlanStatusCode::WronglyMadeWithoutEffect.is_legal());
        assert!(PlanStatusCode::Stands.concludes_amendment());
        assert!(!PlanStatusCode::AwaitingConfirmation.concludes_amendment());
    }
}
