//! Amendment voting and membership reactions.

mod common;

use common::{create_client, fixture, Fixture};
use range_plan::database::entities::{plan_confirmations, plans};
use range_plan::errors::CoreErrorKind;
use range_plan::plan_status::PlanStatusCode;
use range_plan::services::plan_service::CreatePlanInput;
use range_plan::services::{
    ConfirmationCoordinator, MembershipService, PlanService, PlanStateMachine,
};
use sea_orm::EntityTrait;
use serde_json::json;

const MINOR: i32 = 1;
const MAJOR: i32 = 2;
const MANDATORY: i32 = 3;

/// An approved plan owned by the zone officer.
async fn approved_plan(fx: &Fixture) -> plans::Model {
    let created = PlanService::new(fx.db.clone())
        .create_plan(
            &fx.officer,
            CreatePlanInput {
                agreement_id: fx.agreement.id,
                range_name: "Cherry Creek".to_string(),
                extension_id: Some(7),
                pastures: Vec::new(),
            },
        )
        .await
        .unwrap();
    PlanStateMachine::new(fx.db.clone())
        .transition(
            &fx.officer,
            created.plan.id,
            &json!(PlanStatusCode::Approved.id()),
            None,
        )
        .await
        .unwrap()
        .plan
}

/// An amendment of an approved plan, moved to Awaiting Confirmation by its creator.
async fn amendment_awaiting_confirmation(fx: &Fixture, amendment_type: i32) -> plans::Model {
    let source = approved_plan(fx).await;
    let amendment = PlanService::new(fx.db.clone())
        .create_amendment(&fx.officer, source.id, amendment_type)
        .await
        .unwrap();
    PlanStateMachine::new(fx.db.clone())
        .transition(
            &fx.officer,
            amendment.plan.id,
            &json!(PlanStatusCode::AwaitingConfirmation.id()),
            None,
        )
        .await
        .unwrap()
        .plan
}

fn row_for(rows: &[plan_confirmations::Model], client_id: i32) -> plan_confirmations::Model {
    rows.iter()
        .find(|r| r.client_id == client_id)
        .cloned()
        .expect("confirmation row for client")
}

#[tokio::test]
async fn amendment_creates_one_unconfirmed_row_per_client() {
    let fx = fixture().await;
    let source = approved_plan(&fx).await;

    let amendment = PlanService::new(fx.db.clone())
        .create_amendment(&fx.officer, source.id, MINOR)
        .await
        .unwrap();

    assert_eq!(amendment.plan.status_id, PlanStatusCode::Draft.id());
    assert_eq!(amendment.plan.amendment_type_id, Some(MINOR));
    assert_eq!(amendment.plan.extension_id, Some(7));
    assert_eq!(amendment.confirmations.len(), 2);
    assert!(amendment.confirmations.iter().all(|c| !c.confirmed));
}

#[tokio::test]
async fn amendments_need_a_legal_source_and_mandatory_needs_staff() {
    let fx = fixture().await;
    let service = PlanService::new(fx.db.clone());
    let draft = service
        .create_plan(
            &fx.holder_a,
            CreatePlanInput {
                agreement_id: fx.agreement.id,
                range_name: "Draft Range".to_string(),
                extension_id: None,
                pastures: Vec::new(),
            },
        )
        .await
        .unwrap();

    let err = service
        .create_amendment(&fx.officer, draft.plan.id, MINOR)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Validation);

    let source = approved_plan(&fx).await;
    let err = service
        .create_amendment(&fx.holder_a, source.id, MANDATORY)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Forbidden);

    let mandatory = service
        .create_amendment(&fx.officer, source.id, MANDATORY)
        .await
        .unwrap();
    assert_eq!(
        mandatory.plan.status_id,
        PlanStatusCode::MandatoryAmendmentStaff.id()
    );

    let err = service
        .create_amendment(&fx.officer, source.id, 9)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Validation);
}

#[tokio::test]
async fn minor_amendment_stands_once_every_client_confirms() {
    let fx = fixture().await;
    let plan = amendment_awaiting_confirmation(&fx, MINOR).await;
    let coordinator = ConfirmationCoordinator::new(fx.db.clone());

    let summary = coordinator.list(&fx.officer, plan.id).await.unwrap();
    assert_eq!(summary.confirmations.len(), 2);
    assert!(!summary.all_confirmed);

    let row_a = row_for(&summary.confirmations, fx.client_a.id);
    let row_b = row_for(&summary.confirmations, fx.client_b.id);

    let outcome = coordinator
        .confirm(&fx.holder_a, plan.id, row_a.id, true, true)
        .await
        .unwrap();
    assert!(!outcome.all_confirmed);
    assert!(outcome.plan.is_none());

    let outcome = coordinator
        .confirm(&fx.holder_b, plan.id, row_b.id, true, true)
        .await
        .unwrap();
    assert!(outcome.all_confirmed);
    let moved = outcome.plan.expect("plan moved on consensus");
    assert_eq!(moved.status_id, PlanStatusCode::Stands.id());
    assert!(moved.effective_at.is_some());
    assert!(moved.submitted_at.is_some());
}

#[tokio::test]
async fn major_amendment_goes_to_final_decision() {
    let fx = fixture().await;
    let plan = amendment_awaiting_confirmation(&fx, MAJOR).await;
    let coordinator = ConfirmationCoordinator::new(fx.db.clone());
    let rows = coordinator.list(&fx.admin, plan.id).await.unwrap().confirmations;

    // Staff may record a vote on any client's behalf
    coordinator
        .confirm(&fx.officer, plan.id, rows[0].id, true, false)
        .await
        .unwrap();
    let outcome = coordinator
        .confirm(&fx.officer, plan.id, rows[1].id, true, false)
        .await
        .unwrap();

    assert!(outcome.all_confirmed);
    assert_eq!(
        outcome.plan.map(|p| p.status_id),
        Some(PlanStatusCode::SubmittedForFinalDecision.id())
    );
}

#[tokio::test]
async fn votes_are_guarded() {
    let fx = fixture().await;
    let plan = amendment_awaiting_confirmation(&fx, MINOR).await;
    let coordinator = ConfirmationCoordinator::new(fx.db.clone());
    let rows = coordinator.list(&fx.officer, plan.id).await.unwrap().confirmations;
    let row_b = row_for(&rows, fx.client_b.id);

    let err = coordinator
        .confirm(&fx.holder_a, plan.id, row_b.id, true, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Forbidden);

    let err = coordinator
        .confirm(&fx.holder_a, plan.id, 9999, true, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::NotFound);

    let err = coordinator
        .confirm(&fx.outsider, plan.id, row_b.id, true, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Forbidden);

    let other = approved_plan(&fx).await;
    let err = coordinator
        .confirm(&fx.holder_b, other.id, row_b.id, true, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::NotFound);
}

#[tokio::test]
async fn voting_requires_awaiting_confirmation() {
    let fx = fixture().await;
    let source = approved_plan(&fx).await;
    let amendment = PlanService::new(fx.db.clone())
        .create_amendment(&fx.officer, source.id, MINOR)
        .await
        .unwrap();
    let row_a = row_for(&amendment.confirmations, fx.client_a.id);

    let err = ConfirmationCoordinator::new(fx.db.clone())
        .confirm(&fx.holder_a, amendment.plan.id, row_a.id, true, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Validation);
}

#[tokio::test]
async fn requesting_confirmation_resets_votes_and_confirms_the_initiator() {
    let fx = fixture().await;
    let source = approved_plan(&fx).await;
    let amendment = PlanService::new(fx.db.clone())
        .create_amendment(&fx.holder_a, source.id, MINOR)
        .await
        .unwrap();

    let outcome = PlanStateMachine::new(fx.db.clone())
        .transition(
            &fx.holder_a,
            amendment.plan.id,
            &json!(PlanStatusCode::AwaitingConfirmation.id()),
            None,
        )
        .await
        .unwrap();
    assert_eq!(
        outcome.plan.status_id,
        PlanStatusCode::AwaitingConfirmation.id()
    );

    let rows = ConfirmationCoordinator::new(fx.db.clone())
        .list(&fx.holder_a, amendment.plan.id)
        .await
        .unwrap()
        .confirmations;
    assert_eq!(rows.len(), 2);
    assert!(row_for(&rows, fx.client_a.id).confirmed);
    assert!(!row_for(&rows, fx.client_b.id).confirmed);
}

#[tokio::test]
async fn linking_a_client_mid_vote_reopens_consensus() {
    let fx = fixture().await;
    let plan = amendment_awaiting_confirmation(&fx, MINOR).await;
    let coordinator = ConfirmationCoordinator::new(fx.db.clone());
    let rows = coordinator.list(&fx.officer, plan.id).await.unwrap().confirmations;
    let row_a = row_for(&rows, fx.client_a.id);
    coordinator
        .confirm(&fx.holder_a, plan.id, row_a.id, true, true)
        .await
        .unwrap();

    // Drop B so the remaining vote is unanimous without moving the plan
    let memberships = MembershipService::new(fx.db.clone());
    let change = memberships
        .unlink_client(&fx.officer, fx.agreement.id, fx.client_b.id)
        .await
        .unwrap();
    assert_eq!(change.plans.len(), 1);
    assert!(change.plans[0].all_confirmed);
    assert!(ConfirmationCoordinator::all_confirmed(&fx.db, plan.id)
        .await
        .unwrap());

    let newcomer = create_client(&fx.db, "Ranch D").await;
    let change = memberships
        .link_client(&fx.officer, fx.agreement.id, newcomer.id, 1)
        .await
        .unwrap();
    assert_eq!(change.plans.len(), 1);
    assert!(!change.plans[0].all_confirmed);

    let summary = coordinator.list(&fx.officer, plan.id).await.unwrap();
    assert_eq!(summary.confirmations.len(), 2);
    assert!(row_for(&summary.confirmations, fx.client_a.id).confirmed);
    assert!(!row_for(&summary.confirmations, newcomer.id).confirmed);

    let head = plans::Entity::find_by_id(plan.id)
        .one(&fx.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(head.status_id, PlanStatusCode::AwaitingConfirmation.id());
}

#[tokio::test]
async fn unlinking_removes_only_that_clients_row() {
    let fx = fixture().await;
    let plan = amendment_awaiting_confirmation(&fx, MINOR).await;
    let coordinator = ConfirmationCoordinator::new(fx.db.clone());
    let rows = coordinator.list(&fx.officer, plan.id).await.unwrap().confirmations;
    coordinator
        .confirm(&fx.holder_a, plan.id, row_for(&rows, fx.client_a.id).id, true, true)
        .await
        .unwrap();

    MembershipService::new(fx.db.clone())
        .unlink_client(&fx.officer, fx.agreement.id, fx.client_b.id)
        .await
        .unwrap();

    let summary = coordinator.list(&fx.officer, plan.id).await.unwrap();
    assert_eq!(summary.confirmations.len(), 1);
    assert_eq!(summary.confirmations[0].client_id, fx.client_a.id);
    assert!(summary.confirmations[0].confirmed);
    assert!(summary.all_confirmed);
}

#[tokio::test]
async fn membership_changes_are_staff_only_and_checked() {
    let fx = fixture().await;
    let memberships = MembershipService::new(fx.db.clone());

    let err = memberships
        .link_client(&fx.holder_a, fx.agreement.id, fx.client_b.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Forbidden);

    let err = memberships
        .link_client(&fx.officer, fx.agreement.id, fx.client_b.id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::Conflict);

    let newcomer = create_client(&fx.db, "Ranch D").await;
    let err = memberships
        .unlink_client(&fx.officer, fx.agreement.id, newcomer.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), CoreErrorKind::NotFound);

    let change = memberships
        .link_client(&fx.admin, fx.agreement.id, newcomer.id, 2)
        .await
        .unwrap();
    assert!(change.plans.is_empty());
}
