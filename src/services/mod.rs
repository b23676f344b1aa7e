pub mod access_gate;
pub mod confirmation_coordinator;
pub mod legal_window;
pub mod membership_service;
pub mod plan_report_service;
pub mod plan_service;
pub mod plan_state_machine;
pub mod privacy_view;
pub mod snapshot_store;
pub mod status_history_service;

pub use access_gate::AccessGate;
pub use confirmation_coordinator::ConfirmationCoordinator;
pub use legal_window::LegalWindowResolver;
pub use membership_service::MembershipService;
pub use plan_report_service::PlanReportService;
pub use plan_service::PlanService;
pub use plan_state_machine::PlanStateMachine;
pub use privacy_view::PrivacyViewResolver;
pub use snapshot_store::SnapshotStore;
pub use status_history_service::StatusHistoryService;
