pub mod agreements;
pub mod amendment_types;
pub mod client_memberships;
pub mod clients;
pub mod pastures;
pub mod plan_confirmations;
pub mod plan_snapshots;
pub mod plan_status_history;
pub mod plan_statuses;
pub mod plans;
pub mod users;
pub mod zones;
