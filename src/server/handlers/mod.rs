pub mod actor;
pub mod confirmations;
pub mod error;
pub mod health;
pub mod memberships;
pub mod plans;
pub mod snapshots;
