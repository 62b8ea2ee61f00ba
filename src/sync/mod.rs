//! Relationship synchronizer: diffing, membership mutators and the
//! transactional orchestrator that ties them together.

pub mod diff;
pub mod error;
pub mod mutators;
pub mod orchestrator;
pub mod payload;

pub use diff::{diff, Diff};
pub use error::SyncError;
pub use orchestrator::{Phase, Synchronizer};
pub use payload::{NewResource, ResourcePatch, StreamMembershipChange};
