//! Core runtime for getAir SmartControl systems: the polling
//! coordinator, the published snapshot model, and the entity adapter
//! layer that front-ends render.
//!
//! One [`Coordinator`] serves one device. It keeps the cloud session
//! alive (reconnect policy lives here, not in the session), polls on a
//! fixed interval, and publishes immutable [`Snapshot`]s through a
//! watch channel. Entity adapters are stateless views over those
//! snapshots; writes route back through the coordinator.

pub mod coordinator;
pub mod entity;
mod error;
mod retry;
mod snapshot;

pub use coordinator::{ConnectionState, Coordinator, CoordinatorConfig, DEFAULT_POLLING_INTERVAL};
pub use error::CoreError;
pub use retry::RetryPolicy;
pub use snapshot::{Snapshot, SystemData, TimeProfile, ZoneData, ZoneIndex};
