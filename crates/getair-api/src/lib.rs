//! Client for the getAir SmartControl cloud API.
//!
//! The cloud exposes one document per ventilation system: a `system`
//! map of named properties plus up to three `zones`, each another map
//! of named properties. This crate covers the full session lifecycle —
//! token grant against the auth endpoint, the on-disk credentials file
//! the cloud backend re-reads during token refresh, device document
//! fetch/push, and staged property writes with wire-name fallback.
//!
//! [`ApiClient`] is the surface integrations should hold: it owns at
//! most one [`CloudSession`], brokers connect/reconnect, and never
//! propagates lookup errors (callers poll and degrade instead).

mod auth;
mod client;
mod credentials;
mod device;
mod error;
pub mod properties;

pub use auth::{Credentials, DEFAULT_CLIENT_ID, SessionToken};
pub use client::{ApiClient, CloudSession, DeviceSummary};
pub use credentials::{CREDENTIALS_FILE_NAME, CredentialStore};
pub use device::{Device, DeviceDocument, ZONE_COUNT};
pub use error::Error;
