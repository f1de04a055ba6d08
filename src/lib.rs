//! Authoritative DNS zone management: zone files as the source of truth,
//! with typed record editing and inbound AXFR transfers on top.

pub mod config;
pub mod dns;
pub mod error;
pub mod ops;
pub mod rdata;
pub mod transfer;
pub mod zone;

pub use config::ZoneConfig;
pub use error::{ErrorKind, Result, ZoneCraftError};
