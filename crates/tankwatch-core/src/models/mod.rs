//! Data models for tankwatch

pub mod entity;
pub mod permission;
pub mod reading;

pub use entity::{Generator, GeneratorStatus, SeedData, Tank, TankKind};
pub use permission::{Grants, Permission, Role, SiteUser, has_permission};
pub use reading::{EntityKind, HistoryRecord, Reading, clamp_level};
