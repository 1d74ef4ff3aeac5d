//! Infrastructure layer for external integrations.
//!
//! Implements the storage contract defined by the domain layer against the
//! concrete physical backends.
//!
//! # Modules
//!
//! - [`persistence`] - storage adapter implementations

pub mod persistence;
