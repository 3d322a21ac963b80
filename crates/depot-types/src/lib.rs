//! Foundation types for Depot.
//!
//! Every large object Depot stores is addressed by the SHA-256 digest of its
//! content. This crate provides the identifier and the pointer that pairs it
//! with the declared object size.
//!
//! # Key Types
//!
//! - [`Oid`] -- Content-addressed identifier (SHA-256, lowercase hex on the wire)
//! - [`Pointer`] -- Oid plus declared size, the unit callers use to address objects
//! - [`OidHasher`] -- Incremental hasher producing an [`Oid`]

pub mod error;
pub mod hasher;
pub mod oid;
pub mod pointer;

pub use error::TypeError;
pub use hasher::OidHasher;
pub use oid::Oid;
pub use pointer::Pointer;
