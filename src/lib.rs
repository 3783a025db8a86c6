//! `hashid-rs` attaches reversible integer-to-string identifier obfuscation
//! ("hashids") to application entities, plus identifier-based lookup over a
//! narrow storage boundary.
//!
//! This library is primarily designed to hide raw database IDs in your API
//! and URLs, transforming them into short, URL-safe tokens. The tokens are
//! keyed by a per-entity salt, so IDs of different object types do not
//! decode into each other, and sequential database keys are not exposed to
//! enumeration by eyeball. The actual encode/decode math is delegated to
//! the hashids algorithm (the `harsh` crate); this library adds the
//! per-entity configuration registry, the object identifier scheme and the
//! lookup plumbing around it.
//!
//! Note that hashids is obfuscation, not encryption: a determined party can
//! recover keys from tokens. Do not use the tokens as an access control
//! mechanism. Rotating a salt invalidates every previously issued token for
//! the hash keys using it.
//!
//! Two addressing schemes are provided:
//! - a **hash token**: the direct encoding of the primary key, and
//! - an **object identifier** in the manner of Stripe's API: an entity
//!   prefix and a base36 creation timestamp followed by the hash token,
//!   for externally stable, human-debuggable identifiers such as
//!   `order_4djiyj08pogXq3kZm9a`.
//!
//! # Usage
//!
//! ## Entity facade
//!
//! Build one [`EntityCodec`] per entity type, with all per-type settings
//! resolved explicitly up front:
//!
//! ```
//! use std::sync::Arc;
//! use hashid_rs::{Config, EntityCodec, Identify, Registry};
//!
//! struct Order {
//!     id: i64,
//!     created_at: Option<i64>,
//! }
//!
//! impl Identify for Order {
//!     fn key(&self) -> i64 { self.id }
//!     fn created_at(&self) -> Option<i64> { self.created_at }
//! }
//!
//! let registry = Arc::new(Registry::new(Config::new("s3cr3t")));
//! let orders = EntityCodec::builder("Order").build(registry).unwrap();
//!
//! let order = Order { id: 42, created_at: Some(1_600_000_000) };
//! let object_id = orders.object_id(&order).unwrap();
//! assert!(object_id.starts_with("order_"));
//! assert_eq!(orders.object_id_to_key(&object_id), Some(42));
//! ```
//!
//! ## Low level API
//!
//! [`Registry`] provides a simple API to encode and decode integers under a
//! hash key:
//!
//! ```
//! use hashid_rs::{Config, Registry};
//!
//! let registry = Registry::new(Config::new("s3cr3t"));
//! let token = registry.id_to_hash(42, "Order").unwrap();
//! assert!(token.len() >= 8);
//! assert_eq!(registry.hash_to_id(&token, "Order"), Some(42));
//!
//! // Decoding under a different hash key is not expected to round-trip.
//! assert_ne!(registry.hash_to_id("not a token", "Order"), Some(42));
//! ```
//!
//! ## Typed `Field` API
//!
//! The generic [`Field`] type encodes automatically with Serde and maps to
//! Diesel BigInt columns; see its documentation for an example.

mod config;
mod entity;
mod field;
mod registry;

pub use config::{Config, ConfigError, DEFAULT_ALPHABET, DEFAULT_MIN_LENGTH};
pub use entity::{EntityCodec, EntityCodecBuilder, Identify, Store};
pub use field::{Field, TypeMarker};
pub use registry::{Error, Registry};
