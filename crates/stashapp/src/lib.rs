//! # Stash Architecture
//!
//! Stash is an **in-memory media library backend**: folders, media items,
//! collections, tags with categories and users, kept referentially consistent
//! behind one query and mutation surface. It stands in for a real data service
//! during UI development and tests. Nothing is persisted; the store starts from
//! a seed snapshot every time.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Clients (the `stash` CLI, tests, embedding hosts)          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Fault harness before every operation (faults.rs)         │
//! │  - Input normalization (page size bounds, tag keys)         │
//! │  - Envelopes with request ids (envelope.rs)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Existence checks, cascades, usage guards, tag counters   │
//! │  - Uses the query engine (query.rs, attributes/)            │
//! │    and the hierarchy builder (hierarchy.rs)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - DataStore trait, one Table per entity                    │
//! │  - MemoryStore seeded from fixtures/seed.json               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O in the Core
//!
//! From `api.rs` inward, code takes Rust values and returns Rust values. It
//! never prints and never exits. The only I/O is reading configuration and an
//! optional seed file during [`init::initialize`], and the sleeps of the fault
//! harness.
//!
//! ## Testing Strategy
//!
//! 1. **Commands**: the bulk of the tests, each against a fresh store built
//!    with `StoreFixture`.
//! 2. **API**: dispatch, envelopes, page bounds and fault handling.
//! 3. **Integration** (`tests/`): cross-entity properties over the seed data.
//! 4. **CLI**: end-to-end runs of the `stash` binary.
//!
//! ## Module Overview
//!
//! - [`api`]: the facade, entry point for all operations
//! - [`commands`]: per-entity business logic
//! - [`query`] and [`attributes`]: filtering, search, sorting, pagination
//! - [`hierarchy`]: trees over parent-pointer records
//! - [`store`]: tables, the in-memory store and the seed snapshot
//! - [`model`]: entity types
//! - [`tags`]: tag name rules and counter bookkeeping
//! - [`envelope`], [`faults`]: response wrapping and simulated outages
//! - [`config`], [`init`]: configuration and context setup
//! - [`error`]: error type and codes

pub mod api;
pub mod attributes;
pub mod commands;
pub mod config;
pub mod envelope;
pub mod error;
pub mod faults;
pub mod hierarchy;
pub mod init;
pub mod model;
pub mod query;
pub mod store;
pub mod tags;
