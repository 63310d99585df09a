//! # playerwarps - Player Warp Registry
//!
//! Players register named warps that other players can teleport to. This crate
//! is the authoritative registry behind that feature: it owns the warp records,
//! enforces per-owner name uniqueness, charges for creation through the host
//! economy, keeps per-owner ban lists, and ranks warps by hourly deduplicated
//! visits.
//!
//! ## Features
//!
//! - **Warp Registry**: create, rename, relocate, transfer and delete warps with
//!   write-through persistence; a failed write never leaves memory ahead of storage.
//! - **Access Policy**: owner-scoped bans and a ground-presence safety check,
//!   each with its own bypass capability.
//! - **Popularity**: each player counts once per warp per period (one hour by
//!   default); periods align to UTC wall-clock boundaries.
//! - **Persistence**: sled-backed store with schema-versioned bincode records,
//!   or an in-memory store for embedding and tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use playerwarps::warps::{SledWarpStore, WarpRegistry};
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = SledWarpStore::open("data/warps")?;
//!     let registry = WarpRegistry::open(store)?;
//!     for warp in registry.ranked() {
//!         println!("{} ({} visits)", warp.name(), warp.visits());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`warps`] - registry, entity model, bans, visits, policy and storage
//! - [`config`] - TOML configuration
//! - [`logutil`] - single-line log escaping for player-supplied text
//!
//! The host game server supplies the economy, permission, player directory and
//! world collaborators by implementing the traits in [`warps::ports`].

pub mod config;
pub mod logutil;
pub mod warps;
