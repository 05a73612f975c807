//! Domain types shared by the SkillSession storage adapters and HTTP API.
//!
//! Nothing in this crate touches storage or the network. It holds the error
//! taxonomy, request/response models, and the two pieces of real logic: how an
//! availability window is cut into slots, and when a slot counts as expired.

pub mod errors;
pub mod models;
pub mod slotting;
