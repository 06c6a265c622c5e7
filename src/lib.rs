//! A terminal octopus to look after.
//!
//! The library holds the pet's well-being model and everything needed to keep
//! it alive between runs: the transition rules (`sim`), the persisted store
//! (`storage`), the idle-decay timer (`scheduler`) and the `session` that ties
//! them together for a front-end.

pub mod chat;
pub mod config;
pub mod logging;
pub mod model;
pub mod scheduler;
pub mod session;
pub mod sim;
pub mod storage;
