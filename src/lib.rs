//! Control plane for driving fault-injection experiments against a fleet of
//! physical machines.
//!
//! Two subsystems carry the interesting work: the attack executor
//! ([`managers::attack`]), which injects and removes faults by calling each
//! target's remote chaos agent over HTTP, and the credential-scoped client
//! pool ([`services::clientpool`]), which multiplexes per-token cluster API
//! clients for untrusted callers behind a bounded cache.

pub mod app;
pub mod constants;
pub mod errors;
pub mod experiment;
pub mod managers;
pub mod services;
pub mod utils;
