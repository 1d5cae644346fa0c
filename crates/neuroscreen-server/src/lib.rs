//! NeuroScreen Server - web service and CLI plumbing.
//!
//! The `neuroscreen` binary wires these together; they are exposed as a
//! library so the router can be driven in tests without binding a port.

pub mod config;
pub mod http;
pub mod output;
pub mod state;
