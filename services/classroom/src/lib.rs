//! Sahayak Classroom Service
//!
//! Hosts session state for the teaching assistant outside of any model
//! runtime: configuration, the in-memory session store, and replay of scripted
//! interaction events. The `classroom` binary is a thin wrapper around this
//! library.

pub mod config;
pub mod script;
pub mod store;
