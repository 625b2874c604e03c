//! Admin console for hosted chatbot widget configurations.
//!
//! The library holds every layer below the command line: configuration,
//! the persisted session, the admin API client, the client registry, the
//! form engine, and the [`console::Console`] that ties them together.

pub mod activity;
pub mod api;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod form;
pub mod model;
pub mod registry;
pub mod session;
