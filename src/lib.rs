//! threadline is a terminal client for a thread-based chat backend.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] talks to the backend: authentication, threads, history, web
//!   search, uploads and the chunked chat stream.
//! - [`core`] owns the session store, configuration, the transcript and the
//!   chat view-model that reconciles streamed replies into it.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop.
//! - [`cli`] parses arguments and dispatches subcommands.
//!
//! The binary (`src/main.rs`) only calls [`cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
