//! llmprobe - Provider probing for LLM HTTP APIs.
//!
//! Builds requests from declarative provider definitions, executes them
//! directly or through a relay, and normalizes whatever comes back into
//! text, model catalogs, token usage, and cost estimates.

#![deny(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod core;
pub mod error;
pub mod render;
pub mod storage;
pub mod util;

pub use error::{ErrorKind, ExitCode, ProbeError, Result};
