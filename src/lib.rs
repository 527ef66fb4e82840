//! Command line front end for the Thales decoders, plus the pieces it is
//! built from: config, reports, the session log and the fitting-service
//! seam.
//!
//! A fitting service is supplied by the caller as a [`FitService`]
//! implementation; [`fit`] hands it a [`FitJob`] and decodes the answer.

pub mod cli;
pub mod config;
pub mod fitting;
pub mod log;
pub mod report;

pub use config::{AppConfig, ConfigError, OutputFormat};
pub use fitting::{fit, FilePart, FitJob, FitOutcome, FitResponse, FitService, FitServiceError};
pub use crate::log::SessionLog;
pub use report::Report;
