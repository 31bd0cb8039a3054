//! Multi-step job-application registration wizard.
//!
//! The [`workflows::registration`] module holds the wizard controller, the declarative step
//! schema, and the submission pipeline that forwards a completed application to the
//! configured webhook endpoints.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
