#![forbid(unsafe_code)]
//! trackboard-core: the data side of the trackboard dashboard.
//!
//! The filter-aggregate-render cycle lives here: [`store`] holds the loaded
//! issues, [`filter`] the per-domain constraints, [`aggregate`] turns a
//! filtered slice into distributions and control-chart series, and
//! [`session::Dashboard`] ties them to chart slots in [`chart`].
//!
//! # Conventions
//!
//! - **Errors**: library functions return [`error::Result`]; binaries wrap
//!   them in `anyhow`.
//! - **Logging**: `tracing` macros only; the binary installs the subscriber.

pub mod aggregate;
pub mod chart;
pub mod config;
pub mod epics;
pub mod error;
pub mod filter;
pub mod gantt;
pub mod model;
pub mod session;
pub mod stats;
pub mod store;
pub mod table;
pub mod timing;
