//! Koku API client for hansei.
//!
//! Wraps the Koku REST API with token authentication, typed customer, user,
//! provider and preference resources, and [`ReportSession`]s that fetch a
//! report and validate it against its summary block.
//!
//! # Example
//!
//! ```no_run
//! use hansei_client::{HanseiConfig, KokuClient, ReportSession};
//! use hansei_core::ReportQuery;
//!
//! # async fn example() -> Result<(), hansei_client::ClientError> {
//! let config = HanseiConfig::load()?;
//! let mut client = KokuClient::from_config(&config.koku)?;
//! let (username, password) = config.report_credentials();
//! client.login(username, password).await?;
//!
//! let mut costs = ReportSession::cost(client);
//! costs
//!     .get(&ReportQuery::new().group_by("account", "*"))
//!     .await?;
//!
//! let check = costs.check(config.reports.deviation()?);
//! println!("cost report: {check}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod config;
pub mod error;
pub mod fixtures;
pub mod report;
pub mod resources;
pub mod types;

pub use client::{ClientOptions, KokuClient};
pub use config::{ConfigError, HanseiConfig, KokuConfig, ProviderConfig, ReportsConfig};
pub use error::ClientError;
pub use report::{ReportSession, Transport};
pub use types::*;
