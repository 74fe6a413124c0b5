//! # Pathhound: batch reporting over a directory attack graph
//!
//! Pathhound runs a list of jobs against a BloodHound-style graph
//! (identities, computers and groups as nodes; privilege and control
//! relationships as edges) and writes each job's result as a report.
//!
//! ## Pipeline
//!
//! - [`tasks::build`] turns the selected input mode into an ordered list of [`Job`]s
//! - [`JobRunner`] executes them in order against a [`GraphSession`], containing failures per job
//! - [`PathAnalyzer`] finds attack paths, their load-bearing relationships and the busiest paths
//! - [`ResultDeliverer`] writes each result as text, CSV, HTML or JSON
//! - [`ReportIndexer`] and [`ReportArchiver`] summarize and bundle the batch so far
//!
//! ## Quick Start
//!
//! ```no_run
//! use pathhound::config::{Conventions, SessionConfig, TaskConfig};
//! use pathhound::deliver::{HtmlTemplate, ResultDeliverer};
//! use pathhound::{HttpSession, JobRunner, tasks};
//!
//! let session = HttpSession::connect(SessionConfig::default())?;
//! let built = tasks::build(&TaskConfig { easy: true, ..TaskConfig::default() })?;
//!
//! let conventions = Conventions::default();
//! let deliverer = ResultDeliverer::to_stdout("reports", HtmlTemplate::default());
//! let outcome = JobRunner::new(&session, &conventions, deliverer).run(&built.jobs);
//! println!("{} of {} jobs completed", outcome.delivered(), outcome.attempted());
//! # Ok::<(), pathhound::Error>(())
//! ```

pub mod analyzer;
pub mod config;
pub mod deliver;
pub mod error;
pub mod job;
pub mod manifest;
pub mod report;
pub mod result;
pub mod runner;
pub mod session;
pub mod tasks;

pub use analyzer::{AnalysisError, PathAnalyzer, PathResult};
pub use deliver::{DeliveryError, ResultDeliverer};
pub use error::{Error, JobError, JobFailure, Result};
pub use job::{BusiestMode, Job, JobKind, NodeClass, NodeSelector, OutputFormat};
pub use manifest::{BatchManifest, ManifestEntry};
pub use report::{ReportArchiver, ReportIndexer};
pub use result::{JobResult, TabularResult};
pub use runner::{BatchOutcome, JobOutcome, JobRunner};
pub use session::{FixtureSession, GraphSession, HttpSession, QueryResult, SessionError};
