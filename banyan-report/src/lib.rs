//! CSP violation reporting for banyan-shield.
//!
//! [`CspReportController`] serves the endpoint named in the policies'
//! `report-uri`. Accepted reports are logged at `WARN` and handed to a
//! [`ReportForwarder`], which pushes them to the configured sinks on a
//! background task:
//!
//! - [`HttpLogSink`] posts JSON to an external log collector
//! - [`SentrySink`] posts the raw report to a Sentry project's security endpoint
//!
//! # Example
//!
//! ```
//! use banyan_core::{HttpRequest, RuntimeMode};
//! use banyan_report::{CspReportController, ReportForwarder};
//!
//! let controller = CspReportController::new(RuntimeMode::Development, ReportForwarder::new());
//! let response = controller
//!     .handle(&HttpRequest::new("GET", "/api/csp-report"))
//!     .unwrap();
//! assert_eq!(response.status, 200);
//! ```

pub mod controller;
pub mod error;
pub mod forwarder;
pub mod sentry;
pub mod sink;

pub use controller::{CspReportController, DEFAULT_MAX_REPORT_BYTES, REPORT_PATH};
pub use error::{ReportError, ReportResult};
pub use forwarder::{ForwardOutcome, ReportForwarder};
pub use sentry::{SentryDsn, SentrySink};
pub use sink::{ForwardedViolation, HttpLogSink, ViolationSink};
