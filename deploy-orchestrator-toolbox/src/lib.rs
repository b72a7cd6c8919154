//! DNS-over-HTTPS propagation checks for the deploy orchestrator.
//!
//! [`PropagationChecker`] asks several independent public resolvers the same question
//! at once and reports whether all of them already see the expected answer.
//!
//! ```rust,no_run
//! use deploy_orchestrator_toolbox::{DnsQueryType, PropagationChecker};
//! # async fn demo() -> deploy_orchestrator_toolbox::ToolboxResult<()> {
//! let checker = PropagationChecker::new();
//! let verdict = checker
//!     .check_propagation("example.com", DnsQueryType::A, Some("192.0.2.1"))
//!     .await?;
//! println!("propagated: {}", verdict.propagated);
//! # Ok(())
//! # }
//! ```

mod error;
mod services;
mod types;

pub use error::{ToolboxError, ToolboxResult};
pub use services::PropagationChecker;
pub use types::{
    DnsQueryType, DohResolver, PropagationCheckResult, PropagationVerdict, DEFAULT_TIMEOUT_SECS,
};
