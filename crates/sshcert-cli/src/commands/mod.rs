//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`issue`] - Issue a certificate unconditionally
//! - [`refresh`] - Re-evaluate renewal of a recorded certificate
//! - [`plan`] - Compare configuration and record
//! - [`apply`] - Execute a plan
//! - [`inspect`] - Show the fields of a recorded certificate

pub mod apply;
pub mod inspect;
pub mod issue;
pub mod plan;
pub mod refresh;

pub use apply::ApplyCommand;
pub use inspect::InspectCommand;
pub use issue::IssueCommand;
pub use plan::PlanCommand;
pub use refresh::RefreshCommand;
