pub mod app;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod output;
pub mod rate;
pub mod scoring;

pub use app::{App, Results};
pub use error::{IncompleteSubmissionError, PersistenceError, SubmitError, ValidationError};
