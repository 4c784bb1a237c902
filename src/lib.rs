pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use engine::{PayoutEngine, PayoutRun};
pub use error::{ReportError, Result};
