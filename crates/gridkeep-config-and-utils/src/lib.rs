//! Configuration, paths, and logging for GridKeep.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level, CentralLogWriter, LogConfig, WriterFactory};
pub use paths::Paths;
