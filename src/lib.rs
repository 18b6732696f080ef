pub mod config;
pub mod data_loader;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod label;
pub mod model_selection;
pub mod pipeline;
pub mod split;
pub mod svm;
pub mod synthetic;
pub mod types;
pub mod util;
pub mod visualization;

pub use config::JudgerConfig;
pub use error::{JudgerError, Result};
