pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod grouping;
pub mod media;
pub mod model;
pub mod progress;
pub mod retention;
pub mod scanner;
pub mod scheduler;
pub mod storage;

pub use crate::config::AppConfig;
pub use cancel::CancellationToken;
pub use engine::{Pipeline, RunResult};
pub use error::Error;
pub use executor::{MotionPhoto, Transformer};
pub use model::CandidateFile;
pub use progress::{ProgressReporter, SilentReporter};
