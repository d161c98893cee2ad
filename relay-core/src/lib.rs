pub mod config;
pub mod fetch;
pub mod infer;
pub mod job;
pub mod probe;

mod error;

pub use config::Config;
pub use error::Error;
pub use fetch::fetch_asset;
pub use infer::{InferenceClient, RetryPolicy};
pub use job::{JobInput, Worker};
pub use probe::wait_for_service;
