//! vietsent Server
//!
//! Classification service, HTTP API with the embedded web UI, the `vietsent`
//! command line and the offline evaluation run.

pub mod cli;
pub mod config;
pub mod evaluate;
pub mod metrics;
pub mod server;
pub mod service;

pub use config::{ServerConfig, ServiceConfig};
pub use evaluate::{run_evaluation, EvaluationReport};
pub use server::{build_router, run_server, AppState};
pub use service::{build_analyzer, build_service, ClassificationService, Classified, ClassifyError};
