//! pxline core - shared infrastructure for PX-Web extraction pipelines
//!
//! HTTP client and runtime bridge, logging setup, and progress reporting
//! used by the pipeline crate and the CLI.

pub mod http;
pub mod logging;
pub mod progress;

// Re-exports for convenience
pub use http::{
    HttpConfig, HttpError, SHARED_RUNTIME, get_json, http_client, http_config, post_json,
    set_http_config,
};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_bytes, fmt_num};
