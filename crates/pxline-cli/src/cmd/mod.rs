pub mod fetch;
pub mod metadata;
pub mod output;
pub mod snapshot;
