#[cfg(feature = "use_env_logger")]
pub mod env_logger;
#[cfg(feature = "use_tracing_subscriber")]
pub mod tracing;
