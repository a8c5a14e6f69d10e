pub mod client;
pub mod extract;
pub mod retry;

pub use client::{PredictClient, PredictError, PredictRequest, Upload};
pub use extract::{extract_reply, FALLBACK_NO_REPLY, FALLBACK_UPSTREAM};
pub use retry::RetryPolicy;
