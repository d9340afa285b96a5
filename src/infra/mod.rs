pub mod content_store;
pub mod email;
pub mod error;
pub mod google;
pub mod http;
pub mod telemetry;
pub mod uploads;
