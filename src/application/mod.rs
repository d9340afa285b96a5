pub mod contact;
pub mod content;
pub mod error;
pub mod reviews;
