pub mod contact;
pub mod content;
pub mod error;
pub mod normalize;
pub mod reviews;
