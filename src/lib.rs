pub mod client;
pub mod clients;
pub mod config;
pub mod error;
pub mod guide;
pub mod http;
pub mod markdown;
pub mod page;
pub mod prompts;
pub mod server;
pub mod store;

pub use error::{Result, StudyGuideError};

