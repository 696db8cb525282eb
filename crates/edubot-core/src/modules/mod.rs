pub mod config;
pub mod logger;
pub mod token;

pub use token::issue_token;
