pub mod config;
pub mod errors;
pub mod history;

pub use errors::{ApplicationError, InterfaceError};
pub use history::RequestHistory;
