pub mod error;
pub mod format;
pub mod outcome;
pub mod state;
