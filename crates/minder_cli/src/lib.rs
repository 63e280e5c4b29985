pub mod cli;
pub mod output;
pub mod runtime;
pub mod session;
