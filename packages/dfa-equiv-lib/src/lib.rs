pub mod automaton;
pub mod batch;
pub mod config;
pub mod input;
pub mod logger;
pub mod output;
pub mod random;
pub mod validation;
