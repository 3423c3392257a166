pub mod cli;
pub mod control;
pub mod hotreload;
pub mod sources;
