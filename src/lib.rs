pub mod checker;
pub mod cli;
pub mod fixture;
pub mod format;
pub mod report;

pub use checker::run;
