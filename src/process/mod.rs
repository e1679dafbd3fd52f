pub mod process;
pub mod report;
pub mod simulator;
pub mod weights;
