pub mod belief;
pub mod chooser;
pub mod game;
pub mod nash;
pub mod population;
pub mod repeated;
pub mod strategy;
