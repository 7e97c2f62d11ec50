pub mod assistant;
pub mod persistence;
pub mod vacancy;
