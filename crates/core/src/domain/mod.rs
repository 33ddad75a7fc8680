pub mod contract;
pub mod strategy;
