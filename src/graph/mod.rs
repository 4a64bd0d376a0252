pub mod chain;
pub mod cycle;
