pub mod aggregator;
pub mod controller;
