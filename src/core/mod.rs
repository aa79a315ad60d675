pub mod params;
pub mod shock;
pub mod stats;
