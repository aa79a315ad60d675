pub mod planner;
pub mod request;
