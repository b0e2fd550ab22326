pub mod scoring;
pub mod statistics;
