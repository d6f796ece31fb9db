pub mod aggregation;
pub mod angle;
pub mod config;
pub mod covariance;
pub mod error;
pub mod field;
pub mod influence;
pub mod play;
pub mod raster;
