pub mod clientpool;
pub mod cluster;
pub mod logger;
