pub mod aggregate;
pub mod alerts;
pub mod branding;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod generator;
pub mod logging;
pub mod model;
pub mod opportunities;
pub mod session;
pub mod view;
