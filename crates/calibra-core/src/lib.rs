pub mod compat;
pub mod config;
pub mod consts;
pub mod error;
pub mod frame;
pub mod job;
pub mod methods;
pub mod presets;
pub mod progress;
pub mod remote;
pub mod review;
pub mod settings;
pub mod upload;
pub mod workflow;
