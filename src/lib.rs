//! aqi-dashboard library crate

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod assemble;
pub mod extract;
pub mod feed_service;
pub mod fs;
pub mod options;
pub mod pipeline;
pub mod render;
pub mod reporting;
pub mod secrets;
