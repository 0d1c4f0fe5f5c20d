//! Project configuration: settings, logging and the root route table

pub mod logging;
pub mod settings;
pub mod sources;
pub mod urls;
