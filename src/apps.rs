//! Project applications

pub mod accounts;
pub mod playground;
pub mod store;
