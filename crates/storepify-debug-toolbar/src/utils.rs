//! Helpers shared by panels

pub mod sql_normalization;
