//! The store: collections, products, customers and orders

pub mod admin;
pub mod models;
pub mod urls;
pub mod views;

pub use models::StoreModels;
