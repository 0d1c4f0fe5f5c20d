//! Project integration tests

mod common;

mod admin_store_tests;
mod routing_tests;
