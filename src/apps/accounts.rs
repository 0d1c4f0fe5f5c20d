//! Users, password hashing and JWT authentication under `/auth`

pub mod error;
pub mod hashers;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod urls;
pub mod views;

pub use error::AuthError;
pub use jwt::{Claims, JwtAuth, TokenPair, TokenType};
pub use middleware::JwtAuthenticationMiddleware;
pub use models::{NewUser, User};
