pub mod jwt;
pub mod strategy;

pub use jwt::{JwtClaims, JwtStrategy};
pub use strategy::{AuthRegistry, AuthStrategy, Credentials, QueryParamStrategy};
