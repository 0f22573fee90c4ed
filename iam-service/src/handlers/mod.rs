pub mod auth;
pub mod ext_authz;
pub mod health;
pub mod user;
