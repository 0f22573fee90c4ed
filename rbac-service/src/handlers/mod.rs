pub mod health;
pub mod permission;
pub mod role;
pub mod user_role;
