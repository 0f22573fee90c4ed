pub mod auth;
pub mod ext_authz;
pub mod user;

pub use auth::{
    LoginRequest, LoginResponse, LogoutRequest, LogoutResponse, WhoamiRequest, WhoamiResponse,
};
pub use ext_authz::CheckRequestBody;
pub use user::{GetUserRequest, GetUserResponse, RegisterRequest, RegisterResponse};
