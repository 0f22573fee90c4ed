//! Method tables for `auth.v1`.

use service_core::grpc::MethodRule;

pub const LOGIN: &str = "/auth.v1.AuthService/Login";
pub const LOGOUT: &str = "/auth.v1.AuthService/Logout";
pub const WHOAMI: &str = "/auth.v1.AuthService/Whoami";
pub const EXT_AUTHZ_CHECK: &str = "/envoy.service.auth.v3.Authorization/Check";

pub const REGISTER: &str = "/auth.v1.UserService/Register";
pub const GET_USER: &str = "/auth.v1.UserService/GetUser";

/// Session RPCs and sign-up run before a caller identity exists.
pub const METHODS: &[MethodRule] = &[
    MethodRule::public(LOGIN),
    MethodRule::public(LOGOUT),
    MethodRule::public(WHOAMI),
    MethodRule::public(REGISTER),
    MethodRule::authenticated(GET_USER),
];
