/// Authentication endpoints: login, register, refresh, logout, me.
pub mod auth;
/// User administration endpoints.
pub mod users;
