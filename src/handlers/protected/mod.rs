// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Security Level: JWT Authentication Required
// Route Prefix: /c/*
// Middleware: jwt_auth_middleware injects AuthUser into request extensions

pub mod book;

pub use book::*;
