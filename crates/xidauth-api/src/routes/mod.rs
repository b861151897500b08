//! # Route Modules

pub mod auth;
