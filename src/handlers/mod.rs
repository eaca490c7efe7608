// src/handlers/mod.rs

pub mod auth;
pub mod category;
pub mod comment;
pub mod post;
pub mod pricing;
