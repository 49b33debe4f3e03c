//! Domain layer for Repositories

pub mod endpoints;
pub mod entities;
