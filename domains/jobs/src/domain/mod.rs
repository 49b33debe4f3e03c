//! Domain layer for Jobs

pub mod entities;
pub mod references;
pub mod state;
