//! SeaORM entities for the HR schema.

pub mod department;
pub mod role;
pub mod user;
