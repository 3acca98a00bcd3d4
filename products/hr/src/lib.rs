//! HR vertical slice.
//!
//! Services here own every database access for users, roles and departments.
//! Handlers pass in a [`Visibility`] derived from the request's access grant;
//! the services apply it as a query filter and never decide access themselves.

pub mod departments;
pub mod error;
pub mod identity;
pub mod passwords;
pub mod roles;
pub mod seed;
pub mod users;

pub use error::{HrError, HrResult};
pub use users::Visibility;
