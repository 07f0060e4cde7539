pub mod accounts;
pub mod users;

pub use accounts::{AccountKind, Model as Account};
pub use users::{Model as User, UserRole};
