//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod user;

pub use user::{EMAIL_KEY, EmailAddress, FieldPatch, ID_KEY, UserDocument, UserFilter, UserId};
