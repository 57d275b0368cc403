//! Application services and ports.

#![forbid(unsafe_code)]

mod user_lookup_service;

pub use user_lookup_service::{
    LookupDiagnostic, LookupDiagnostics, UserLookupService, UserRepository, UserUpdateReport,
};
