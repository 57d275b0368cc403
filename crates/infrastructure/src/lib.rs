//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_user_repository;
mod tracing_lookup_diagnostics;

pub use in_memory_user_repository::InMemoryUserRepository;
pub use tracing_lookup_diagnostics::TracingLookupDiagnostics;
