use async_trait::async_trait;

use userhub_application::{LookupDiagnostic, LookupDiagnostics};

/// Diagnostics sink that forwards lookup events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLookupDiagnostics;

#[async_trait]
impl LookupDiagnostics for TracingLookupDiagnostics {
    async fn record(&self, event: LookupDiagnostic) {
        match event {
            LookupDiagnostic::MultipleMatches { email, match_count } => {
                tracing::warn!(%email, match_count, "more than one user found for email");
            }
        }
    }
}
