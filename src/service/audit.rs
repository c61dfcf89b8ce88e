use std::sync::Arc;

use tracing::warn;

use crate::error::ServiceError;
use crate::model::audit::{AuditEntry, NewAuditEntry};
use crate::repository::audit_repo::AuditRepository;

pub struct AuditTrail {
    repo: Arc<dyn AuditRepository>,
}

impl AuditTrail {
    pub fn new(repo: Arc<dyn AuditRepository>) -> Self {
        Self { repo }
    }

    /// Never fails the caller; a lost entry is only logged.
    pub async fn record(&self, actor: Option<u64>, action: &str, detail: Option<String>, ip: Option<String>) {
        let entry = NewAuditEntry::new(actor, action, detail, ip);
        if let Err(e) = self.repo.insert(&entry).await {
            warn!(error = %e, action, "Failed to write audit entry");
        }
    }

    pub async fn list(&self, page: u64, per_page: u64) -> Result<(Vec<AuditEntry>, i64), ServiceError> {
        Ok(self.repo.list(page.max(1), per_page.clamp(1, 100)).await?)
    }
}
