use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashSet;

use crate::domain::{
    DeployResult,
    SubdomainLabel,
};

/// Decides whether a subdomain may still be claimed.
///
/// Nothing in this crate persists claimed subdomains; back ends that do can
/// implement this trait against their own store.
#[async_trait]
pub trait SubdomainRegistry: Send + Sync {
    async fn is_available(&self, label: &SubdomainLabel) -> DeployResult<bool>;

    /// Reserves `label` for one request. Returns `false` if it is reserved,
    /// already claimed, or lost a race to a concurrent claim.
    ///
    /// Registries without claim tracking fall back to [`is_available`](Self::is_available).
    async fn try_claim(&self, label: &SubdomainLabel) -> DeployResult<bool> {
        self.is_available(label).await
    }

    /// Gives back a claim whose deployment was never queued.
    async fn release(&self, _label: &SubdomainLabel) -> DeployResult<()> {
        Ok(())
    }
}

/// Every label is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenSubdomainRegistry;

#[async_trait]
impl SubdomainRegistry for OpenSubdomainRegistry {
    async fn is_available(&self, _label: &SubdomainLabel) -> DeployResult<bool> {
        Ok(true)
    }
}

/// Rejects a fixed set of reserved labels and anything claimed since start-up.
///
/// Claims live in memory only and are lost on restart.
#[derive(Debug, Default)]
pub struct ReservedSubdomainRegistry {
    reserved: HashSet<String>,
    claimed: DashSet<String>,
}

impl ReservedSubdomainRegistry {
    pub fn new<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            reserved: reserved
                .into_iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            claimed: DashSet::new(),
        }
    }

    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }
}

#[async_trait]
impl SubdomainRegistry for ReservedSubdomainRegistry {
    async fn is_available(&self, label: &SubdomainLabel) -> DeployResult<bool> {
        Ok(!self.reserved.contains(label.as_str()) && !self.claimed.contains(label.as_str()))
    }

    async fn try_claim(&self, label: &SubdomainLabel) -> DeployResult<bool> {
        if self.reserved.contains(label.as_str()) {
            return Ok(false);
        }
        // insert is the atomic check-and-set; false means someone else holds it
        Ok(self.claimed.insert(label.as_str().to_string()))
    }

    async fn release(&self, label: &SubdomainLabel) -> DeployResult<()> {
        self.claimed.remove(label.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn label(s: &str) -> SubdomainLabel {
        SubdomainLabel::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_open_registry_accepts_everything() {
        let registry = OpenSubdomainRegistry;
        assert!(registry.try_claim(&label("www")).await.unwrap());
        assert!(registry.try_claim(&label("www")).await.unwrap());
        assert!(registry.is_available(&label("www")).await.unwrap());
    }

    #[tokio::test]
    async fn test_reserved_labels_are_unavailable() {
        let registry = ReservedSubdomainRegistry::new(["www", " API ", ""]);
        assert_eq!(registry.reserved_count(), 2);
        assert!(!registry.is_available(&label("www")).await.unwrap());
        assert!(!registry.is_available(&label("api")).await.unwrap());
        assert!(registry.is_available(&label("alice-site")).await.unwrap());
    }

    #[tokio::test]
    async fn test_claimed_labels_become_unavailable() {
        let registry = ReservedSubdomainRegistry::new(Vec::<String>::new());
        assert!(registry.is_available(&label("alice-site")).await.unwrap());

        assert!(registry.try_claim(&label("alice-site")).await.unwrap());
        assert!(!registry.is_available(&label("alice-site")).await.unwrap());
        assert!(!registry.try_claim(&label("alice-site")).await.unwrap());
    }

    #[tokio::test]
    async fn test_reserved_labels_cannot_be_claimed() {
        let registry = ReservedSubdomainRegistry::new(["www"]);
        assert!(!registry.try_claim(&label("www")).await.unwrap());
    }

    #[tokio::test]
    async fn test_released_label_can_be_claimed_again() {
        let registry = ReservedSubdomainRegistry::new(Vec::<String>::new());
        assert!(registry.try_claim(&label("alice-site")).await.unwrap());

        registry.release(&label("alice-site")).await.unwrap();
        assert!(registry.is_available(&label("alice-site")).await.unwrap());
        assert!(registry.try_claim(&label("alice-site")).await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_have_one_winner() {
        let registry = Arc::new(ReservedSubdomainRegistry::new(Vec::<String>::new()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.try_claim(&label("alice-site")).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
