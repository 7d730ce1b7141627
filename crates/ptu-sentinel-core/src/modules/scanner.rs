//! Deployment scanning for one or many accounts.

use std::sync::Arc;

use ptu_sentinel_types::{AccountLocator, DeploymentEntry, DeploymentRecord, ScanError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::traits::DeploymentLister;

/// Single-pass, lazily classified sequence of deployment records.
#[derive(Debug)]
pub struct DeploymentScan {
    account: String,
    resource_group: String,
    entries: std::vec::IntoIter<DeploymentEntry>,
}

impl DeploymentScan {
    pub fn new(account: &AccountLocator, entries: Vec<DeploymentEntry>) -> Self {
        Self {
            account: account.name.clone(),
            resource_group: account.resource_group.clone(),
            entries: entries.into_iter(),
        }
    }
}

impl Iterator for DeploymentScan {
    type Item = DeploymentRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries
            .next()
            .map(|entry| DeploymentRecord::from_entry(&self.account, &self.resource_group, entry))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

/// List one account's deployments. Errors are returned as-is, never retried.
pub async fn scan_account(
    lister: &dyn DeploymentLister,
    account: &AccountLocator,
) -> Result<DeploymentScan, ScanError> {
    let entries = lister.list_deployments(account).await?;
    Ok(DeploymentScan::new(account, entries))
}

/// Sum of capacity over provisioned records; other billing modes contribute nothing.
pub fn provisioned_total<'a, I>(records: I) -> u64
where
    I: IntoIterator<Item = &'a DeploymentRecord>,
{
    records.into_iter().fold(0u64, |acc, r| acc.saturating_add(r.provisioned_capacity()))
}

/// Outcome of a multi-account fan-out, each list in input order.
#[derive(Debug, Default)]
pub struct AccountScans {
    pub completed: Vec<(AccountLocator, Vec<DeploymentRecord>)>,
    pub failed: Vec<(AccountLocator, ScanError)>,
    /// Accounts still running when the deadline elapsed
    pub omitted: Vec<AccountLocator>,
}

/// Scan every account with at most `max_parallel` listings in flight.
///
/// Only accounts whose listing finished before `deadline` are merged; the
/// rest are aborted and reported as omitted.
pub async fn scan_accounts(
    lister: Arc<dyn DeploymentLister>,
    accounts: &[AccountLocator],
    max_parallel: usize,
    deadline: Instant,
) -> AccountScans {
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
    let mut join_set: JoinSet<(usize, Result<Vec<DeploymentRecord>, ScanError>)> = JoinSet::new();

    for (index, account) in accounts.iter().cloned().enumerate() {
        let lister = Arc::clone(&lister);
        let semaphore = Arc::clone(&semaphore);
        join_set.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (
                    index,
                    Err(ScanError::Transient {
                        scope: account.to_string(),
                        message: "scan pool closed".to_string(),
                    }),
                );
            };
            let result = scan_account(lister.as_ref(), &account).await.map(Iterator::collect);
            (index, result)
        });
    }

    let mut outcomes: Vec<Option<Result<Vec<DeploymentRecord>, ScanError>>> =
        (0..accounts.len()).map(|_| None).collect();
    let mut timed_out = false;

    loop {
        match tokio::time::timeout_at(deadline, join_set.join_next()).await {
            Ok(Some(Ok((index, result)))) => {
                if let Some(slot) = outcomes.get_mut(index) {
                    *slot = Some(result);
                }
            },
            Ok(Some(Err(e))) => {
                tracing::error!("Account scan task failed: {}", e);
            },
            Ok(None) => break,
            Err(_) => {
                timed_out = true;
                join_set.abort_all();
                break;
            },
        }
    }

    let mut scans = AccountScans::default();
    for (account, outcome) in accounts.iter().cloned().zip(outcomes) {
        match outcome {
            Some(Ok(records)) => {
                tracing::info!(account = %account, deployments = records.len(), "Scanned deployments");
                scans.completed.push((account, records));
            },
            Some(Err(e)) => {
                tracing::warn!(account = %account, kind = e.kind(), "Deployment scan failed: {}", e);
                scans.failed.push((account, e));
            },
            None if timed_out => {
                tracing::warn!(account = %account, "Deployment scan omitted at deadline");
                scans.omitted.push(account);
            },
            None => {
                let e = ScanError::Transient {
                    scope: account.to_string(),
                    message: "scan task did not complete".to_string(),
                };
                scans.failed.push((account, e));
            },
        }
    }
    scans
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn entry(name: &str, sku: &str, capacity: Option<u64>) -> DeploymentEntry {
        DeploymentEntry {
            name: name.to_string(),
            model_name: Some("gpt-4".to_string()),
            sku_name: Some(sku.to_string()),
            capacity,
        }
    }

    struct MapLister {
        by_account: HashMap<String, Result<Vec<DeploymentEntry>, ScanError>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl MapLister {
        fn new(pairs: Vec<(&str, Result<Vec<DeploymentEntry>, ScanError>)>) -> Self {
            Self {
                by_account: pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DeploymentLister for MapLister {
        async fn list_deployments(
            &self,
            account: &AccountLocator,
        ) -> Result<Vec<DeploymentEntry>, ScanError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if account.name == "slow" {
                tokio::time::sleep(Duration::from_secs(5)).await;
            } else {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.by_account
                .get(&account.name)
                .cloned()
                .unwrap_or_else(|| Err(ScanError::NotFound { resource: account.name.clone() }))
        }
    }

    fn accounts(names: &[&str]) -> Vec<AccountLocator> {
        names.iter().map(|n| AccountLocator::cognitive("sub", "rg", n)).collect()
    }

    #[tokio::test]
    async fn test_scan_keeps_zero_and_missing_capacity() {
        let lister = MapLister::new(vec![(
            "a",
            Ok(vec![
                entry("ptu", "ProvisionedManaged", Some(100)),
                entry("empty", "ProvisionedManaged", None),
                entry("payg", "GlobalStandard", Some(0)),
            ]),
        )]);
        let records: Vec<_> =
            scan_account(&lister, &accounts(&["a"])[0]).await.unwrap().collect();

        assert_eq!(records.len(), 3);
        assert_eq!(records[1].capacity, 0);
        assert_eq!(provisioned_total(&records), 100);
    }

    #[tokio::test]
    async fn test_fan_out_skips_failed_accounts_and_keeps_order() {
        let lister = Arc::new(MapLister::new(vec![
            ("a", Ok(vec![entry("a1", "ProvisionedManaged", Some(10))])),
            ("b", Err(ScanError::AccessDenied { scope: "b".to_string() })),
            ("c", Ok(vec![entry("c1", "ProvisionedManaged", Some(5))])),
        ]));
        let deadline = Instant::now() + Duration::from_secs(5);
        let scans = scan_accounts(lister, &accounts(&["a", "b", "c"]), 2, deadline).await;

        let names: Vec<_> = scans.completed.iter().map(|(a, _)| a.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(scans.failed.len(), 1);
        assert!(scans.failed[0].1.is_access_denied());
        assert!(scans.omitted.is_empty());
    }

    #[tokio::test]
    async fn test_fan_out_respects_parallelism_bound() {
        let names = ["a", "b", "c", "d", "e", "f"];
        let lister = Arc::new(MapLister::new(
            names.iter().map(|n| (*n, Ok(vec![]))).collect(),
        ));
        let deadline = Instant::now() + Duration::from_secs(5);
        let scans = scan_accounts(lister.clone(), &accounts(&names), 2, deadline).await;

        assert_eq!(scans.completed.len(), 6);
        assert!(lister.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_deadline_omits_unfinished_accounts() {
        let lister = Arc::new(MapLister::new(vec![
            ("fast", Ok(vec![entry("f1", "ProvisionedManaged", Some(1))])),
            ("slow", Ok(vec![entry("s1", "ProvisionedManaged", Some(1))])),
        ]));
        let deadline = Instant::now() + Duration::from_millis(200);
        let scans = scan_accounts(lister, &accounts(&["fast", "slow"]), 4, deadline).await;

        assert_eq!(scans.completed.len(), 1);
        assert_eq!(scans.omitted.len(), 1);
        assert_eq!(scans.omitted[0].name, "slow");
    }
}
