//! Reservation reading with graceful degradation.
//!
//! Only active reservations whose SKU matches the configured filter and
//! whose applied scope covers the queried subscription are counted.
//!
//! A missing reservation-reader role is an expected deployment shape, so an
//! access-denied answer yields an empty read plus an annotation instead of
//! an error. Other failures degrade the same way with a distinct annotation.

use ptu_sentinel_types::{Annotation, ReservationRecord, ReservationScope};

use crate::traits::ReservationLister;

/// Reservations read for one pass, plus the degradation note if any.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReservationRead {
    pub records: Vec<ReservationRecord>,
    pub annotation: Option<Annotation>,
}

impl ReservationRead {
    pub fn degraded(annotation: Annotation) -> Self {
        Self { records: Vec::new(), annotation: Some(annotation) }
    }

    pub fn total(&self) -> u64 {
        reserved_total(&self.records)
    }
}

/// Read reservations in `scope`, keeping entries whose SKU description
/// contains `sku_filter`. Never fails.
pub async fn read_reservations(
    lister: &dyn ReservationLister,
    scope: &ReservationScope,
    sku_filter: &str,
) -> ReservationRead {
    match lister.list_reservations(scope).await {
        Ok(entries) => {
            let total = entries.len();
            let records: Vec<ReservationRecord> = entries
                .into_iter()
                .filter(|e| e.is_active() && e.matches_sku(sku_filter) && e.applies_to(scope))
                .map(ReservationRecord::from_entry)
                .collect();
            tracing::info!(
                scope = %scope,
                listed = total,
                matched = records.len(),
                "Read capacity reservations"
            );
            ReservationRead { records, annotation: None }
        },
        Err(e) if e.is_access_denied() => {
            tracing::warn!(scope = %scope, "Reservation read denied, continuing without reservations");
            ReservationRead::degraded(Annotation::ReservationsUnavailable)
        },
        Err(e) => {
            tracing::warn!(scope = %scope, kind = e.kind(), "Could not query reservations: {}", e);
            ReservationRead::degraded(Annotation::ReservationQueryFailed { message: e.to_string() })
        },
    }
}

pub fn reserved_total<'a, I>(records: I) -> u64
where
    I: IntoIterator<Item = &'a ReservationRecord>,
{
    records.into_iter().fold(0u64, |acc, r| acc.saturating_add(r.quantity))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ptu_sentinel_types::{ReservationEntry, ScanError};

    struct FixedLister(Result<Vec<ReservationEntry>, ScanError>);

    #[async_trait]
    impl ReservationLister for FixedLister {
        async fn list_reservations(
            &self,
            _scope: &ReservationScope,
        ) -> Result<Vec<ReservationEntry>, ScanError> {
            self.0.clone()
        }
    }

    fn ptu(name: &str, quantity: u64) -> ReservationEntry {
        ReservationEntry {
            name: name.to_string(),
            display_name: Some(name.to_string()),
            quantity: Some(quantity),
            sku_description: Some("Provisioned Throughput Unit".to_string()),
            ..Default::default()
        }
    }

    fn scope() -> ReservationScope {
        ReservationScope::Subscription("sub".to_string())
    }

    #[tokio::test]
    async fn test_access_denied_degrades() {
        let lister = FixedLister(Err(ScanError::AccessDenied { scope: "tenant".to_string() }));
        let read = read_reservations(&lister, &scope(), "Provisioned Throughput").await;

        assert!(read.records.is_empty());
        assert_eq!(read.total(), 0);
        assert_eq!(read.annotation, Some(Annotation::ReservationsUnavailable));
    }

    #[tokio::test]
    async fn test_other_failure_has_distinct_annotation() {
        let lister = FixedLister(Err(ScanError::Transient {
            scope: "tenant".to_string(),
            message: "HTTP 429".to_string(),
        }));
        let read = read_reservations(&lister, &scope(), "").await;

        assert!(matches!(read.annotation, Some(Annotation::ReservationQueryFailed { .. })));
        assert_ne!(read.annotation, Some(Annotation::ReservationsUnavailable));
    }

    #[tokio::test]
    async fn test_non_ptu_reservations_are_filtered() {
        let mut vm = ptu("vm", 8);
        vm.sku_description = Some("Virtual Machines Dv5".to_string());
        let mut expired = ptu("old", 300);
        expired.provisioning_state = Some("Expired".to_string());
        let lister = FixedLister(Ok(vec![ptu("a", 100), vm, expired, ptu("b", 50)]));
        let read = read_reservations(&lister, &scope(), "Provisioned Throughput").await;

        assert_eq!(read.records.len(), 2);
        assert_eq!(read.total(), 150);
        assert_eq!(read.annotation, None);
    }
}
