use chrono::{DateTime, Utc};

use crate::entity::Entity;
use crate::listing::{AdKind, Listing};

/// Marketplace counters shown on the reports panel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    /// Active ads of either kind.
    pub ads: usize,
    pub ads_for_rent: usize,
    pub ads_for_sale: usize,
    pub featured_ads: usize,
    /// Active products.
    pub products: usize,
    pub principals: usize,
    pub blocked_principals: usize,
    /// Trashed ads and products awaiting restore or purge.
    pub trashed: usize,
    pub pending_comments: usize,
}

impl Report {
    pub(crate) fn count_ads(&mut self, ads: &[Entity<Listing>]) {
        for ad in ads.iter().filter_map(|entity| entity.payload.as_ad()) {
            self.ads += 1;
            match ad.kind {
                AdKind::Rent => self.ads_for_rent += 1,
                AdKind::Sale => self.ads_for_sale += 1,
            }
            if ad.featured {
                self.featured_ads += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::Ad;
    use crate::types::{CollectionName, EntityId};

    fn ad(kind: AdKind, featured: bool) -> Entity<Listing> {
        Entity {
            id: EntityId::generate(),
            collection: CollectionName::ads(),
            payload: Listing::Ad(Ad {
                kind,
                featured,
                ..Ad::default()
            }),
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn count_ads_should_split_by_kind() {
        let mut report = Report {
            generated_at: Utc::now(),
            ads: 0,
            ads_for_rent: 0,
            ads_for_sale: 0,
            featured_ads: 0,
            products: 0,
            principals: 0,
            blocked_principals: 0,
            trashed: 0,
            pending_comments: 0,
        };
        report.count_ads(&[
            ad(AdKind::Rent, false),
            ad(AdKind::Sale, true),
            ad(AdKind::Sale, false),
        ]);

        assert_eq!(report.ads, 3);
        assert_eq!(report.ads_for_rent, 1);
        assert_eq!(report.ads_for_sale, 2);
        assert_eq!(report.featured_ads, 1);
    }
}
