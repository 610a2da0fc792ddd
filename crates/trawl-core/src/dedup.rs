use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::CanonicalListing;

/// Which record survives when a harvest emits the same id twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    #[default]
    KeepFirst,
    KeepLast,
}

/// Listings keyed by id, iterated in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ListingSet {
    policy: DedupPolicy,
    index: HashMap<String, usize>,
    listings: Vec<CanonicalListing>,
}

impl ListingSet {
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Insert a listing. Returns true if its id was not seen before.
    pub fn insert(&mut self, listing: CanonicalListing) -> bool {
        match self.index.get(&listing.id) {
            Some(&pos) => {
                if self.policy == DedupPolicy::KeepLast {
                    self.listings[pos] = listing;
                }
                false
            }
            None => {
                self.index.insert(listing.id.clone(), self.listings.len());
                self.listings.push(listing);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn into_vec(self) -> Vec<CanonicalListing> {
        self.listings
    }
}

impl Extend<CanonicalListing> for ListingSet {
    fn extend<I: IntoIterator<Item = CanonicalListing>>(&mut self, iter: I) {
        for listing in iter {
            self.insert(listing);
        }
    }
}
