// Copyright 2021-2023 Protocol Labs
// SPDX-License-Identifier: Apache-2.0, MIT

//! The two bounded node caches behind the peer directory: a priority cache
//! for known-good nodes (evicting the lightest entry) and a random-eviction
//! cache for freshly discovered ones.

use std::collections::HashMap;

use rand::seq::IteratorRandom;

use crate::node::{NodeDescriptor, NodeId};

/// Fixed-capacity cache keyed by node id, priority = last session weight.
/// When full, inserting evicts the lowest-priority entry (only if the new
/// entry outranks it).
pub struct PriorityCache {
    capacity: usize,
    entries: HashMap<NodeId, (NodeDescriptor, i64)>,
}

impl PriorityCache {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);
        Self {
            capacity,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn insert(&mut self, node: NodeDescriptor, weight: i64) {
        if self.entries.contains_key(&node.id) {
            self.entries.insert(node.id, (node, weight));
            return;
        }
        if self.entries.len() >= self.capacity {
            let lightest = self
                .entries
                .iter()
                .min_by_key(|(_, (_, w))| *w)
                .map(|(id, (_, w))| (*id, *w));
            match lightest {
                Some((_, w)) if w >= weight => return,
                Some((id, _)) => {
                    self.entries.remove(&id);
                }
                None => {}
            }
        }
        self.entries.insert(node.id, (node, weight));
    }

    pub fn pick_random(&self, rng: &mut impl rand::Rng) -> Option<NodeDescriptor> {
        self.entries.values().choose(rng).map(|(n, _)| n.clone())
    }

    /// Entries ordered heaviest first, for persistence.
    pub fn snapshot(&self) -> Vec<NodeDescriptor> {
        let mut all: Vec<_> = self.entries.values().cloned().collect();
        all.sort_by_key(|(_, w)| std::cmp::Reverse(*w));
        all.into_iter().map(|(n, _)| n).collect()
    }
}

/// Random-eviction cache fed by the discovery subsystem.
pub struct RandomCache {
    capacity: usize,
    entries: HashMap<NodeId, NodeDescriptor>,
}

impl RandomCache {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);
        Self {
            capacity,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn insert(&mut self, node: NodeDescriptor, rng: &mut impl rand::Rng) {
        if !self.entries.contains_key(&node.id) && self.entries.len() >= self.capacity {
            if let Some(victim) = self.entries.keys().copied().choose(rng) {
                self.entries.remove(&victim);
            }
        }
        self.entries.insert(node.id, node);
    }

    pub fn remove(&mut self, id: &NodeId) -> Option<NodeDescriptor> {
        self.entries.remove(id)
    }

    /// A random entry not present in `excluded`.
    pub fn pick_random_excluding(
        &self,
        excluded: &std::collections::HashSet<NodeId>,
        rng: &mut impl rand::Rng,
    ) -> Option<NodeDescriptor> {
        self.entries
            .values()
            .filter(|n| !excluded.contains(&n.id))
            .choose(rng)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use thor_shared::Bytes32;

    use super::*;

    fn node(n: u8) -> NodeDescriptor {
        NodeDescriptor::new(
            Bytes32::repeat_byte(n),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, n)),
            1,
            1,
        )
    }

    #[test]
    fn priority_cache_evicts_lightest() {
        let mut cache = PriorityCache::new(2);
        cache.insert(node(1), 10);
        cache.insert(node(2), 20);
        cache.insert(node(3), 15);
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(&node(1).id));
        assert!(cache.contains(&node(2).id));
        assert!(cache.contains(&node(3).id));
    }

    #[test]
    fn priority_cache_rejects_underweight_when_full() {
        let mut cache = PriorityCache::new(2);
        cache.insert(node(1), 10);
        cache.insert(node(2), 20);
        cache.insert(node(3), 5);
        assert!(!cache.contains(&node(3).id));
    }

    #[test]
    fn priority_cache_updates_in_place() {
        let mut cache = PriorityCache::new(2);
        cache.insert(node(1), 10);
        cache.insert(node(1), 99);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.snapshot()[0].id, node(1).id);
    }

    #[test]
    fn snapshot_orders_heaviest_first() {
        let mut cache = PriorityCache::new(8);
        cache.insert(node(1), 5);
        cache.insert(node(2), 50);
        cache.insert(node(3), 20);
        let ids: Vec<_> = cache.snapshot().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![node(2).id, node(3).id, node(1).id]);
    }

    #[test]
    fn random_cache_bounds_size() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut cache = RandomCache::new(4);
        for n in 0..32 {
            cache.insert(node(n), &mut rng);
        }
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn random_pick_respects_exclusions() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut cache = RandomCache::new(8);
        cache.insert(node(1), &mut rng);
        cache.insert(node(2), &mut rng);
        let mut excluded = std::collections::HashSet::new();
        excluded.insert(node(1).id);
        for _ in 0..16 {
            let picked = cache.pick_random_excluding(&excluded, &mut rng).unwrap();
            assert_eq!(picked.id, node(2).id);
        }
        excluded.insert(node(2).id);
        assert!(cache.pick_random_excluding(&excluded, &mut rng).is_none());
    }
}
