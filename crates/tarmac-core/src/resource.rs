//! Shared, capacity-limited airport resources.

use std::fmt;

/// One of the three counting resources aircraft contend for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// Landing and takeoff strip.
    Runway,
    /// Boarding gate, held from disembark through takeoff.
    Gate,
    /// Control-tower operation channel, needed by every phase.
    Tower,
}

impl ResourceKind {
    /// All resources in index order.
    pub const ALL: [ResourceKind; 3] = [ResourceKind::Runway, ResourceKind::Gate, ResourceKind::Tower];

    /// Dense index into per-resource arrays.
    pub fn index(self) -> usize {
        match self {
            Self::Runway => 0,
            Self::Gate => 1,
            Self::Tower => 2,
        }
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runway => write!(f, "runway"),
            Self::Gate => write!(f, "gate"),
            Self::Tower => write!(f, "tower"),
        }
    }
}

/// A set of [`ResourceKind`]s packed into a byte.
///
/// Small enough to live in an `AtomicU8`, which is how an aircraft
/// publishes what it currently holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ResourceSet(u8);

impl ResourceSet {
    /// The empty set.
    pub const EMPTY: ResourceSet = ResourceSet(0);

    /// Rebuild a set from [`bits`](Self::bits). Unknown bits are dropped.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b111)
    }

    /// Raw representation.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Add `kind`. Returns `false` if it was already present.
    pub fn insert(&mut self, kind: ResourceKind) -> bool {
        let had = self.contains(kind);
        self.0 |= kind.bit();
        !had
    }

    /// Remove `kind`. Returns `false` if it was absent.
    pub fn remove(&mut self, kind: ResourceKind) -> bool {
        let had = self.contains(kind);
        self.0 &= !kind.bit();
        had
    }

    /// Membership test.
    pub fn contains(self, kind: ResourceKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Number of members.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Whether the set has no members.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in [`ResourceKind::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = ResourceKind> {
        ResourceKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl FromIterator<ResourceKind> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = ResourceKind>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

impl fmt::Display for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, kind) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}")?;
        }
        f.write_str("}")
    }
}

/// Point-in-time occupancy of one resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Usage {
    /// Which resource.
    pub kind: ResourceKind,
    /// Units currently granted.
    pub in_use: u32,
    /// Fixed number of units.
    pub capacity: u32,
    /// Highest `in_use` observed since construction.
    pub peak: u32,
}

impl Usage {
    /// Every unit is granted.
    pub fn is_saturated(&self) -> bool {
        self.in_use >= self.capacity
    }

    /// `in_use / capacity` in `[0, 1]`.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.in_use as f64 / self.capacity as f64
    }

    /// `peak / capacity` in `[0, 1]`.
    pub fn peak_utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.peak as f64 / self.capacity as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn insert_remove_contains() {
        let mut set = ResourceSet::EMPTY;
        assert!(set.is_empty());
        assert!(set.insert(ResourceKind::Gate));
        assert!(!set.insert(ResourceKind::Gate));
        assert!(set.contains(ResourceKind::Gate));
        assert!(!set.contains(ResourceKind::Runway));
        assert_eq!(set.len(), 1);
        assert!(set.remove(ResourceKind::Gate));
        assert!(!set.remove(ResourceKind::Gate));
        assert!(set.is_empty());
    }

    #[test]
    fn display_lists_members_in_index_order() {
        let set: ResourceSet = [ResourceKind::Tower, ResourceKind::Runway].into_iter().collect();
        assert_eq!(set.to_string(), "{runway, tower}");
        assert_eq!(ResourceSet::EMPTY.to_string(), "{}");
    }

    #[test]
    fn saturation_and_utilization() {
        let u = Usage {
            kind: ResourceKind::Tower,
            in_use: 2,
            capacity: 2,
            peak: 2,
        };
        assert!(u.is_saturated());
        assert!((u.utilization() - 1.0).abs() < 1e-12);

        let u = Usage { in_use: 1, peak: 2, ..u };
        assert!(!u.is_saturated());
        assert!((u.utilization() - 0.5).abs() < 1e-12);
        assert!((u.peak_utilization() - 1.0).abs() < 1e-12);
    }

    fn arb_kind() -> impl Strategy<Value = ResourceKind> {
        prop_oneof![
            Just(ResourceKind::Runway),
            Just(ResourceKind::Gate),
            Just(ResourceKind::Tower),
        ]
    }

    proptest! {
        #[test]
        fn bits_roundtrip(kinds in proptest::collection::vec(arb_kind(), 0..6)) {
            let set: ResourceSet = kinds.iter().copied().collect();
            prop_assert_eq!(ResourceSet::from_bits(set.bits()), set);
            for k in &kinds {
                prop_assert!(set.contains(*k));
            }
            let distinct: std::collections::HashSet<_> = kinds.iter().collect();
            prop_assert_eq!(set.len(), distinct.len());
        }
    }
}
