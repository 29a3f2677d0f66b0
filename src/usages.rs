// SPDX-License-Identifier: MIT

//! The list of usages collected for the next Main item.
//!
//! Usage items and Usage Minimum/Maximum ranges accumulate here until
//! a Main item consumes them. A variable field with `n` instances takes
//! the usage for instance `i` from entry `i`, or from the last entry
//! where the list is shorter than `n` (Section 6.2.2.8).

use crate::types::Usage;

/// The maximum number of usages collected for a single Main item.
/// Further usages are dropped and [UsageList::push] reports it.
pub const MAX_USAGES: usize = 256;

#[derive(Debug, Clone, Default)]
pub struct UsageList {
    usages: Vec<Usage>,
}

impl UsageList {
    pub fn new() -> Self {
        UsageList {
            usages: Vec::with_capacity(MAX_USAGES),
        }
    }

    pub fn len(&self) -> usize {
        self.usages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.usages.is_empty()
    }

    /// Appends a usage. Returns false if the list is full and the
    /// usage was dropped.
    pub fn push(&mut self, usage: Usage) -> bool {
        if self.usages.len() >= MAX_USAGES {
            return false;
        }
        self.usages.push(usage);
        true
    }

    /// Appends every usage in `minimum..=maximum`, up to the capacity.
    /// Returns false if part of the range was dropped.
    pub fn extend_range(&mut self, minimum: Usage, maximum: Usage) -> bool {
        let (min, max) = (u32::from(minimum), u32::from(maximum));
        if min > max {
            return true;
        }
        let wanted = ((max - min) as usize).saturating_add(1);
        let room = MAX_USAGES - self.usages.len();
        self.usages
            .extend((min..=max).take(room).map(Usage::from));
        wanted <= room
    }

    /// The usage for the `index`-th instance of a variable field:
    /// the entry at `index`, or the last entry if the list is shorter.
    pub fn for_instance(&self, index: usize) -> Option<Usage> {
        self.usages
            .get(index)
            .or_else(|| self.usages.last())
            .copied()
    }

    pub fn first(&self) -> Option<Usage> {
        self.usages.first().copied()
    }

    pub fn clear(&mut self) {
        self.usages.clear();
    }
}

impl std::ops::Deref for UsageList {
    type Target = [Usage];

    fn deref(&self) -> &Self::Target {
        &self.usages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range() {
        let mut list = UsageList::new();
        assert!(list.extend_range(Usage(0x0009_0001), Usage(0x0009_0003)));
        assert_eq!(
            &*list,
            &[Usage(0x0009_0001), Usage(0x0009_0002), Usage(0x0009_0003)]
        );
        assert_eq!(list.for_instance(1), Some(Usage(0x0009_0002)));
        assert_eq!(list.for_instance(7), Some(Usage(0x0009_0003)));
    }

    #[test]
    fn empty_range() {
        let mut list = UsageList::new();
        assert!(list.extend_range(Usage(5), Usage(4)));
        assert!(list.is_empty());
        assert_eq!(list.for_instance(0), None);
    }

    #[test]
    fn range_truncated() {
        let mut list = UsageList::new();
        list.push(Usage(1));
        assert!(!list.extend_range(Usage(0), Usage(u32::MAX)));
        assert_eq!(list.len(), MAX_USAGES);
        assert_eq!(list.first(), Some(Usage(1)));
        assert_eq!(list.last(), Some(&Usage(MAX_USAGES as u32 - 2)));

        assert!(!list.push(Usage(2)));
        assert_eq!(list.len(), MAX_USAGES);

        list.clear();
        assert!(list.is_empty());
        assert!(list.push(Usage(3)));
    }

    #[test]
    fn push_to_capacity() {
        let mut list = UsageList::new();
        for u in 0..MAX_USAGES as u32 {
            assert!(list.push(Usage(u)));
        }
        assert!(!list.push(Usage(0xffff)));
        assert_eq!(list.for_instance(300), Some(Usage(MAX_USAGES as u32 - 1)));
    }
}
