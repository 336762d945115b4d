//! Computes the coarsest disjoint partition of code points that every
//! explicit transition key in a machine can be expressed as a union of.
//!
//! Refines a partition of *code points* incrementally: each incoming
//! transition key is split against the classes built so far, the same way
//! a state-partition refinement splits blocks against a distinguishing
//! transition.

use crate::charset::CharSet;

/// Incrementally refines a disjoint partition of code points as character
/// sets are fed in one at a time.
///
/// Every public mutation goes through [`Partitioner::feed`]; class order is
/// the order in which classes were created or split off, which is the
/// numbering the rest of the crate treats as stable (`cc_0, cc_1, ...`).
#[derive(Debug, Clone, Default)]
pub struct Partitioner {
    classes: Vec<CharSet>,
}

impl Partitioner {
    /// An empty partitioner with no classes yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
        }
    }

    /// Refines the partition so every code point in `key` is covered by a
    /// union of classes. A `key` that is empty is a no-op.
    pub fn feed(&mut self, key: &CharSet) {
        if key.is_empty() {
            return;
        }
        let mut remainder = key.clone();
        let mut refined = Vec::with_capacity(self.classes.len() + 1);

        for class in self.classes.drain(..) {
            let intersection = class.intersection(&remainder);
            if intersection.is_empty() {
                refined.push(class);
                continue;
            }
            let difference = class.difference(&remainder);
            if difference.is_empty() {
                refined.push(class);
            } else {
                refined.push(difference);
                refined.push(intersection.clone());
            }
            remainder = remainder.difference(&intersection);
        }

        if !remainder.is_empty() {
            refined.push(remainder);
        }

        self.classes = refined;
    }

    /// Feeds every key in `keys`, in order.
    pub fn feed_all<'a>(&mut self, keys: impl IntoIterator<Item = &'a CharSet>) {
        for key in keys {
            self.feed(key);
        }
    }

    /// The classes in stable numbering order. Index `i` is `cc_i`.
    #[must_use]
    pub fn classes(&self) -> &[CharSet] {
        &self.classes
    }

    /// The number of classes computed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no classes have been computed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classifies a code point against the current partition. A linear scan
    /// suffices at this crate's scale; the representation makes it trivial
    /// to swap in an interval tree if that ever stops being true.
    #[must_use]
    pub fn classify(&self, cp: u32) -> Option<usize> {
        self.classes.iter().position(|class| class.contains(cp))
    }
}
