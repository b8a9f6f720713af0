use crate::models::answer::MatchingPairs;

/// Result of a `complete_link` attempt. A conflict is a normal outcome, not
/// an error: the presentation layer flashes the rejected target and the
/// pairing state is left exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    Conflict,
}

impl LinkOutcome {
    pub fn accepted(self) -> bool {
        self == LinkOutcome::Linked
    }
}

/// Pairing state for one matching question. The drag gesture is reduced to
/// begin/complete/cancel plus unlink; pointer handling lives entirely in the
/// presentation layer.
///
/// Invariant: `pairs` is injective. One right per left holds by overwrite in
/// `complete_link`; one left per right holds by rejecting a claimed target.
#[derive(Debug, Clone)]
pub struct MatchingPairResolver {
    left_count: usize,
    right_count: usize,
    pairs: MatchingPairs,
    pending_left: Option<usize>,
}

impl MatchingPairResolver {
    pub fn new(left_count: usize, right_count: usize) -> Self {
        Self {
            left_count,
            right_count,
            pairs: MatchingPairs::new(),
            pending_left: None,
        }
    }

    /// Restores pairing state, e.g. when resuming from a saved answer.
    /// Entries violating bounds or injectivity are discarded.
    pub fn with_pairs(left_count: usize, right_count: usize, pairs: MatchingPairs) -> Self {
        let mut resolver = Self::new(left_count, right_count);
        for (left, right) in pairs {
            resolver.begin_link(left);
            resolver.complete_link(left, right);
        }
        resolver.cancel_link();
        resolver
    }

    /// Starts forming a link anchored at `left`. No pairing mutation yet.
    pub fn begin_link(&mut self, left: usize) {
        if left < self.left_count {
            self.pending_left = Some(left);
        }
    }

    /// Lands the gesture on `right`. Rejected if `right` already belongs to
    /// a different left item; otherwise any previous pairing for `left` is
    /// replaced.
    pub fn complete_link(&mut self, left: usize, right: usize) -> LinkOutcome {
        if left >= self.left_count || right >= self.right_count {
            return LinkOutcome::Conflict;
        }
        if let Some(owner) = self.owner_of(right) {
            if owner != left {
                return LinkOutcome::Conflict;
            }
        }
        self.pairs.insert(left, right);
        self.pending_left = None;
        LinkOutcome::Linked
    }

    /// Detaches `left` and re-opens the gesture at the same anchor, so
    /// detach-and-redrag is one continuous motion.
    pub fn unlink(&mut self, left: usize) {
        self.pairs.remove(&left);
        self.begin_link(left);
    }

    /// Abandons an in-progress gesture (e.g. released over empty space).
    pub fn cancel_link(&mut self) {
        self.pending_left = None;
    }

    pub fn pending(&self) -> Option<usize> {
        self.pending_left
    }

    pub fn pairs(&self) -> &MatchingPairs {
        &self.pairs
    }

    pub fn matched_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_complete(&self) -> bool {
        self.pairs.len() == self.left_count
    }

    /// Which left item, if any, currently owns `right`.
    pub fn owner_of(&self, right: usize) -> Option<usize> {
        self.pairs
            .iter()
            .find(|&(_, &r)| r == right)
            .map(|(&l, _)| l)
    }

    #[cfg(test)]
    fn assert_injective(&self) {
        let rights: std::collections::BTreeSet<usize> = self.pairs.values().copied().collect();
        assert_eq!(rights.len(), self.pairs.len(), "pairs lost injectivity");
    }
}
