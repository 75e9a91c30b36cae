//! Optimistic toggles with exact rollback.
//!
//! The visible value changes the moment the user acts. The value it replaced
//! is captured at that moment and restored verbatim if the server rejects
//! the call, so rollback never recomputes anything.

use std::collections::BTreeMap;

/// A value whose fields flip together on user action.
pub trait Toggle: Clone {
    fn toggled(&self) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

impl Toggle for LikeState {
    fn toggled(&self) -> Self {
        if self.liked {
            Self {
                liked: false,
                like_count: self.like_count.saturating_sub(1),
            }
        } else {
            Self {
                liked: true,
                like_count: self.like_count + 1,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FollowState {
    pub following: bool,
}

impl Toggle for FollowState {
    fn toggled(&self) -> Self {
        Self {
            following: !self.following,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied<T> {
    pub next: T,
    pub undo: T,
}

pub fn apply<T: Toggle>(current: &T) -> Applied<T> {
    Applied {
        next: current.toggled(),
        undo: current.clone(),
    }
}

/// Render-visible toggle values keyed by entity, with at most one outstanding
/// server call per key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticSet<K: Ord, T> {
    visible: BTreeMap<K, T>,
    in_flight: BTreeMap<K, T>,
}

impl<K: Ord, T> Default for OptimisticSet<K, T> {
    fn default() -> Self {
        Self {
            visible: BTreeMap::new(),
            in_flight: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Clone, T: Toggle> OptimisticSet<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the server's value. Ignored while a call for the key is outstanding.
    pub fn seed(&mut self, key: K, value: T) {
        if !self.in_flight.contains_key(&key) {
            self.visible.insert(key, value);
        }
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.visible.get(key)
    }

    pub fn is_in_flight(&self, key: &K) -> bool {
        self.in_flight.contains_key(key)
    }

    /// Applies the toggle and returns the new visible value, or `None` when the
    /// key is unknown or a call for it has not resolved yet.
    pub fn begin(&mut self, key: &K) -> Option<T> {
        if self.in_flight.contains_key(key) {
            return None;
        }
        let current = self.visible.get_mut(key)?;
        let Applied { next, undo } = apply(current);
        *current = next.clone();
        self.in_flight.insert(key.clone(), undo);
        Some(next)
    }

    /// Resolves the outstanding call. On rejection the captured value comes back.
    pub fn settle(&mut self, key: &K, accepted: bool) -> Option<T> {
        let undo = self.in_flight.remove(key)?;
        if accepted {
            return self.visible.get(key).cloned();
        }
        self.visible.insert(key.clone(), undo.clone());
        Some(undo)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &T)> {
        self.visible.iter()
    }
}
