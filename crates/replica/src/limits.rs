//! Recursion limits for the instantiation and copy engines.

use serde::{Deserialize, Serialize};

/// Default bound on nested constructor-parameter instantiation.
pub const DEFAULT_MAX_INSTANTIATION_DEPTH: usize = 64;

/// Configurable recursion limits.
///
/// `None` disables a limit. Native stack growth is handled separately, so these limits exist to bound
/// work on pathological type graphs rather than to prevent overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum nesting of parameter instantiation below one top-level call.
    ///
    /// Exceeding it is a non-fatal failure, so the enclosing constructor receives `Null` for that argument.
    #[serde(default)]
    pub max_instantiation_depth: Option<usize>,
    /// Maximum nesting of objects below the root of one copy.
    #[serde(default)]
    pub max_copy_depth: Option<usize>,
}

impl Default for Limits {
    fn default() -> Self {
        Self::new()
    }
}

impl Limits {
    /// Creates limits with the default instantiation depth and no copy depth limit.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_instantiation_depth: Some(DEFAULT_MAX_INSTANTIATION_DEPTH),
            max_copy_depth: None,
        }
    }

    /// Creates limits with every limit disabled.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_instantiation_depth: None,
            max_copy_depth: None,
        }
    }

    /// Sets the maximum instantiation depth.
    #[must_use]
    pub fn max_instantiation_depth(mut self, limit: Option<usize>) -> Self {
        self.max_instantiation_depth = limit;
        self
    }

    /// Sets the maximum copy depth.
    #[must_use]
    pub fn max_copy_depth(mut self, limit: usize) -> Self {
        self.max_copy_depth = Some(limit);
        self
    }

    pub(crate) fn instantiation_exceeded(&self, depth: usize) -> Option<usize> {
        self.max_instantiation_depth.filter(|&limit| depth > limit)
    }

    pub(crate) fn copy_exceeded(&self, depth: usize) -> Option<usize> {
        self.max_copy_depth.filter(|&limit| depth > limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let limits = Limits::default();
        assert_eq!(limits.max_instantiation_depth, Some(DEFAULT_MAX_INSTANTIATION_DEPTH));
        assert_eq!(limits.max_copy_depth, None);
        assert_eq!(limits.instantiation_exceeded(64), None);
        assert_eq!(limits.instantiation_exceeded(65), Some(64));
    }

    #[test]
    fn setters_chain() {
        let limits = Limits::unlimited().max_copy_depth(3).max_instantiation_depth(Some(2));
        assert_eq!(limits.copy_exceeded(4), Some(3));
        assert_eq!(limits.copy_exceeded(3), None);
        assert_eq!(limits.instantiation_exceeded(3), Some(2));
    }
}
