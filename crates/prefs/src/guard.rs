//! Inclusive numeric bounds for named preferences

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sort_core::ConfigurationError;

/// Which side of a range a bound constrains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Min,
    Max,
}

/// Inclusive range; an absent side is unconstrained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bounds {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl Bounds {
    /// Raise to the minimum, then lower to the maximum
    pub fn clamp(&self, value: i64) -> i64 {
        let raised = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(raised, |max| raised.min(max))
    }

    fn with(self, kind: BoundKind, value: i64) -> Self {
        match kind {
            BoundKind::Min => Bounds {
                min: Some(value),
                ..self
            },
            BoundKind::Max => Bounds {
                max: Some(value),
                ..self
            },
        }
    }
}

/// Registry of bounds consulted on every integer write
#[derive(Debug, Default)]
pub struct PreferenceGuard {
    bounds: DashMap<String, Bounds>,
}

impl PreferenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one side of the range for `name`
    ///
    /// A bound that would leave the minimum above the maximum is rejected and the
    /// previously registered range stays in force.
    pub fn set_bound(
        &self,
        name: &str,
        kind: BoundKind,
        value: i64,
    ) -> Result<Bounds, ConfigurationError> {
        let check = |bounds: Bounds| match (bounds.min, bounds.max) {
            (Some(min), Some(max)) if min > max => Err(ConfigurationError::InvertedBounds {
                name: name.to_string(),
                min,
                max,
            }),
            _ => Ok(bounds),
        };

        match self.bounds.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                let bounds = check(entry.get().with(kind, value))?;
                entry.insert(bounds);
                Ok(bounds)
            }
            Entry::Vacant(entry) => {
                let bounds = check(Bounds::default().with(kind, value))?;
                entry.insert(bounds);
                Ok(bounds)
            }
        }
    }

    /// The accepted value for a proposed write
    pub fn enforce(&self, name: &str, proposed: i64) -> i64 {
        self.bounds
            .get(name)
            .map_or(proposed, |bounds| bounds.clamp(proposed))
    }

    pub fn bounds(&self, name: &str) -> Option<Bounds> {
        self.bounds.get(name).map(|bounds| *bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_maximum_only() {
        let guard = PreferenceGuard::new();
        guard.set_bound("p", BoundKind::Max, 15).unwrap();

        assert_eq!(guard.enforce("p", 20), 15);
        assert_eq!(guard.enforce("p", 0), 0);
        assert_eq!(guard.enforce("p", -30), -30);
    }

    #[test]
    fn test_minimum_and_maximum() {
        let guard = PreferenceGuard::new();
        guard.set_bound("p", BoundKind::Max, 15).unwrap();
        guard.set_bound("p", BoundKind::Min, 2).unwrap();

        assert_eq!(guard.enforce("p", 20), 15);
        assert_eq!(guard.enforce("p", 0), 2);
        assert_eq!(guard.enforce("p", -30), 2);
        assert_eq!(guard.enforce("p", 17), 15);
        assert_eq!(guard.enforce("p", 10), 10);
    }

    #[test]
    fn test_minimum_only() {
        let guard = PreferenceGuard::new();
        guard.set_bound("p", BoundKind::Min, 2).unwrap();

        assert_eq!(guard.enforce("p", 1), 2);
        assert_eq!(guard.enforce("p", 5), 5);
    }

    #[test]
    fn test_unbounded_passes_through() {
        let guard = PreferenceGuard::new();
        assert_eq!(guard.enforce("free", i64::MIN), i64::MIN);
        assert_eq!(guard.bounds("free"), None);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let guard = PreferenceGuard::new();
        guard.set_bound("p", BoundKind::Max, 4).unwrap();

        let err = guard.set_bound("p", BoundKind::Min, 9).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvertedBounds {
                name: "p".into(),
                min: 9,
                max: 4
            }
        );
        assert_eq!(
            guard.bounds("p"),
            Some(Bounds {
                min: None,
                max: Some(4)
            })
        );
    }

    #[test]
    fn test_equal_bounds_pin_value() {
        let guard = PreferenceGuard::new();
        guard.set_bound("q", BoundKind::Min, 1).unwrap();
        guard.set_bound("q", BoundKind::Max, 1).unwrap();
        assert_eq!(guard.enforce("q", 50), 1);
        assert_eq!(guard.enforce("q", -50), 1);
    }

    #[test]
    fn test_clamp_is_idempotent_and_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        for _ in 0..1_000 {
            let a = rng.gen_range(-1_000i64..1_000);
            let b = rng.gen_range(-1_000i64..1_000);
            let (lo, hi) = (a.min(b), a.max(b));
            let bounds = Bounds {
                min: Some(lo),
                max: Some(hi),
            };

            let value = rng.gen_range(-5_000i64..5_000);
            let once = bounds.clamp(value);
            assert_eq!(bounds.clamp(once), once);
            assert!((lo..=hi).contains(&once));
        }
    }
}
