// vim: tw=80
//! Call counting.

use std::{
    cell::Cell,
    fmt,
    ops::{Bound, RangeBounds},
};

/// How many calls an expectation requires by the time it is verified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CountPolicy {
    /// Any number of calls, including none.  This is the default.
    #[default]
    Any,
    /// Exactly this many calls.
    Exactly(usize),
    /// This many calls or more.
    AtLeast(usize),
    /// A closed range of call counts.
    Between(usize, usize),
}

impl CountPolicy {
    /// Would `n` calls satisfy this policy?
    pub fn admits(&self, n: usize) -> bool {
        match *self {
            CountPolicy::Any => true,
            CountPolicy::Exactly(e) => n == e,
            CountPolicy::AtLeast(min) => n >= min,
            CountPolicy::Between(min, max) => (min..=max).contains(&n),
        }
    }

    /// A `[min, max]` policy.  A `max` below `min` is ignored, leaving an
    /// exact count of `min`.
    pub fn between(min: usize, max: usize) -> Self {
        if max < min {
            CountPolicy::Exactly(min)
        } else {
            CountPolicy::Between(min, max)
        }
    }

    /// Convert a Rust range, like `1..4` or `2..`, into a policy.
    pub fn from_range<R: RangeBounds<usize>>(range: R) -> Self {
        let min = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        match range.end_bound() {
            Bound::Included(&e) => CountPolicy::between(min, e),
            Bound::Excluded(&0) => CountPolicy::Exactly(0),
            Bound::Excluded(&e) => CountPolicy::between(min, e - 1),
            Bound::Unbounded => CountPolicy::AtLeast(min),
        }
    }
}

impl fmt::Display for CountPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CountPolicy::Any => f.write_str("any number of"),
            CountPolicy::Exactly(n) => write!(f, "exactly {n}"),
            CountPolicy::AtLeast(n) => write!(f, "at least {n}"),
            CountPolicy::Between(min, max) =>
                write!(f, "at least {min} and at most {max}"),
        }
    }
}

#[derive(Debug, Default)]
#[doc(hidden)]
pub struct Times {
    /// How many times has the expectation already been called?
    count: Cell<usize>,
    policy: Cell<CountPolicy>,
}

impl Times {
    /// Record one call.
    pub fn call(&self) {
        self.count.set(self.count.get() + 1);
    }

    /// How many calls have been recorded.
    pub fn count(&self) -> usize {
        self.count.get()
    }

    /// The current requirement.
    pub fn policy(&self) -> CountPolicy {
        self.policy.get()
    }

    /// Replace the requirement.  Calls already recorded still count.
    pub fn set(&self, policy: CountPolicy) {
        self.policy.set(policy);
    }

    /// Has this expectation been called an acceptable number of times?
    pub fn is_satisfied(&self) -> bool {
        self.policy().admits(self.count())
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn exact() {
        let p = CountPolicy::Exactly(2);
        assert!(!p.admits(1));
        assert!(p.admits(2));
        assert!(!p.admits(3));
    }

    #[test]
    fn between_with_max_below_min_is_exact() {
        assert_eq!(CountPolicy::Exactly(3), CountPolicy::between(3, 1));
        assert_eq!(CountPolicy::Between(1, 3), CountPolicy::between(1, 3));
    }

    #[test]
    fn from_range() {
        assert_eq!(CountPolicy::Between(1, 2), CountPolicy::from_range(1..3));
        assert_eq!(CountPolicy::Between(1, 3), CountPolicy::from_range(1..=3));
        assert_eq!(CountPolicy::AtLeast(2), CountPolicy::from_range(2..));
        assert_eq!(CountPolicy::Between(0, 4), CountPolicy::from_range(..5));
        assert_eq!(CountPolicy::Exactly(0), CountPolicy::from_range(0..0));
    }

    #[test]
    fn at_least() {
        let p = CountPolicy::AtLeast(1);
        assert!(!p.admits(0));
        assert!(p.admits(1));
        assert!(p.admits(100));
    }

    #[test]
    fn display() {
        assert_eq!("exactly 2", CountPolicy::Exactly(2).to_string());
        assert_eq!("at least 1 and at most 3",
                   CountPolicy::Between(1, 3).to_string());
    }

    #[test]
    fn times_counts_calls() {
        let t = Times::default();
        t.set(CountPolicy::Exactly(1));
        assert!(!t.is_satisfied());
        t.call();
        assert!(t.is_satisfied());
        t.call();
        assert!(!t.is_satisfied());
        assert_eq!(2, t.count());
    }
}
