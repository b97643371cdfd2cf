/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! GCD / LCM helpers for the cadence cycle.
//!
//! Every rule fires on multiples of its period, so the combined firing
//! pattern repeats every `lcm(periods)` ticks.  Free functions so they can be
//! tested without a scheduler.

/// Iterative Euclidean GCD.  `gcd(0, n) == n`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Checked LCM, `None` on `u64` overflow.  `lcm(0, n) == 0`.
///
/// Divides before multiplying: `(a / gcd(a, b)) * b`.
pub fn lcm(a: u64, b: u64) -> Option<u64> {
    if a == 0 || b == 0 {
        return Some(0);
    }
    (a / gcd(a, b)).checked_mul(b)
}

/// Number of ticks after which the firing pattern of `periods` repeats.
///
/// `Some(1)` for an empty set, `None` on overflow.
pub fn cycle_length(periods: impl IntoIterator<Item = u64>) -> Option<u64> {
    periods.into_iter().try_fold(1u64, lcm)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcd_basic_cases() {
        assert_eq!(gcd(12, 8), 4);
        assert_eq!(gcd(40, 10), 10);
        assert_eq!(gcd(17, 13), 1);
        assert_eq!(gcd(0, 5), 5);
    }

    #[test]
    fn lcm_basic_cases() {
        assert_eq!(lcm(4, 6), Some(12));
        assert_eq!(lcm(10, 40), Some(40));
        assert_eq!(lcm(0, 5), Some(0));
    }

    #[test]
    fn lcm_overflow_returns_none() {
        let a = u64::MAX / 2 + 1;
        let b = u64::MAX / 2 + 3;
        assert_eq!(lcm(a, b), None);
    }

    #[test]
    fn demo_cadences_repeat_every_forty_ticks() {
        assert_eq!(cycle_length([1, 10, 40]), Some(40));
    }

    #[test]
    fn coprime_periods_multiply() {
        assert_eq!(cycle_length([1, 2, 5]), Some(10));
        assert_eq!(cycle_length([3, 7]), Some(21));
    }

    #[test]
    fn empty_set_cycles_every_tick() {
        assert_eq!(cycle_length(std::iter::empty()), Some(1));
    }
}
