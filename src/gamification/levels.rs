//! Points and level system
//!
//! Levels are a fixed 100-point ladder: level 1 covers 0..=99 points, level 2 covers
//! 100..=199, and so on. Exactly 100 points is level 2 with 100 to go.

use serde::{Deserialize, Serialize};

/// Pure level arithmetic over accumulated points
pub struct LevelCalculator;

impl LevelCalculator {
    /// Points spanned by every level
    pub const POINTS_PER_LEVEL: u64 = 100;

    /// `floor(points / 100) + 1`
    pub fn level(points: u64) -> u64 {
        points / Self::POINTS_PER_LEVEL + 1
    }

    /// `level * 100 - points`, in `1..=100` until the top level saturates at `u64::MAX`
    pub fn points_to_next_level(points: u64) -> u64 {
        Self::level(points)
            .saturating_mul(Self::POINTS_PER_LEVEL)
            .saturating_sub(points)
    }

    /// `points mod 100`, the fill of a 0-100 progress bar
    pub fn level_progress(points: u64) -> u64 {
        points % Self::POINTS_PER_LEVEL
    }
}

/// Level projection of a user's points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerLevel {
    pub points: u64,
    pub level: u64,
    pub points_to_next_level: u64,
    /// 0-100 bar fill
    pub level_progress: u64,
}

impl PlayerLevel {
    pub fn new(points: u64) -> Self {
        Self {
            points,
            level: LevelCalculator::level(points),
            points_to_next_level: LevelCalculator::points_to_next_level(points),
            level_progress: LevelCalculator::level_progress(points),
        }
    }

    /// Points at which the next level starts
    pub fn next_level_points(&self) -> u64 {
        self.level.saturating_mul(LevelCalculator::POINTS_PER_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_boundaries() {
        assert_eq!(LevelCalculator::level(0), 1);
        assert_eq!(LevelCalculator::level(99), 1);
        assert_eq!(LevelCalculator::level(100), 2);
        assert_eq!(LevelCalculator::level(150), 2);
        assert_eq!(LevelCalculator::level(250), 3);

        assert_eq!(LevelCalculator::points_to_next_level(0), 100);
        assert_eq!(LevelCalculator::points_to_next_level(100), 100);
        assert_eq!(LevelCalculator::points_to_next_level(150), 50);

        assert_eq!(LevelCalculator::level_progress(150), 50);
        assert_eq!(LevelCalculator::level_progress(200), 0);
    }

    #[test]
    fn test_player_level_projection() {
        let level = PlayerLevel::new(150);
        assert_eq!(level.level, 2);
        assert_eq!(level.points_to_next_level, 50);
        assert_eq!(level.level_progress, 50);
        assert_eq!(level.next_level_points(), 200);
    }

    #[test]
    fn test_top_of_range_does_not_overflow() {
        let top = PlayerLevel::new(u64::MAX);
        assert_eq!(top.level, u64::MAX / 100 + 1);
        assert_eq!(top.points_to_next_level, 0);
        assert_eq!(top.level_progress, u64::MAX % 100);
        assert_eq!(top.next_level_points(), u64::MAX);

        assert_eq!(LevelCalculator::points_to_next_level(u64::MAX - 50), 50);
    }

    proptest! {
        #[test]
        fn prop_level_is_monotone(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(LevelCalculator::level(lo) <= LevelCalculator::level(hi));
        }

        #[test]
        fn prop_points_to_next_completes_the_level(points in 0u64..1_000_000) {
            let level = LevelCalculator::level(points);
            prop_assert_eq!(LevelCalculator::points_to_next_level(points) + points, level * 100);
            prop_assert!(LevelCalculator::level_progress(points) < 100);
        }
    }
}
