//! Catch odds for Pokeball throws
//!
//! The chance of a catch falls linearly with a Pokemon's base experience: from
//! 70% at 0 down to 20% at 255, then more gently down to 15% at 635, the
//! highest base experience in the games (Blissey).

/// Catch probability at zero base experience
const MAX_PROBABILITY: f64 = 0.7;

/// Catch probability at the end of the common range
const MID_PROBABILITY: f64 = 0.2;

/// Catch probability at the highest known base experience
const MIN_PROBABILITY: f64 = 0.15;

/// Last base experience value of the common range
const COMMON_RANGE_END: u32 = 255;

/// Width of the rare range, 256 through 635
const RARE_RANGE_WIDTH: f64 = 379.0;

/// Returns the probability (0.0 - 1.0) of catching a Pokemon
///
/// # Arguments
/// * `base_experience` - The Pokemon's base experience from PokeAPI
pub fn catch_probability(base_experience: u32) -> f64 {
    if base_experience <= COMMON_RANGE_END {
        return MAX_PROBABILITY
            - f64::from(base_experience) * (MAX_PROBABILITY - MID_PROBABILITY)
                / f64::from(COMMON_RANGE_END);
    }

    MID_PROBABILITY
        - f64::from(base_experience - (COMMON_RANGE_END + 1)) * (MID_PROBABILITY - MIN_PROBABILITY)
            / RARE_RANGE_WIDTH
}

/// Decides a throw given a uniform roll in `[0, 1)`
pub fn is_caught(base_experience: u32, roll: f64) -> bool {
    roll < catch_probability(base_experience)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn test_probability_at_zero_experience() {
        assert!((catch_probability(0) - 0.7).abs() < TOLERANCE);
    }

    #[test]
    fn test_probability_at_common_range_end() {
        assert!((catch_probability(255) - 0.2).abs() < TOLERANCE);
        assert!((catch_probability(256) - 0.2).abs() < TOLERANCE);
    }

    #[test]
    fn test_probability_for_blissey() {
        assert!((catch_probability(635) - 0.15).abs() < TOLERANCE);
    }

    #[test]
    fn test_probability_never_increases() {
        let mut previous = catch_probability(0);
        for xp in 1..=635 {
            let current = catch_probability(xp);
            assert!(current <= previous + TOLERANCE, "increase at {}", xp);
            previous = current;
        }
    }

    #[test]
    fn test_is_caught_compares_roll() {
        // pikachu, base experience 112
        let p = catch_probability(112);
        assert!(is_caught(112, 0.0));
        assert!(is_caught(112, p - 0.01));
        assert!(!is_caught(112, p));
        assert!(!is_caught(112, 0.99));
    }
}
