//! Level curve: `floor(sqrt(total_xp / 100))`.

const XP_PER_LEVEL_UNIT: u64 = 100;

/// Level for a given XP total. Pure function; levels are never stored.
///
/// Integer division before the square root gives the same floor as the real
/// quotient, so no floating point is involved.
pub fn level_for(total_xp: u64) -> u64 {
    (total_xp / XP_PER_LEVEL_UNIT).isqrt()
}
