//! Shared numeric constants tying the grid's bit layout to the geometry
//! that scans it. Widening `BITS_PER_WORD` past 32 requires updating
//! [`LOG2_BITS_PER_WORD`] and [`INDEX_MASK`] together.

/// Absolute tolerance used for float-to-integer snapping, interval
/// equality, and interval/point containment widening.
pub const EPSILON: f64 = 1e-7;

/// Width, in cells, of the blocked ring surrounding the real map on
/// every side. Lets scans walk past any real row or column without a
/// bounds check.
pub const PADDING: i32 = 2;

pub const BITS_PER_WORD: u32 = 32;
pub const LOG2_BITS_PER_WORD: u32 = 5;
pub const INDEX_MASK: i32 = (BITS_PER_WORD - 1) as i32;

/// Cost of a diagonal grid step, used by the degenerate 8-connected
/// expander kept around for cost comparisons against the Anya search.
pub const ROOT_TWO: f64 = std::f64::consts::SQRT_2;
