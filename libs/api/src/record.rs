// ════════════════════════════════════════════════════════════════
//  Constants
// ════════════════════════════════════════════════════════════════

pub const MILLI_DEGREES_PER_DEGREE: f64 = 1000.0;

/// One full circle, the default upper bound.
pub const DEFAULT_MAX_MILLI_DEGREES: i64 = 360_000;

/// Largest number of steps a range may span.
pub const MAX_STEP_COUNT: i128 = i32::MAX as i128;

// ════════════════════════════════════════════════════════════════
//  Record
// ════════════════════════════════════════════════════════════════

/// One calibration pair: a position in milli-degrees and the actuator value
/// for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub degree: i64,
    pub mcu_value: i64,
}

impl Record {
    pub fn new(degree: i64, mcu_value: i64) -> Self {
        Self { degree, mcu_value }
    }

    /// Text fields in sink order: degree first.
    pub fn fields(&self) -> [String; 2] {
        [self.degree.to_string(), self.mcu_value.to_string()]
    }
}

/// Milli-degrees as decimal degrees.
pub fn milli_to_degrees(milli_degrees: i64) -> f64 {
    milli_degrees as f64 / MILLI_DEGREES_PER_DEGREE
}

// ════════════════════════════════════════════════════════════════
//  Generation parameters
// ════════════════════════════════════════════════════════════════

/// Inclusive milli-degree range and increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub min: i64,
    pub max: i64,
    pub step: i32,
}

impl Default for RangeSpec {
    fn default() -> Self {
        Self { min: 0, max: DEFAULT_MAX_MILLI_DEGREES, step: 100 }
    }
}

/// MCU start value and per-record increment for linear mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearSpec {
    pub start: i64,
    pub step: i64,
}

impl Default for LinearSpec {
    fn default() -> Self {
        Self { start: 0, step: 2 }
    }
}
