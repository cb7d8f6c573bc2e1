use rmsg_api::{RangeSpec, MAX_STEP_COUNT};

use crate::GenerateError;

// ═══════════════════════════════════════════════════════════════
//  Degree range
// ═══════════════════════════════════════════════════════════════

/// Значения в милли-градусах `min, min+step, ...` до `max`; если шаг не
/// попадает в `max`, последним идёт сам `max`.
///
/// Считается в `i128`, поэтому у границ `i64` ничего не переполняется;
/// каждое значение лежит в `[min, max]`.
#[derive(Debug, Clone)]
pub struct DegreeRange {
    min: i128,
    step: i128,
    max: i64,
    /// Сколько значений вида `min + k*step`.
    regular: usize,
    /// Добавлять ли замыкающий `max` после регулярных значений.
    closing: bool,
    pos: usize,
}

impl DegreeRange {
    fn single(value: i64) -> Self {
        Self {
            min: value as i128,
            step: 0,
            max: value,
            regular: 1,
            closing: false,
            pos: 0,
        }
    }

    fn total(&self) -> usize {
        self.regular + usize::from(self.closing)
    }
}

impl Iterator for DegreeRange {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let pos = self.pos;
        if pos >= self.total() {
            return None;
        }
        self.pos += 1;
        if pos < self.regular {
            // pos <= (max - min) / step, выхода за диапазон нет
            Some((self.min + pos as i128 * self.step) as i64)
        } else {
            Some(self.max)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.total() - self.pos;
        (n, Some(n))
    }
}

impl ExactSizeIterator for DegreeRange {}

/// Проверяет `range` и раскладывает последовательность градусов.
///
/// Порядок проверок: перевёрнутый диапазон, отрицательный шаг, одна точка
/// (нулевой шаг допустим), нулевой шаг, число шагов больше `i32::MAX`.
pub fn generate_degrees(range: &RangeSpec) -> Result<DegreeRange, GenerateError> {
    let min = range.min as i128;
    let max = range.max as i128;
    let span = max - min;

    if span < 0 {
        return Err(GenerateError::RangeInverted { min: range.min, max: range.max });
    }
    // Отрицательный шаг недопустим при любом диапазоне, даже из одной точки
    if range.step < 0 {
        return Err(GenerateError::StepLessThanZero { step: range.step });
    }
    if span == 0 {
        return Ok(DegreeRange::single(range.min));
    }
    if range.step == 0 {
        return Err(GenerateError::StepIsZero);
    }

    let step = range.step as i128;
    let steps = span / step;
    if steps > MAX_STEP_COUNT {
        return Err(GenerateError::TooManySteps { steps, limit: MAX_STEP_COUNT });
    }

    let regular = usize::try_from(steps + 1)
        .map_err(|_| GenerateError::TooManySteps { steps, limit: MAX_STEP_COUNT })?;
    let closing = min + steps * step < max;

    tracing::debug!(
        min = range.min,
        max = range.max,
        step = range.step,
        records = regular + usize::from(closing),
        "degree range laid out"
    );

    Ok(DegreeRange {
        min,
        step,
        max: range.max,
        regular,
        closing,
        pos: 0,
    })
}
