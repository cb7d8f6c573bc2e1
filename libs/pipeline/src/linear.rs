use rmsg_api::LinearSpec;

use crate::GenerateError;

/// MCU values `start, start+step, ...`, one per record.
///
/// The running value is accumulated in `i128` and narrowed to `i64` before
/// it is handed out. The first value outside `i64` yields `McuOverflow`
/// and ends the sequence.
#[derive(Debug, Clone)]
pub struct LinearValues {
    acc: i128,
    step: i128,
    remaining: usize,
}

pub fn linear_values(record_count: usize, spec: &LinearSpec) -> LinearValues {
    LinearValues {
        acc: spec.start as i128,
        step: spec.step as i128,
        remaining: record_count,
    }
}

impl Iterator for LinearValues {
    type Item = Result<i64, GenerateError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        match i64::try_from(self.acc) {
            Ok(value) => {
                self.acc += self.step;
                Some(Ok(value))
            }
            Err(_) => {
                self.remaining = 0;
                let bound = if self.acc > 0 { i64::MAX } else { i64::MIN };
                Some(Err(GenerateError::McuOverflow { value: self.acc, bound }))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}
