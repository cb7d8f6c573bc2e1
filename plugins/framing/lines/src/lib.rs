use rmsg_api::{FrameError, Framing};

/// Кадры, разделённые `\n`. При декодировании `\r` в конце строки отбрасывается.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinesFraming {
    /// Максимальная длина строки в байтах (0 = без ограничения).
    max_length: usize,
}

impl LinesFraming {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Framing for LinesFraming {
    fn decode(&self, buf: &[u8]) -> Result<Option<(Vec<u8>, usize)>, FrameError> {
        let pos = match buf.iter().position(|&b| b == b'\n') {
            Some(p) => p,
            None => {
                // Полной строки нет, проверяем max_length
                if self.max_length > 0 && buf.len() > self.max_length {
                    return Err(FrameError::Unterminated { len: buf.len(), max: self.max_length });
                }
                return Ok(None);
            }
        };

        let consumed = pos + 1; // включая \n

        let line = &buf[..pos];
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if self.max_length > 0 && line.len() > self.max_length {
            return Err(FrameError::LineTooLong { len: line.len(), max: self.max_length });
        }

        Ok(Some((line.to_vec(), consumed)))
    }

    fn encode(&self, data: &[u8], buf: &mut Vec<u8>) {
        buf.extend_from_slice(data);
        buf.push(b'\n');
    }
}
