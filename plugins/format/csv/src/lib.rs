mod parser;

use std::io::{BufWriter, Write};

use rmsg_api::RecordSink;

pub use parser::{parse_delimiter, DelimiterError};

// ═══════════════════════════════════════════════════════════════
//  Config
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    pub delimiter: String,
    /// Terminate lines with `\r\n` instead of `\n`.
    pub crlf: bool,
    pub quoting: bool,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            crlf: true,
            quoting: true,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  CsvRecordSink
// ═══════════════════════════════════════════════════════════════

/// Buffered delimited-text writer, one line per record.
pub struct CsvRecordSink<W: Write> {
    out: BufWriter<W>,
    delimiter: char,
    crlf: bool,
    quoting: bool,
    line: String,
    written: u64,
}

impl<W: Write> CsvRecordSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            out: BufWriter::new(writer),
            delimiter: ',',
            crlf: true,
            quoting: true,
            line: String::with_capacity(64),
            written: 0,
        }
    }

    pub fn from_config(writer: W, cfg: &CsvConfig) -> Result<Self, DelimiterError> {
        let delimiter = parse_delimiter(&cfg.delimiter)?;
        Ok(Self {
            delimiter,
            crlf: cfg.crlf,
            quoting: cfg.quoting,
            ..Self::new(writer)
        })
    }

    /// Records written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and hand back the underlying writer.
    pub fn into_inner(self) -> std::io::Result<W> {
        self.out.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write> RecordSink for CsvRecordSink<W> {
    fn write(&mut self, fields: &[&str]) -> std::io::Result<()> {
        self.line.clear();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.line.push(self.delimiter);
            }
            parser::push_field(&mut self.line, field, self.delimiter, self.quoting);
        }
        self.line.push_str(if self.crlf { "\r\n" } else { "\n" });
        self.out.write_all(self.line.as_bytes())?;
        self.written += 1;
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()?;
        tracing::debug!(records = self.written, "csv sink flushed");
        Ok(())
    }
}
