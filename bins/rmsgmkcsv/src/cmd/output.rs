use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use super::error::CliError;

/// Куда пишутся записи CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    /// `truncate` создаёт или обнуляет файл; иначе существующий файл
    /// открывается только на дозапись.
    File { path: PathBuf, truncate: bool },
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stdout => f.write_str("<stdout>"),
            Destination::File { path, .. } => write!(f, "'{}'", path.display()),
        }
    }
}

impl Destination {
    pub fn open(&self) -> Result<Box<dyn Write>, CliError> {
        match self {
            Destination::Stdout => Ok(Box::new(std::io::stdout().lock())),
            Destination::File { path, truncate: true } => {
                let f = std::fs::File::create(path).map_err(|e| CliError::Output {
                    context: "cannot create",
                    target: self.to_string(),
                    source: e,
                })?;
                Ok(Box::new(f))
            }
            Destination::File { path, truncate: false } => {
                let f = std::fs::OpenOptions::new()
                    .append(true)
                    .open(path)
                    .map_err(|e| CliError::Output {
                        context: "cannot open for write-only append access (use --truncate to create it)",
                        target: self.to_string(),
                        source: e,
                    })?;
                Ok(Box::new(f))
            }
        }
    }
}
