use rmsg_pipeline::GenerateError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("config: {0}")]
    Config(String),

    #[error(
        "no program to execute; give it after `--`, e.g. \
         `rmsgmkcsv create exec -- python3 ./example-script.py`"
    )]
    NoProgram,

    #[error("{context} {target}: {source}")]
    Output {
        context: &'static str,
        target: String,
        source: std::io::Error,
    },

    #[error("{0}")]
    Generate(#[from] GenerateError),
}
