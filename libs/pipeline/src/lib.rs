mod error;
mod external;
mod linear;
mod range;
mod record_pipeline;

#[cfg(test)]
mod testing;

pub use error::GenerateError;
pub use external::{format_degrees, AdapterState, ExternalProcessAdapter, ExternalSpec, MAX_RESPONSE_LINE};
pub use linear::{linear_values, LinearValues};
pub use range::{generate_degrees, DegreeRange};
pub use record_pipeline::{RecordPipeline, Strategy};
