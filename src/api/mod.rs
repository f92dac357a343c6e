//! Parameter schema and request sanitization for serving workflows.

pub mod params;
pub mod validate;

pub use params::{endpoint_config, extract_parameters, ApiParameter, EndpointConfig, ParameterKind};
pub use validate::{sanitize_prompt, validate_batch_size, validate_image_dimensions};
