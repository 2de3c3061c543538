use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, VerdictError>;

#[derive(Error, Debug)]
pub enum VerdictError {
  /// A local resource the run cannot start without
  #[error("Expected {resource} not found at: {}", .path.display())]
  MissingResource { resource: String, path: PathBuf },

  #[error("Invalid configuration: {message}")]
  Config { message: String },

  #[error("Could not extract {field}: {message}")]
  Extraction { field: String, message: String },

  #[error("Remote service returned {status}: {body}")]
  Remote { status: u16, body: String },

  #[error("Malformed structured response: {message}")]
  MalformedResponse { message: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Csv(#[from] csv::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),

  #[error(transparent)]
  Yaml(#[from] serde_yaml::Error),

  #[error(transparent)]
  Http(#[from] reqwest::Error),
}

impl VerdictError {
  pub fn missing_resource(resource: impl Into<String>, path: impl AsRef<Path>) -> Self {
    Self::MissingResource { resource: resource.into(), path: path.as_ref().to_path_buf() }
  }

  pub fn config(message: impl Into<String>) -> Self {
    Self::Config { message: message.into() }
  }

  pub fn extraction(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Extraction { field: field.into(), message: message.into() }
  }

  pub fn remote(status: u16, body: impl Into<String>) -> Self {
    Self::Remote { status, body: body.into() }
  }

  pub fn malformed_response(message: impl Into<String>) -> Self {
    Self::MalformedResponse { message: message.into() }
  }

  /// Startup-fatal errors abort the run before any record is processed
  pub fn is_fatal(&self) -> bool {
    matches!(self, Self::MissingResource { .. } | Self::Config { .. })
  }
}
