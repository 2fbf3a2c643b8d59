use std::{error::Error, fmt, sync::Arc};

use crate::backend::BackendError;
use crate::params::ParamError;

pub mod metrics;
pub mod monitors;
pub mod topology;
pub mod traces;

pub use metrics::{MetricListing, SeriesTable};
pub use monitors::{MonitorDetail, MonitorReport, MonitorRow};
pub use topology::ComponentListing;

#[derive(Debug)]
pub enum ControlError {
    Param(ParamError),
    Backend {
        context: String,
        source: BackendError,
    },
}

impl ControlError {
    /// Wraps a backend failure with the operation that was attempted.
    pub fn backend(context: impl Into<String>) -> impl FnOnce(BackendError) -> Self {
        let context = context.into();
        move |source| Self::Backend { context, source }
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(err) => write!(f, "{err}"),
            Self::Backend { context, source } => write!(f, "failed to {context}: {source}"),
        }
    }
}

impl Error for ControlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Param(err) => Some(err),
            Self::Backend { source, .. } => Some(source),
        }
    }
}

impl From<ParamError> for ControlError {
    fn from(err: ParamError) -> Self {
        Self::Param(err)
    }
}

/// Query engine bound to one backend.
///
/// Each operation only requires the backend ports it actually calls.
pub struct ObservabilityControl<B> {
    backend: Arc<B>,
}

impl<B> Clone for ObservabilityControl<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
        }
    }
}

impl<B> ObservabilityControl<B> {
    pub fn new(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    pub const fn from_arc(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
