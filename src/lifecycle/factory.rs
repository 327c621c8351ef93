use std::path::PathBuf;
use std::sync::Arc;

use super::error::LifecycleResult;
use crate::compute::{Compute, GcpComputeApi};

/// Builds a [`Compute`] backed by the Compute Engine REST API.
///
/// `project` falls back to the credentials file, then to the `gcloud` default.
pub async fn build_compute(
    api_base: &str,
    project: Option<String>,
    credentials: Option<PathBuf>,
) -> LifecycleResult<Compute> {
    let api = GcpComputeApi::connect(api_base, project, credentials).await?;
    tracing::info!(project = api.project(), "Using Compute Engine backend");
    Ok(Compute::new(Arc::new(api)))
}
