//! Container runtime seam
//!
//! The gateway only talks to the daemon through [`ContainerRuntime`]. Isolation
//! and resource enforcement are the runtime's job.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

/// Combined stdout/stderr chunks as they arrive from the runtime
pub type OutputStream = BoxStream<'static, Result<Vec<u8>>>;

/// Everything the runtime needs to create one execution container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Unique container name
    pub name: String,
    /// Image reference
    pub image: String,
    /// Interpreter argv
    pub cmd: Vec<String>,
    /// Hard memory limit in bytes
    pub memory_bytes: i64,
    /// Relative CPU weight
    pub cpu_shares: i64,
    /// Disable all networking
    pub network_disabled: bool,
}

/// Identifier of a created container
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerHandle {
    pub id: String,
}

impl ContainerHandle {
    pub fn new(id: impl Into<String>) -> Self {
        ContainerHandle { id: id.into() }
    }
}

impl std::fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Docker ids are 64 hex chars; the short form is what `docker ps` shows
        let short = self.id.get(..12).unwrap_or(&self.id);
        write!(f, "{}", short)
    }
}

/// Operations consumed from the container runtime daemon
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Get the runtime name
    fn name(&self) -> &str;

    /// Whether an image matching `reference` is present locally
    async fn image_exists(&self, reference: &str) -> Result<bool>;

    /// Pull an image, resolving once the progress stream completes
    async fn pull_image(&self, reference: &str) -> Result<()>;

    /// Create (but do not start) a container
    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerHandle>;

    /// Attach to the container's combined output
    async fn attach_output(&self, container: &ContainerHandle) -> Result<OutputStream>;

    /// Start a created container
    async fn start_container(&self, container: &ContainerHandle) -> Result<()>;

    /// Block until the container stops. `None` means no exit status was reported.
    async fn wait_container(&self, container: &ContainerHandle) -> Result<Option<i64>>;

    /// Force-remove a container, running or not
    async fn remove_container(&self, container: &ContainerHandle) -> Result<()>;
}
