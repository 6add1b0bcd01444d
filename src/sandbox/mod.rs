//! Sandbox module - ephemeral container execution
//!
//! - executor.rs: languages, requests and results
//! - runtime.rs: the container runtime seam
//! - container.rs: Docker implementation of the runtime
//! - gateway.rs: per-request orchestration and cleanup

mod container;
mod executor;
mod gateway;
mod runtime;

pub use container::DockerRuntime;
pub use executor::{ExecutionOutput, ExecutionRequest, Language, LanguageTable};
pub use gateway::ExecutionGateway;
pub use runtime::{ContainerHandle, ContainerRuntime, ContainerSpec, OutputStream};

#[cfg(test)]
pub(crate) use runtime::testing;
