//! Docker-backed container runtime
//!
//! Thin adapter from [`ContainerRuntime`] onto the Docker Engine API via bollard.

use async_trait::async_trait;
use bollard::container::{
    AttachContainerOptions, AttachContainerResults, Config, CreateContainerOptions, LogOutput,
    RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::image::{CreateImageOptions, ListImagesOptions};
use bollard::service::HostConfig;
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::sandbox::runtime::{ContainerHandle, ContainerRuntime, ContainerSpec, OutputStream};

/// Docker daemon client
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect with local defaults (socket or DOCKER_HOST) and verify the daemon answers
    pub async fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| Error::Container(format!("Failed to connect to Docker: {}", e)))?;

        docker
            .ping()
            .await
            .map_err(|e| Error::Container(format!("Docker ping failed: {}", e)))?;

        info!("Connected to Docker daemon");

        Ok(DockerRuntime { docker })
    }
}

/// Translate a runtime spec into a Docker create body
fn container_config(spec: &ContainerSpec) -> Config<String> {
    Config {
        image: Some(spec.image.clone()),
        cmd: Some(spec.cmd.clone()),
        attach_stdout: Some(true),
        attach_stderr: Some(true),
        tty: Some(false),
        network_disabled: Some(spec.network_disabled),
        host_config: Some(HostConfig {
            memory: Some(spec.memory_bytes),
            // Equal to memory: no swap on top of the limit
            memory_swap: Some(spec.memory_bytes),
            cpu_shares: Some(spec.cpu_shares),
            network_mode: spec.network_disabled.then(|| "none".to_string()),
            auto_remove: Some(false),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn log_bytes(output: LogOutput) -> Vec<u8> {
    match output {
        LogOutput::StdOut { message }
        | LogOutput::StdErr { message }
        | LogOutput::StdIn { message }
        | LogOutput::Console { message } => message.to_vec(),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    fn name(&self) -> &str {
        "docker"
    }

    async fn image_exists(&self, reference: &str) -> Result<bool> {
        let options = ListImagesOptions::<String> {
            filters: HashMap::from([("reference".to_string(), vec![reference.to_string()])]),
            ..Default::default()
        };

        let images = self
            .docker
            .list_images(Some(options))
            .await
            .map_err(|e| Error::Container(format!("Failed to list images: {}", e)))?;

        Ok(!images.is_empty())
    }

    async fn pull_image(&self, reference: &str) -> Result<()> {
        let options = CreateImageOptions {
            from_image: reference.to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(progress) => {
                    if let Some(error) = progress.error {
                        return Err(Error::Container(format!(
                            "Failed to pull image {}: {}",
                            reference, error
                        )));
                    }
                    if let Some(status) = progress.status {
                        debug!("Pull status: {}", status);
                    }
                }
                Err(e) => {
                    return Err(Error::Container(format!(
                        "Failed to pull image {}: {}",
                        reference, e
                    )));
                }
            }
        }

        Ok(())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<ContainerHandle> {
        let options = CreateContainerOptions {
            name: spec.name.as_str(),
            platform: None,
        };

        let response = self
            .docker
            .create_container(Some(options), container_config(spec))
            .await
            .map_err(|e| Error::Container(format!("Failed to create container: {}", e)))?;

        for warning in &response.warnings {
            debug!("Create warning for {}: {}", spec.name, warning);
        }

        Ok(ContainerHandle::new(response.id))
    }

    async fn attach_output(&self, container: &ContainerHandle) -> Result<OutputStream> {
        let options = AttachContainerOptions::<String> {
            stdout: Some(true),
            stderr: Some(true),
            stream: Some(true),
            // Replay anything written before the attach went through
            logs: Some(true),
            ..Default::default()
        };

        let AttachContainerResults { output, .. } = self
            .docker
            .attach_container(&container.id, Some(options))
            .await
            .map_err(|e| Error::Container(format!("Failed to attach to container: {}", e)))?;

        Ok(output
            .map(|item| item.map(log_bytes).map_err(Error::from))
            .boxed())
    }

    async fn start_container(&self, container: &ContainerHandle) -> Result<()> {
        self.docker
            .start_container(&container.id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| Error::Container(format!("Failed to start container: {}", e)))
    }

    async fn wait_container(&self, container: &ContainerHandle) -> Result<Option<i64>> {
        let options = WaitContainerOptions {
            condition: "not-running",
        };

        let mut stream = self.docker.wait_container(&container.id, Some(options));

        match stream.next().await {
            Some(Ok(response)) => Ok(Some(response.status_code)),
            // bollard surfaces a non-zero exit as an error; it is still an exit status
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(Some(code)),
            Some(Err(e)) => Err(Error::Container(format!("Wait failed: {}", e))),
            None => Ok(None),
        }
    }

    async fn remove_container(&self, container: &ContainerHandle) -> Result<()> {
        let options = RemoveContainerOptions {
            force: true,
            v: true,
            ..Default::default()
        };

        self.docker
            .remove_container(&container.id, Some(options))
            .await
            .map_err(|e| Error::Container(format!("Failed to remove container: {}", e)))
    }
}
