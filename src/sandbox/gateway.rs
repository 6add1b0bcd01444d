//! Execution gateway
//!
//! Runs one request end to end: image check, optional pull, create, attach,
//! start, wait, remove. The container never outlives the call.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SandboxConfig;
use crate::error::{Error, Result};
use crate::sandbox::executor::{ExecutionOutput, ExecutionRequest, Language, LanguageTable};
use crate::sandbox::runtime::{ContainerHandle, ContainerRuntime, ContainerSpec, OutputStream};

/// How long to keep draining output after the container exits
const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Validates requests and drives a [`ContainerRuntime`] through one run each
pub struct ExecutionGateway {
    runtime: Arc<dyn ContainerRuntime>,
    languages: LanguageTable,
    memory_bytes: i64,
    cpu_shares: i64,
    run_timeout: Duration,
}

impl ExecutionGateway {
    /// Create a gateway from sandbox configuration
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: &SandboxConfig) -> Result<Self> {
        let memory_bytes = config.memory_limit_bytes().ok_or_else(|| {
            Error::Config(format!("Invalid memory limit: {}", config.memory_limit))
        })?;

        Ok(ExecutionGateway {
            runtime,
            languages: LanguageTable::from_config(config)?,
            memory_bytes,
            cpu_shares: config.cpu_shares,
            run_timeout: config.run_timeout,
        })
    }

    /// Name of the backing runtime
    pub fn runtime_name(&self) -> &str {
        self.runtime.name()
    }

    /// Deadline applied to the run phase
    pub fn run_timeout(&self) -> Duration {
        self.run_timeout
    }

    /// Execute a request and return its trimmed combined output
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionOutput> {
        let (name, code) = request.fields()?;
        let (language, image) = self.languages.resolve(name)?;

        self.ensure_image(image).await?;

        let spec = self.container_spec(language, image, code);
        let container = self.runtime.create_container(&spec).await?;
        debug!("Created container {} ({}) for {}", spec.name, container, language);

        let result = self.run(&container).await;

        // Cleanup never changes the outcome
        match self.runtime.remove_container(&container).await {
            Ok(()) => debug!("Removed container {}", container),
            Err(e) => warn!("Failed to remove container {}: {}", container, e),
        }

        result
    }

    fn container_spec(&self, language: Language, image: &str, code: &str) -> ContainerSpec {
        ContainerSpec {
            name: format!("sandbox-exec-{}", uuid::Uuid::new_v4()),
            image: image.to_string(),
            cmd: language.command(code),
            memory_bytes: self.memory_bytes,
            cpu_shares: self.cpu_shares,
            network_disabled: true,
        }
    }

    async fn ensure_image(&self, image: &str) -> Result<()> {
        if self.runtime.image_exists(image).await? {
            debug!("Image {} present locally", image);
            return Ok(());
        }

        info!("Pulling image: {}", image);
        self.runtime.pull_image(image).await?;
        info!("Image pulled: {}", image);

        Ok(())
    }

    async fn run(&self, container: &ContainerHandle) -> Result<ExecutionOutput> {
        let output = self.runtime.attach_output(container).await?;
        let collector = OutputCollector::spawn(output);

        self.runtime.start_container(container).await?;
        let start = Instant::now();

        let status = tokio::time::timeout(self.run_timeout, self.runtime.wait_container(container)).await;
        let exit_code = match status {
            Ok(Ok(Some(code))) => code,
            Ok(Ok(None)) | Err(_) => {
                warn!(
                    "Container {} produced no exit status within {:?}",
                    container, self.run_timeout
                );
                return Err(Error::Timeout(self.run_timeout));
            }
            Ok(Err(e)) => return Err(e),
        };
        let execution_time = start.elapsed();

        let raw = collector.finish(OUTPUT_DRAIN_GRACE).await;
        debug!(
            "Container {} exited with {} after {:?} ({} bytes of output)",
            container,
            exit_code,
            execution_time,
            raw.len()
        );

        Ok(ExecutionOutput::from_raw(&raw, exit_code, execution_time))
    }
}

/// Background task draining one container's output into a private buffer
struct OutputCollector {
    buffer: Arc<Mutex<Vec<u8>>>,
    handle: JoinHandle<()>,
}

impl OutputCollector {
    fn spawn(mut output: OutputStream) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);

        let handle = tokio::spawn(async move {
            while let Some(chunk) = output.next().await {
                match chunk {
                    Ok(bytes) => {
                        if let Ok(mut buf) = sink.lock() {
                            buf.extend_from_slice(&bytes);
                        }
                    }
                    Err(e) => {
                        warn!("Error reading container output: {}", e);
                        break;
                    }
                }
            }
        });

        OutputCollector { buffer, handle }
    }

    /// Wait for the stream to end (bounded by `grace`) and take the buffer
    async fn finish(mut self, grace: Duration) -> Vec<u8> {
        if tokio::time::timeout(grace, &mut self.handle).await.is_err() {
            warn!("Output stream still open after {:?}, using what was collected", grace);
        }

        let mut buf = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *buf)
    }
}

impl Drop for OutputCollector {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::runtime::testing::{FakeRun, FakeRuntime, Step};

    fn config() -> SandboxConfig {
        SandboxConfig {
            run_timeout: Duration::from_millis(200),
            ..Default::default()
        }
    }

    fn gateway(runtime: &FakeRuntime) -> ExecutionGateway {
        ExecutionGateway::new(Arc::new(runtime.clone()), &config()).unwrap()
    }

    fn echo_code(spec: &ContainerSpec) -> FakeRun {
        FakeRun::exits(0, &format!("{}\n", spec.cmd[2]))
    }

    #[tokio::test]
    async fn test_python_run_returns_trimmed_output() {
        let runtime = FakeRuntime::new(|_| FakeRun::exits(0, "2\n"));
        let gateway = gateway(&runtime);

        let out = gateway
            .execute(&ExecutionRequest::new("python", "print(1+1)"))
            .await
            .unwrap();

        assert_eq!(out.output, "2");
        assert_eq!(out.exit_code, 0);

        let created = runtime.created();
        assert_eq!(created.len(), 1);
        let spec = &created[0];
        assert_eq!(spec.image, "python:3.9-slim");
        assert_eq!(spec.cmd, vec!["python", "-c", "print(1+1)"]);
        assert_eq!(spec.memory_bytes, 256 * 1024 * 1024);
        assert_eq!(spec.cpu_shares, 512);
        assert!(spec.network_disabled);
        assert!(spec.name.starts_with("sandbox-exec-"));
        assert_eq!(runtime.live(), 0);
    }

    #[tokio::test]
    async fn test_combined_output_across_chunks() {
        let runtime = FakeRuntime::new(|_| {
            FakeRun::exits(1, "").with_chunks(&[
                b"out\n".as_slice(),
                b"Traceback (most recent call last):\n".as_slice(),
                b"  boom\n\n".as_slice(),
            ])
        });
        let gateway = gateway(&runtime);

        let out = gateway
            .execute(&ExecutionRequest::new("javascript", "throw 1"))
            .await
            .unwrap();

        assert_eq!(out.output, "out\nTraceback (most recent call last):\n  boom");
        assert_eq!(out.exit_code, 1);
        assert_eq!(runtime.created()[0].image, "node:18-alpine");
        assert_eq!(runtime.live(), 0);
    }

    #[tokio::test]
    async fn test_multibyte_split_across_chunks() {
        let snowman = "☃".as_bytes();
        let (a, b) = snowman.split_at(1);
        let (a, b) = (a.to_vec(), b.to_vec());
        let runtime = FakeRuntime::new(move |_| FakeRun::exits(0, "").with_chunks(&[a.as_slice(), b.as_slice()]));

        let out = gateway(&runtime)
            .execute(&ExecutionRequest::new("python", "print('☃')"))
            .await
            .unwrap();
        assert_eq!(out.output, "☃");
    }

    #[tokio::test]
    async fn test_validation_creates_nothing() {
        let runtime = FakeRuntime::new(echo_code);
        let gateway = gateway(&runtime);

        let err = gateway
            .execute(&ExecutionRequest { language: Some("python".into()), code: None })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let err = gateway
            .execute(&ExecutionRequest::new("brainfuck", "+++"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedLanguage(_)));

        assert!(runtime.created().is_empty());
        assert!(runtime.pulled().is_empty());
    }

    #[tokio::test]
    async fn test_pull_only_when_missing() {
        let runtime = FakeRuntime::new(echo_code).with_image("node:18-alpine");
        let gateway = gateway(&runtime);

        gateway
            .execute(&ExecutionRequest::new("javascript", "1"))
            .await
            .unwrap();
        assert!(runtime.pulled().is_empty());

        gateway
            .execute(&ExecutionRequest::new("python", "1"))
            .await
            .unwrap();
        gateway
            .execute(&ExecutionRequest::new("python", "2"))
            .await
            .unwrap();
        assert_eq!(runtime.pulled(), vec!["python:3.9-slim".to_string()]);
    }

    #[tokio::test]
    async fn test_pull_failure_creates_nothing() {
        let runtime = FakeRuntime::new(echo_code).failing_at(Step::Pull);
        let err = gateway(&runtime)
            .execute(&ExecutionRequest::new("python", "1"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Container(_)));
        assert!(runtime.created().is_empty());
    }

    #[tokio::test]
    async fn test_hanging_run_times_out_and_is_removed() {
        let runtime = FakeRuntime::new(|_| FakeRun::hangs("partial"));
        let gateway = gateway(&runtime);

        let err = gateway
            .execute(&ExecutionRequest::new("python", "while True: pass"))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(err.to_string().contains("timed out"));
        assert_eq!(runtime.removed().len(), 1);
        assert_eq!(runtime.live(), 0);
    }

    #[tokio::test]
    async fn test_missing_exit_status_is_timeout() {
        let runtime = FakeRuntime::new(|_| FakeRun::no_status());
        let err = gateway(&runtime)
            .execute(&ExecutionRequest::new("python", "1"))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(runtime.live(), 0);
    }

    #[tokio::test]
    async fn test_failures_after_create_still_clean_up() {
        for step in [Step::Attach, Step::Start, Step::Wait] {
            let runtime = FakeRuntime::new(echo_code).failing_at(step);
            let err = gateway(&runtime)
                .execute(&ExecutionRequest::new("python", "1"))
                .await
                .unwrap_err();

            assert!(!err.is_client_error(), "{:?}", step);
            assert_eq!(runtime.created().len(), 1, "{:?}", step);
            assert_eq!(runtime.live(), 0, "{:?}", step);
        }
    }

    #[tokio::test]
    async fn test_remove_failure_keeps_result() {
        let runtime = FakeRuntime::new(|_| FakeRun::exits(0, "ok")).failing_at(Step::Remove);
        let out = tokio_test::assert_ok!(
            gateway(&runtime)
                .execute(&ExecutionRequest::new("python", "print('ok')"))
                .await
        );

        assert_eq!(out.output, "ok");
        assert_eq!(runtime.live(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_runs_keep_separate_buffers() {
        let runtime = FakeRuntime::new(|spec| {
            let delay = if spec.image.starts_with("python") { 50 } else { 10 };
            echo_code(spec).with_delay(Duration::from_millis(delay))
        });
        let gateway = Arc::new(gateway(&runtime));

        let mut handles = Vec::new();
        for i in 0..8 {
            let gateway = Arc::clone(&gateway);
            let language = if i % 2 == 0 { "python" } else { "javascript" };
            handles.push(tokio::spawn(async move {
                let code = format!("{}-{}", language, i);
                let out = gateway
                    .execute(&ExecutionRequest::new(language, code.clone()))
                    .await
                    .unwrap();
                (code, out.output)
            }));
        }

        for handle in handles {
            let (code, output) = handle.await.unwrap();
            assert_eq!(code, output);
        }
        assert_eq!(runtime.created().len(), 8);
        assert_eq!(runtime.live(), 0);
    }

    #[test]
    fn test_invalid_memory_limit_rejected() {
        let runtime = FakeRuntime::new(echo_code);
        let config = SandboxConfig {
            memory_limit: "huge".to_string(),
            ..Default::default()
        };
        assert!(ExecutionGateway::new(Arc::new(runtime), &config).is_err());
    }
}
