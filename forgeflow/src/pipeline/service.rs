use super::orchestrator::Orchestrator;
use super::request::{PipelineRequest, PipelineResult};
use crate::core::{BACKEND_SOURCE, FRONTEND_SOURCE};
use crate::errors::{ArtifactError, ServiceError};
use crate::store::ArtifactStore;
use std::sync::Arc;
use std::time::Duration;

/// Runs pipelines and keeps their output downloadable.
///
/// After a successful run the final backend code is stored as
/// `backend-source` and the frontend as `frontend-source`. A run without
/// frontend output removes any `frontend-source` left by an earlier run.
#[derive(Debug, Clone)]
pub struct CodegenService {
    orchestrator: Arc<Orchestrator>,
    store: Arc<ArtifactStore>,
    timeout: Option<Duration>,
}

impl CodegenService {
    /// Creates a service without a pipeline timeout.
    #[must_use]
    pub fn new(orchestrator: Arc<Orchestrator>, store: Arc<ArtifactStore>) -> Self {
        Self {
            orchestrator,
            store,
            timeout: None,
        }
    }

    /// Abandons pipelines that run longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Returns the artifact store.
    #[must_use]
    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    /// Runs the pipeline and persists its output.
    pub async fn generate(&self, request: &PipelineRequest) -> Result<PipelineResult, ServiceError> {
        let result = match self.timeout {
            Some(timeout) => self.orchestrator.run_with_timeout(request, timeout).await?,
            None => self.orchestrator.run(request).await?,
        };

        match self.persist(&result).await {
            Ok(()) => Ok(result),
            Err(source) => {
                tracing::error!(error = %source, run_id = %result.run_id, "Failed to persist generated code");
                Err(ServiceError::Persist {
                    result: Box::new(result),
                    source,
                })
            }
        }
    }

    /// Reads a stored artifact.
    pub fn get_artifact(&self, name: &str) -> Result<String, ArtifactError> {
        self.store.read(name)
    }

    async fn persist(&self, result: &PipelineResult) -> Result<(), ArtifactError> {
        let store = Arc::clone(&self.store);
        let backend = result.backend_code.clone();
        let frontend = result.frontend_code.clone();

        tokio::task::spawn_blocking(move || {
            store.write(BACKEND_SOURCE, &backend)?;
            match frontend {
                Some(frontend) => store.write(FRONTEND_SOURCE, &frontend).map(drop),
                None => store.remove(FRONTEND_SOURCE).map(drop),
            }
        })
        .await
        .unwrap_or_else(|e| {
            Err(ArtifactError::Write {
                name: BACKEND_SOURCE.to_string(),
                source: std::io::Error::other(e.to_string()),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ModelGateway;
    use crate::pipeline::PipelineOptions;
    use crate::stages::StageRunner;
    use crate::testing::ScriptedChatModel;
    use crate::core::Skill;

    fn service(model: ScriptedChatModel, dir: &std::path::Path) -> CodegenService {
        let runner = StageRunner::new(ModelGateway::new(Arc::new(model)));
        let orchestrator = Arc::new(Orchestrator::new(runner, PipelineOptions::default()));
        let store = Arc::new(ArtifactStore::open(dir, Duration::from_secs(600)).unwrap());
        CodegenService::new(orchestrator, store)
    }

    #[tokio::test]
    async fn test_generate_persists_backend_only() {
        let dir = tempfile::tempdir().unwrap();
        let model = ScriptedChatModel::new()
            .with_reply(Skill::Implement, "print('counter')")
            .with_reply(Skill::Debug, "print('counter')");
        let service = service(model, dir.path());

        let result = service.generate(&PipelineRequest::new("a counter", false)).await.unwrap();

        assert_eq!(service.get_artifact(BACKEND_SOURCE).unwrap(), result.backend_code);
        assert!(service.get_artifact(FRONTEND_SOURCE).unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_generate_persists_frontend_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(ScriptedChatModel::new(), dir.path());

        let result = service.generate(&PipelineRequest::new("a counter", true)).await.unwrap();

        assert_eq!(
            service.get_artifact(FRONTEND_SOURCE).unwrap(),
            result.frontend_code.unwrap()
        );
    }

    #[tokio::test]
    async fn test_backend_only_run_clears_earlier_frontend() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(ScriptedChatModel::new(), dir.path());

        service.generate(&PipelineRequest::new("a counter", true)).await.unwrap();
        assert!(service.get_artifact(FRONTEND_SOURCE).is_ok());

        let result = service.generate(&PipelineRequest::new("a counter", false)).await.unwrap();
        assert!(result.frontend_code.is_none());
        assert_eq!(service.get_artifact(BACKEND_SOURCE).unwrap(), result.backend_code);
        assert!(service.get_artifact(FRONTEND_SOURCE).unwrap_err().is_not_found());
        assert!(!dir.path().join(FRONTEND_SOURCE).exists());
    }

    #[tokio::test]
    async fn test_persist_failure_carries_result() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(ScriptedChatModel::new(), dir.path());
        // A directory in the artifact's place makes the rename fail.
        std::fs::create_dir(dir.path().join(BACKEND_SOURCE)).unwrap();
        std::fs::write(dir.path().join(BACKEND_SOURCE).join("blocker"), "x").unwrap();

        let err = service.generate(&PipelineRequest::new("a counter", false)).await.unwrap_err();
        match err {
            ServiceError::Persist { result, source } => {
                assert!(!result.backend_code.is_empty());
                assert!(matches!(source, ArtifactError::Write { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_pipeline_failure_persists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let service = service(ScriptedChatModel::new().with_failure(Skill::Plan, "down"), dir.path());

        let err = service.generate(&PipelineRequest::new("a counter", false)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Pipeline(_)));
        assert!(service.get_artifact(BACKEND_SOURCE).unwrap_err().is_not_found());
    }
}
