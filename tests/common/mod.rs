//! Test helpers shared by the integration tests.
//!
//! Every external command goes through [`ScriptedRunner`], so no test touches
//! the real container runtime or the network.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use tempfile::TempDir;
use tower::util::ServiceExt;

use pipvr::config::paths::PathsConfig;
use pipvr::models::{ServiceSelection, StackConfig};
use pipvr::services::renderer::RenderResult;
use pipvr::services::runner::{CommandOutput, CommandSpec, RunError};
use pipvr::services::{
    BuiltinRenderer, CommandRunner, ConfigStore, DockerClient, HostInstaller, InstallLog,
    ManifestRenderer, Orchestrator, RunId, RunJournal,
};
use pipvr::state::AppState;

// ============================================================================
// Scripted command runner
// ============================================================================

#[derive(Debug, Clone)]
pub enum Reply {
    Output(CommandOutput),
    TimedOut,
}

/// Answers commands by matching `program args...` against registered prefixes.
///
/// The first matching rule wins; unmatched commands get the default reply.
pub struct ScriptedRunner {
    rules: Mutex<Vec<(Vec<String>, Reply)>>,
    default: Reply,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    /// Every command succeeds with empty output unless a rule says otherwise
    pub fn new() -> Self {
        Self::with_default(Reply::Output(CommandOutput::ok("")))
    }

    pub fn with_default(default: Reply) -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            default,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on(self, prefix: &[&str], reply: Reply) -> Self {
        self.rules
            .lock()
            .push((prefix.iter().map(|s| s.to_string()).collect(), reply));
        self
    }

    pub fn ok(self, prefix: &[&str], stdout: &str) -> Self {
        self.on(prefix, Reply::Output(CommandOutput::ok(stdout)))
    }

    pub fn fail(self, prefix: &[&str], stderr: &str) -> Self {
        self.on(prefix, Reply::Output(CommandOutput::failed(1, stderr)))
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().clone()
    }

    /// Recorded calls rendered as `program arg arg`
    pub fn command_lines(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|spec| {
                std::iter::once(spec.program.as_str())
                    .chain(spec.args.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    pub fn count_matching(&self, prefix: &[&str]) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|spec| matches_prefix(spec, prefix))
            .count()
    }
}

fn matches_prefix<S: AsRef<str>>(spec: &CommandSpec, prefix: &[S]) -> bool {
    let words = std::iter::once(&spec.program).chain(spec.args.iter());
    prefix.len() <= spec.args.len() + 1
        && words
            .zip(prefix.iter())
            .all(|(word, expected)| word == expected.as_ref())
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec, limit: Duration) -> Result<CommandOutput, RunError> {
        self.calls.lock().push(spec.clone());

        let reply = self
            .rules
            .lock()
            .iter()
            .find(|(prefix, _)| matches_prefix(spec, prefix))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default.clone());

        match reply {
            Reply::Output(output) => Ok(output),
            Reply::TimedOut => Err(RunError::TimedOut {
                command: spec.to_string(),
                timeout: limit,
            }),
        }
    }
}

// ============================================================================
// Renderers
// ============================================================================

/// Always reports a generator failure
pub struct FailingRenderer(pub &'static str);

#[async_trait]
impl ManifestRenderer for FailingRenderer {
    async fn render(&self, _: &StackConfig, _: &ServiceSelection) -> RenderResult {
        RenderResult::failed(self.0)
    }
}

/// Panics mid-render
pub struct PanickingRenderer;

#[async_trait]
impl ManifestRenderer for PanickingRenderer {
    async fn render(&self, _: &StackConfig, _: &ServiceSelection) -> RenderResult {
        panic!("renderer exploded")
    }
}

/// Never finishes, keeping a run in flight for as long as the test needs
pub struct StalledRenderer;

#[async_trait]
impl ManifestRenderer for StalledRenderer {
    async fn render(&self, _: &StackConfig, _: &ServiceSelection) -> RenderResult {
        std::future::pending().await
    }
}

/// Renders successfully, but only after the given delay
pub struct SlowRenderer(pub Duration);

#[async_trait]
impl ManifestRenderer for SlowRenderer {
    async fn render(&self, _: &StackConfig, _: &ServiceSelection) -> RenderResult {
        tokio::time::sleep(self.0).await;
        RenderResult::ok("Generated docker-compose.yml")
    }
}

// ============================================================================
// State builders
// ============================================================================

/// Everything a test needs; the temp dir lives as long as this does
pub struct TestEnv {
    pub dir: TempDir,
    pub paths: PathsConfig,
    pub runner: Arc<ScriptedRunner>,
    pub state: AppState,
}

impl TestEnv {
    pub fn app(&self) -> Router {
        pipvr::endpoints::create_router(self.state.clone())
    }

    pub fn log_contents(&self) -> String {
        self.state.install_log.read_all().unwrap()
    }
}

/// State over a fresh temp dir, with every command succeeding and the builtin renderer
pub fn build_app_state() -> TestEnv {
    build_state_with(ScriptedRunner::new(), None)
}

/// State over a fresh temp dir. `renderer` defaults to the builtin one.
pub fn build_state_with(
    runner: ScriptedRunner,
    renderer: Option<Arc<dyn ManifestRenderer>>,
) -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let paths = PathsConfig::rooted_at(dir.path());

    let store = ConfigStore::file(&paths);
    store.seed_defaults().unwrap();

    let runner = Arc::new(runner);
    let renderer =
        renderer.unwrap_or_else(|| Arc::new(BuiltinRenderer::new(paths.manifest())));
    let state = AppState::new(paths.clone(), store, runner.clone(), renderer);

    TestEnv {
        dir,
        paths,
        runner,
        state,
    }
}

/// An orchestrator wired the same way `AppState` wires it, plus a fresh journal
pub fn build_orchestrator(env: &TestEnv, renderer: Arc<dyn ManifestRenderer>) -> Orchestrator {
    let runner: Arc<dyn CommandRunner> = env.runner.clone();
    Orchestrator::new(
        env.state.store.clone(),
        renderer,
        DockerClient::new(runner.clone()),
        HostInstaller::new(runner, env.paths.work_dir()),
        env.paths.clone(),
    )
}

pub fn new_journal(env: &TestEnv) -> RunJournal {
    RunJournal::new(InstallLog::new(env.paths.installation_log()), RunId::new())
}

// ============================================================================
// HTTP helpers
// ============================================================================

pub async fn send(app: Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, String) {
    let builder = Request::builder().uri(uri).method(method);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).into_owned())
}

pub async fn send_json(
    app: Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let (status, body) = send(app, method, uri, body).await;
    let json = serde_json::from_str(&body)
        .unwrap_or_else(|e| panic!("response to {} {} is not JSON ({}): {}", method, uri, e, body));
    (status, json)
}
