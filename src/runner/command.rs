//! Build runner backed by real subprocesses

use async_trait::async_trait;
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::infra::{CommandExecutor, CommandSpec, RealCommandExecutor};
use crate::snapshot::read_manifest;

use super::{BuildError, BuildRunner, BuildStep, PrepareError, PreparedBranch};

/// Longest diagnostic tail kept from a failed command
const MAX_DIAGNOSTIC_CHARS: usize = 4000;

/// Prepares branches with git and the configured install/build commands
pub struct CommandBuildRunner<CE: CommandExecutor = RealCommandExecutor> {
    settings: Arc<Settings>,
    cmd_executor: CE,
}

impl CommandBuildRunner<RealCommandExecutor> {
    /// Create a runner that spawns real processes
    pub fn new(settings: Arc<Settings>) -> Self {
        Self::with_executor(settings, RealCommandExecutor)
    }
}

impl<CE: CommandExecutor> CommandBuildRunner<CE> {
    /// Create a runner with a custom command executor (for testing)
    pub fn with_executor(settings: Arc<Settings>, cmd_executor: CE) -> Self {
        Self {
            settings,
            cmd_executor,
        }
    }

    async fn clean(&self, target_dir: &Path) -> Result<(), BuildError> {
        let io_failure = |e: std::io::Error| BuildError {
            step: BuildStep::Clean,
            exit_code: None,
            diagnostics: format!("{}: {}", target_dir.display(), e),
        };

        match tokio::fs::remove_dir_all(target_dir).await {
            Ok(()) => debug!("removed previous working directory {}", target_dir.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(io_failure(e)),
        }
        if let Some(parent) = target_dir.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_failure)?;
        }
        Ok(())
    }

    async fn run_step(&self, step: BuildStep, spec: CommandSpec) -> Result<(), BuildError> {
        debug!("{} step: {}", step, spec);

        let output = self
            .cmd_executor
            .output(&spec)
            .await
            .map_err(|e| BuildError {
                step,
                exit_code: None,
                diagnostics: format!("failed to run {}: {}", spec.program, e),
            })?;

        if output.succeeded() {
            return Ok(());
        }

        if let Some(code) = output.exit_code {
            if let Some(exception) = self.settings.build.exit_exception(step, code) {
                warn!(
                    "{} step exited with {}; accepted as success ({})",
                    step, code, exception.name
                );
                return Ok(());
            }
        }

        Err(BuildError {
            step,
            exit_code: output.exit_code,
            diagnostics: tail(&output.diagnostics(), MAX_DIAGNOSTIC_CHARS),
        })
    }

    fn configured(step: BuildStep, argv: &[String]) -> Result<CommandSpec, BuildError> {
        CommandSpec::from_argv(argv).ok_or_else(|| BuildError {
            step,
            exit_code: None,
            diagnostics: "no command configured".to_string(),
        })
    }

    fn prepared(&self, branch: &str, target_dir: &Path) -> PreparedBranch {
        let build = &self.settings.build;
        PreparedBranch {
            branch: branch.to_string(),
            working_dir: target_dir.to_path_buf(),
            manifest_path: target_dir.join(&build.manifest_path),
            analyzer_report_path: build
                .analyzer_report_path
                .as_ref()
                .map(|path| target_dir.join(path)),
            snapshot: Default::default(),
        }
    }
}

#[async_trait]
impl<CE: CommandExecutor> BuildRunner for CommandBuildRunner<CE> {
    async fn prepare_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        target_dir: &Path,
    ) -> Result<PreparedBranch, PrepareError> {
        let build = &self.settings.build;
        info!("preparing {}/{}@{} in {}", owner, repo, branch, target_dir.display());

        self.clean(target_dir).await?;

        let clone = CommandSpec::new("git")
            .args(["clone", "--depth", "1", "--single-branch", "--branch"])
            .arg(branch)
            .arg(build.clone_url(owner, repo))
            .arg(target_dir.to_string_lossy())
            .env("GIT_TERMINAL_PROMPT", "0");
        self.run_step(BuildStep::Fetch, clone).await?;

        let install = Self::configured(BuildStep::Install, &build.install_command)?;
        self.run_step(BuildStep::Install, install.current_dir(target_dir))
            .await?;

        let analyze = Self::configured(BuildStep::Analyze, &build.build_command)?;
        self.run_step(BuildStep::Analyze, analyze.current_dir(target_dir))
            .await?;

        self.load_prepared(owner, repo, branch, target_dir).await
    }

    async fn load_prepared(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
        target_dir: &Path,
    ) -> Result<PreparedBranch, PrepareError> {
        let mut prepared = self.prepared(branch, target_dir);
        prepared.snapshot = read_manifest(&prepared.manifest_path).await?;
        info!(
            "{}: {} artifacts, {} bytes total",
            branch,
            prepared.snapshot.len(),
            prepared.snapshot.total_size()
        );
        Ok(prepared)
    }
}

/// Keep the last `max_chars` characters, where build tools print the error
fn tail(text: &str, max_chars: usize) -> String {
    let count = text.chars().count();
    if count <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().skip(count - max_chars).collect();
        format!("...{}", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExitException;
    use crate::infra::CommandOutput;
    use crate::snapshot::ArtifactSize;
    use parking_lot::Mutex;
    use std::io;
    use tempfile::TempDir;

    type Responder = Box<dyn Fn(&CommandSpec) -> io::Result<CommandOutput> + Send + Sync>;

    // Mock CommandExecutor that records every command and answers via a closure
    struct MockCommandExecutor {
        responder: Responder,
        operations: Mutex<Vec<CommandSpec>>,
    }

    impl MockCommandExecutor {
        fn new(responder: impl Fn(&CommandSpec) -> io::Result<CommandOutput> + Send + Sync + 'static) -> Self {
            Self {
                responder: Box::new(responder),
                operations: Mutex::new(Vec::new()),
            }
        }

        fn programs(&self) -> Vec<String> {
            self.operations
                .lock()
                .iter()
                .map(|spec| spec.to_string())
                .collect()
        }
    }

    #[async_trait]
    impl CommandExecutor for MockCommandExecutor {
        async fn output(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
            self.operations.lock().push(spec.clone());
            (self.responder)(spec)
        }
    }

    fn is_build(spec: &CommandSpec) -> bool {
        spec.program == "npm" && spec.args.first().map(String::as_str) == Some("run")
    }

    // Simulates a successful build writing the manifest
    fn writes_manifest(manifest: &'static str) -> impl Fn(&CommandSpec) -> io::Result<CommandOutput> {
        move |spec| {
            if is_build(spec) {
                let dir = spec.current_dir.clone().expect("build runs in working dir");
                std::fs::create_dir_all(dir.join("dist"))?;
                std::fs::write(dir.join("dist/stats.json"), manifest)?;
            }
            Ok(CommandOutput::success(""))
        }
    }

    fn settings_in(temp_dir: &TempDir) -> Settings {
        let mut settings = Settings::default();
        settings.workspace.root = temp_dir.path().to_path_buf();
        settings
    }

    #[tokio::test]
    async fn test_prepare_branch_runs_steps_in_order_and_parses_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Arc::new(settings_in(&temp_dir));
        let target = settings.branch_dir("acme", "web", "feature");
        let executor = MockCommandExecutor::new(writes_manifest(r#"[{"name":"main.js","size":42}]"#));
        let runner = CommandBuildRunner::with_executor(settings, executor);

        let prepared = runner
            .prepare_branch("acme", "web", "feature", &target)
            .await
            .unwrap();

        assert_eq!(prepared.snapshot.artifacts(), &[ArtifactSize::new("main.js", 42)]);
        assert_eq!(prepared.manifest_path, target.join("dist/stats.json"));

        let ops = runner.cmd_executor.programs();
        assert_eq!(ops.len(), 3);
        assert!(ops[0].starts_with("git clone --depth 1 --single-branch --branch feature https://github.com/acme/web.git"));
        assert_eq!(ops[1], "npm install");
        assert_eq!(ops[2], "npm run build");
    }

    #[tokio::test]
    async fn test_prepare_branch_removes_previous_working_directory() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Arc::new(settings_in(&temp_dir));
        let target = settings.branch_dir("acme", "web", "feature");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("stale.txt"), "old").unwrap();

        let runner = CommandBuildRunner::with_executor(
            settings,
            MockCommandExecutor::new(writes_manifest("[]")),
        );
        runner
            .prepare_branch("acme", "web", "feature", &target)
            .await
            .unwrap();

        assert!(!target.join("stale.txt").exists());
    }

    #[tokio::test]
    async fn test_prepare_branch_install_failure_stops_before_build() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Arc::new(settings_in(&temp_dir));
        let target = settings.branch_dir("acme", "web", "feature");
        let executor = MockCommandExecutor::new(|spec| {
            if spec.args.first().map(String::as_str) == Some("install") {
                Ok(CommandOutput::failure(1, "npm ERR! code ERESOLVE"))
            } else {
                Ok(CommandOutput::success(""))
            }
        });
        let runner = CommandBuildRunner::with_executor(settings, executor);

        let err = runner
            .prepare_branch("acme", "web", "feature", &target)
            .await
            .unwrap_err();

        match err {
            PrepareError::Build(build) => {
                assert_eq!(build.step, BuildStep::Install);
                assert_eq!(build.exit_code, Some(1));
                assert!(build.diagnostics.contains("ERESOLVE"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(runner.cmd_executor.programs().len(), 2);
    }

    #[tokio::test]
    async fn test_prepare_branch_spawn_failure_has_no_exit_code() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Arc::new(settings_in(&temp_dir));
        let target = settings.branch_dir("acme", "web", "main");
        let executor = MockCommandExecutor::new(|_| {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        });
        let runner = CommandBuildRunner::with_executor(settings, executor);

        let err = runner
            .prepare_branch("acme", "web", "main", &target)
            .await
            .unwrap_err();

        match err {
            PrepareError::Build(build) => {
                assert_eq!(build.step, BuildStep::Fetch);
                assert_eq!(build.exit_code, None);
                assert!(build.diagnostics.contains("git"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_configured_exit_exception_is_accepted() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = settings_in(&temp_dir);
        settings.build.exit_exceptions = vec![ExitException {
            name: "analyzer exits 2 after writing stats".to_string(),
            step: BuildStep::Analyze,
            exit_code: 2,
        }];
        let settings = Arc::new(settings);
        let target = settings.branch_dir("acme", "web", "feature");

        let write = writes_manifest(r#"[{"name":"a.js","size":1}]"#);
        let executor = MockCommandExecutor::new(move |spec| {
            let output = write(spec)?;
            if is_build(spec) {
                Ok(CommandOutput::failure(2, "analyzer finished"))
            } else {
                Ok(output)
            }
        });
        let runner = CommandBuildRunner::with_executor(settings, executor);

        let prepared = runner
            .prepare_branch("acme", "web", "feature", &target)
            .await
            .unwrap();
        assert_eq!(prepared.snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_unlisted_nonzero_exit_still_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = settings_in(&temp_dir);
        settings.build.exit_exceptions = vec![ExitException {
            name: "analyzer exits 2 after writing stats".to_string(),
            step: BuildStep::Analyze,
            exit_code: 2,
        }];
        let settings = Arc::new(settings);
        let target = settings.branch_dir("acme", "web", "feature");
        let executor = MockCommandExecutor::new(|spec| {
            if is_build(spec) {
                Ok(CommandOutput::failure(1, "compile error"))
            } else {
                Ok(CommandOutput::success(""))
            }
        });
        let runner = CommandBuildRunner::with_executor(settings, executor);

        let err = runner
            .prepare_branch("acme", "web", "feature", &target)
            .await
            .unwrap_err();
        assert_eq!(err.step(), BuildStep::Analyze);
    }

    #[tokio::test]
    async fn test_successful_build_without_manifest_is_manifest_error() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Arc::new(settings_in(&temp_dir));
        let target = settings.branch_dir("acme", "web", "feature");
        let runner = CommandBuildRunner::with_executor(
            settings,
            MockCommandExecutor::new(|_| Ok(CommandOutput::success(""))),
        );

        let err = runner
            .prepare_branch("acme", "web", "feature", &target)
            .await
            .unwrap_err();
        assert!(matches!(err, PrepareError::Manifest(_)));
    }

    #[test]
    fn test_tail_keeps_end_of_long_output() {
        assert_eq!(tail("short", 10), "short");
        assert_eq!(tail("0123456789", 4), "...6789");
    }
}
