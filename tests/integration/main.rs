//! Integration tests for Prebake

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const DOCKERFILE: &str = "FROM base:1.0\nRUN echo hello\n";

    /// Isolated workspace, config file and state directory
    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            std::fs::create_dir_all(dir.path().join("workspace/.devcontainer")).unwrap();
            Self { dir }
        }

        /// Use `builder` and `docker` executables in place of the real CLIs
        fn with_tools(builder: &str, docker: &str) -> Self {
            let sandbox = Self::new();
            std::fs::write(
                sandbox.config_path(),
                format!("[prebuild]\nbuilder = \"{builder}\"\ndocker = \"{docker}\"\n"),
            )
            .unwrap();
            sandbox
        }

        fn project(self, devcontainer: &str) -> Self {
            std::fs::write(self.devcontainer_dir().join("Dockerfile"), DOCKERFILE).unwrap();
            std::fs::write(self.devcontainer_dir().join("devcontainer.json"), devcontainer).unwrap();
            self
        }

        fn workspace(&self) -> PathBuf {
            self.dir.path().join("workspace")
        }

        fn devcontainer_dir(&self) -> PathBuf {
            self.workspace().join(".devcontainer")
        }

        fn config_path(&self) -> PathBuf {
            self.dir.path().join("config.toml")
        }

        fn dockerfile(&self) -> String {
            std::fs::read_to_string(self.devcontainer_dir().join("Dockerfile")).unwrap()
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("prebake");
            cmd.env("PREBAKE_CONFIG", self.config_path())
                .env("PREBAKE_STATE_DIR", self.dir.path().join("state"))
                .arg("--workspace")
                .arg(self.workspace());
            cmd
        }
    }

    fn with_features(prebuild: &str, features: &str) -> String {
        format!(
            r#"{{
    // comments are allowed
    "build": {{ "dockerfile": "Dockerfile" }},
    "features": {features},
    "customizations": {{ "prebake": {{ "prebuildFeatures": {prebuild} }} }},
}}"#
        )
    }

    fn prebake() -> Command {
        cargo_bin_cmd!("prebake")
    }

    #[test]
    fn help_displays() {
        prebake()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "Pre-bake devcontainer features into cached base images",
            ));
    }

    #[test]
    fn version_displays() {
        prebake()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("prebake"));
    }

    #[test]
    fn config_path() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[prebuild]"))
            .stdout(predicate::str::contains("namespace = \"prebake\""));
    }

    #[test]
    fn config_init_writes_defaults_once() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration initialized"));
        assert!(sandbox.config_path().is_file());

        sandbox
            .cmd()
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
    }

    #[test]
    fn malformed_config_fails() {
        let sandbox = Sandbox::new();
        std::fs::write(sandbox.config_path(), "[prebuild\n").unwrap();
        sandbox
            .cmd()
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn missing_devcontainer_fails() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .arg("status")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Configuration file not found"));
    }

    #[test]
    fn status_without_prebuild() {
        let sandbox = Sandbox::new().project(&with_features(r#"{"registry/x:1": {}}"#, "{}"));
        sandbox
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No active prebuild"));
    }

    #[test]
    fn prebuild_without_features_is_noop() {
        let sandbox = Sandbox::new().project(r#"{"build": {"dockerfile": "Dockerfile"}}"#);
        sandbox
            .cmd()
            .arg("prebuild")
            .assert()
            .success()
            .stdout(predicate::str::contains("No prebuild features"));
        assert_eq!(sandbox.dockerfile(), DOCKERFILE);
    }

    #[test]
    fn overlapping_features_fail() {
        let sandbox = Sandbox::new().project(&with_features(
            r#"{"registry/x:1": {}}"#,
            r#"{"registry/x:2": {}}"#,
        ));
        sandbox
            .cmd()
            .arg("prebuild")
            .assert()
            .failure()
            .stderr(predicate::str::contains("registry/x"))
            .stderr(predicate::str::contains("Hint:"));
        assert_eq!(sandbox.dockerfile(), DOCKERFILE);
    }

    #[test]
    fn dry_run_reports_tag() {
        let sandbox = Sandbox::new().project(&with_features(r#"{"registry/x:1": {}}"#, "{}"));
        sandbox
            .cmd()
            .args(["prebuild", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("prebake/base:1.0"));
        assert_eq!(sandbox.dockerfile(), DOCKERFILE);
    }

    #[cfg(unix)]
    #[test]
    fn prebuild_restore_cycle() {
        let sandbox = Sandbox::with_tools("true", "true")
            .project(&with_features(r#"{"registry/x:1": {"version": "20"}}"#, "{}"));
        let prebuilt = "FROM prebake/base:1.0\nRUN echo hello\n";

        sandbox
            .cmd()
            .arg("prebuild")
            .assert()
            .success()
            .stdout(predicate::str::contains("Prebuild complete"));
        assert_eq!(sandbox.dockerfile(), prebuilt);

        sandbox
            .cmd()
            .arg("prebuild")
            .assert()
            .success()
            .stdout(predicate::str::contains("up to date"));
        assert_eq!(sandbox.dockerfile(), prebuilt);

        sandbox
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Prebuild active"));

        sandbox.cmd().arg("restore").assert().success();
        assert_eq!(sandbox.dockerfile(), DOCKERFILE);

        sandbox
            .cmd()
            .arg("prebuild")
            .assert()
            .success()
            .stdout(predicate::str::contains("reactivated"));
        assert_eq!(sandbox.dockerfile(), prebuilt);
    }

    #[cfg(unix)]
    #[test]
    fn builder_failure_leaves_dockerfile() {
        let sandbox = Sandbox::with_tools("false", "false")
            .project(&with_features(r#"{"registry/x:1": {}}"#, "{}"));

        sandbox
            .cmd()
            .arg("prebuild")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Prebuild of prebake/base:1.0 failed"));
        assert_eq!(sandbox.dockerfile(), DOCKERFILE);

        sandbox
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No active prebuild"));
    }

    #[test]
    fn explicit_devcontainer_path() {
        let sandbox = Sandbox::new();
        let custom: &Path = &sandbox.dir.path().join("custom.json");
        std::fs::write(custom, r#"{"image": "base:1.0"}"#).unwrap();

        sandbox
            .cmd()
            .arg("--devcontainer")
            .arg(custom)
            .arg("restore")
            .assert()
            .failure()
            .stderr(predicate::str::contains("prebuilt image"));
    }

    #[test]
    fn ports_allocate_is_stable() {
        let sandbox = Sandbox::new();

        let first = sandbox
            .cmd()
            .args(["ports", "allocate", "web"])
            .assert()
            .success()
            .stdout(predicate::str::contains("web -> 41"))
            .get_output()
            .stdout
            .clone();

        let second = sandbox
            .cmd()
            .args(["ports", "allocate", "web"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        assert_eq!(first, second);

        sandbox
            .cmd()
            .args(["ports", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("web: 41"));
    }

    #[test]
    fn ports_list_empty() {
        let sandbox = Sandbox::new();
        sandbox
            .cmd()
            .args(["ports", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No ports assigned"));
    }
}
