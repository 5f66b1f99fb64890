//! [`TestEnv`] sandbox for config loading scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use pmrc_meta::RuntimeFacts;
use tempfile::TempDir;

/// A temporary machine layout:
///
/// ```text
/// <root>/home/.npmrc            user file
/// <root>/prefix/etc/npmrc       global file
/// <root>/prefix/bin/npmrc       builtin file
/// <root>/project/.npmrc         project file
/// ```
///
/// # Example
///
/// ```rust,no_run
/// use pmrc_test_utils::TestEnv;
///
/// let env = TestEnv::new();
/// env.write_user_rc("loglevel=warn\n");
/// let facts = env.facts();
/// assert_eq!(facts.cwd, env.project());
/// ```
pub struct TestEnv {
    temp_dir: TempDir,
    vars: Vec<(String, String)>,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    /// Create the sandbox with empty home, prefix and project folders. The
    /// project holds a `package.json` so it is found as the local prefix.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        for dir in ["home", "prefix/bin", "prefix/etc", "project"] {
            fs::create_dir_all(temp_dir.path().join(dir)).unwrap();
        }
        fs::write(temp_dir.path().join("project/package.json"), "{}\n").unwrap();
        Self {
            temp_dir,
            vars: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn home(&self) -> PathBuf {
        self.root().join("home")
    }

    pub fn prefix(&self) -> PathBuf {
        self.root().join("prefix")
    }

    pub fn project(&self) -> PathBuf {
        self.root().join("project")
    }

    pub fn user_rc(&self) -> PathBuf {
        self.home().join(".npmrc")
    }

    pub fn global_rc(&self) -> PathBuf {
        self.prefix().join("etc").join("npmrc")
    }

    pub fn builtin_rc(&self) -> PathBuf {
        self.prefix().join("bin").join("npmrc")
    }

    pub fn project_rc(&self) -> PathBuf {
        self.project().join(".npmrc")
    }

    /// Add a process environment variable to the facts.
    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.vars.push((name.to_string(), value.to_string()));
        self
    }

    pub fn write_user_rc(&self, text: &str) {
        fs::write(self.user_rc(), text).unwrap();
    }

    pub fn write_global_rc(&self, text: &str) {
        fs::write(self.global_rc(), text).unwrap();
    }

    pub fn write_builtin_rc(&self, text: &str) {
        fs::write(self.builtin_rc(), text).unwrap();
    }

    pub fn write_project_rc(&self, text: &str) {
        fs::write(self.project_rc(), text).unwrap();
    }

    /// Contents of `path`, or `None` when it does not exist.
    pub fn read(&self, path: &Path) -> Option<String> {
        fs::read_to_string(path).ok()
    }

    /// Deterministic facts pointing at the sandbox.
    pub fn facts(&self) -> RuntimeFacts {
        let mut facts = RuntimeFacts {
            cwd: self.project(),
            home: Some(self.home()),
            platform: "linux".to_string(),
            arch: "x64".to_string(),
            node_version: Some("v20.11.0".to_string()),
            npm_version: "10.2.4".to_string(),
            npm_bin: Some(self.prefix().join("bin").join("npm")),
            default_global_prefix: self.prefix(),
            local_prefix_root: Some(self.project()),
            ..RuntimeFacts::default()
        };
        facts.env.insert("HOME".to_string(), self.home().to_string_lossy().into_owned());
        for (name, value) in &self.vars {
            facts.env.insert(name.clone(), value.clone());
        }
        facts
    }

    /// Assert that the file at `path` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &Path, content: &str) {
        let file_content = fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            path.display(),
            content,
            file_content
        );
    }
}
