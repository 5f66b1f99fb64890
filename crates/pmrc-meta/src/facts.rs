//! Runtime facts
//!
//! A one-time snapshot of the process environment. Every value that depends
//! on the machine the tool runs on (home directory, cwd, terminal state,
//! install prefix) is captured here, so the rest of the system never reads
//! `std::env` and stays deterministic under test.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use crate::types::TypeContext;

#[derive(Debug, Clone, Default)]
pub struct RuntimeFacts {
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
    pub platform: String,
    pub arch: String,
    pub node_version: Option<String>,
    pub npm_version: String,
    pub npm_command: Option<String>,
    pub npm_args: Vec<String>,
    pub npm_bin: Option<PathBuf>,
    pub node_bin: Option<PathBuf>,
    pub default_global_prefix: PathBuf,
    /// Nearest ancestor of cwd holding `package.json` or `node_modules`.
    pub local_prefix_root: Option<PathBuf>,
    /// Nearest workspace root above `local_prefix_root`.
    pub local_prefix_workspace: Option<PathBuf>,
    pub stdout_tty: bool,
    pub stderr_tty: bool,
    pub term: Option<String>,
    pub env: IndexMap<String, String>,
}

impl RuntimeFacts {
    /// Capture facts from the running process.
    pub fn detect() -> std::io::Result<Self> {
        let cwd = std::env::current_dir()?;
        let env: IndexMap<String, String> = std::env::vars().collect();
        let exe = std::env::current_exe().ok();
        let platform = node_platform(std::env::consts::OS).to_string();

        let default_global_prefix = match env.get("PREFIX") {
            Some(prefix) => PathBuf::from(prefix),
            None => global_prefix_from_exe(exe.as_deref(), &platform, env.get("DESTDIR")),
        };
        let local_prefix_root = find_local_root(&cwd);
        let local_prefix_workspace = local_prefix_root
            .as_deref()
            .and_then(find_workspace_root);

        let facts = Self {
            home: dirs::home_dir(),
            arch: node_arch(std::env::consts::ARCH).to_string(),
            node_version: env.get("NODE_VERSION").cloned(),
            npm_version: env!("CARGO_PKG_VERSION").to_string(),
            npm_command: None,
            npm_args: Vec::new(),
            npm_bin: exe,
            node_bin: None,
            default_global_prefix,
            local_prefix_root,
            local_prefix_workspace,
            stdout_tty: std::io::stdout().is_terminal(),
            stderr_tty: std::io::stderr().is_terminal(),
            term: env.get("TERM").cloned(),
            platform,
            env,
            cwd,
        };
        tracing::debug!(
            cwd = %facts.cwd.display(),
            prefix = %facts.default_global_prefix.display(),
            "detected runtime facts"
        );
        Ok(facts)
    }

    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    pub fn type_context(&self) -> TypeContext {
        TypeContext {
            home: self.home.clone(),
            cwd: self.cwd.clone(),
        }
    }

    pub fn is_windows(&self) -> bool {
        self.platform == "win32"
    }

    /// The facts as internal keys, ready to load into the internal layer.
    pub fn internals(&self) -> Map<String, Value> {
        let path = |p: &Option<PathBuf>| match p {
            Some(p) => Value::String(p.to_string_lossy().into_owned()),
            None => Value::Null,
        };
        let mut map = Map::new();
        map.insert("cwd".into(), json!(self.cwd.to_string_lossy()));
        map.insert(
            "default-global-prefix".into(),
            json!(self.default_global_prefix.to_string_lossy()),
        );
        map.insert("local-prefix-root".into(), path(&self.local_prefix_root));
        map.insert(
            "local-prefix-workspace".into(),
            path(&self.local_prefix_workspace),
        );
        map.insert("node-version".into(), json!(self.node_version));
        map.insert("npm-version".into(), json!(self.npm_version));
        map.insert("platform".into(), json!(self.platform));
        map.insert("arch".into(), json!(self.arch));
        map.insert("stdout-tty".into(), json!(self.stdout_tty));
        map.insert("stderr-tty".into(), json!(self.stderr_tty));
        map.insert("term".into(), json!(self.term));
        map.insert("npm-command".into(), json!(self.npm_command));
        map.insert("npm-args".into(), json!(self.npm_args));
        map.insert("npm-bin".into(), path(&self.npm_bin));
        map.insert("node-bin".into(), path(&self.node_bin));
        map.insert("hash-algorithm".into(), json!("sha1"));
        map
    }
}

fn node_platform(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    }
}

fn node_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "x64",
        "x86" => "ia32",
        "aarch64" => "arm64",
        other => other,
    }
}

/// `<exe dir>` on Windows, `<exe dir>/..` elsewhere, under `DESTDIR` if set.
fn global_prefix_from_exe(exe: Option<&Path>, platform: &str, destdir: Option<&String>) -> PathBuf {
    let bin_dir = exe.and_then(Path::parent).unwrap_or(Path::new("/"));
    let prefix = if platform == "win32" {
        bin_dir.to_path_buf()
    } else {
        bin_dir.parent().unwrap_or(bin_dir).to_path_buf()
    };
    match destdir {
        Some(dest) => {
            let relative = prefix.strip_prefix("/").unwrap_or(&prefix);
            Path::new(dest).join(relative)
        }
        None => prefix,
    }
}

fn find_local_root(cwd: &Path) -> Option<PathBuf> {
    cwd.ancestors()
        .find(|dir| dir.join("package.json").is_file() || dir.join("node_modules").is_dir())
        .map(Path::to_path_buf)
}

fn find_workspace_root(root: &Path) -> Option<PathBuf> {
    root.ancestors().skip(1).find_map(|dir| {
        let text = std::fs::read_to_string(dir.join("package.json")).ok()?;
        let manifest: Value = serde_json::from_str(&text).ok()?;
        manifest
            .get("workspaces")
            .is_some()
            .then(|| dir.to_path_buf())
    })
}
