//! Shared test utilities for the packager crate.

use crate::config::LayoutConfig;
use crate::error::Result;
use crate::executor::{CommandExecutor, Invocation};
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::process::ExitStatus;
use std::rc::Rc;
use tempfile::TempDir;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

type Handler = Box<dyn Fn(&Invocation) -> Result<ExitStatus>>;

/// A `CommandExecutor` that records every invocation and answers it through
/// a caller-supplied handler.
pub struct ScriptedExecutor {
    handler: Handler,
    invocations: RefCell<Vec<Invocation>>,
}

impl ScriptedExecutor {
    /// Creates an executor answering invocations with `handler`.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<ExitStatus> + 'static,
    {
        Self {
            handler: Box::new(handler),
            invocations: RefCell::new(Vec::new()),
        }
    }

    /// Returns every invocation received so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn run(&self, invocation: &Invocation) -> Result<ExitStatus> {
        self.invocations.borrow_mut().push(invocation.clone());
        (self.handler)(invocation)
    }
}

/// Committed content of the fake primary manifest.
pub const COMMITTED_MANIFEST: &str = "[project]\nname = \"mlflow\"\nversion = \"2.0.0\"\n";

/// Committed content of the fake readme.
pub const COMMITTED_README: &str = "# MLflow\n";

/// Content of the fake release manifest template.
pub const RELEASE_MANIFEST: &str =
    "[project]\nname = \"mlflow\"\nversion = \"2.0.0\"\n# release dependencies\n";

/// Wheel produced by the fake build of the full package.
pub const FULL_WHEEL: &str = "mlflow-2.0.0-py3-none-any.whl";

/// Wheel produced by the fake build of the skinny package.
pub const SKINNY_WHEEL: &str = "mlflow_skinny-2.0.0-py3-none-any.whl";

/// How the fake build frontend should behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildBehaviour {
    /// Produce a wheel and an sdist, exit 0.
    Succeed,
    /// Produce nothing, exit 1.
    Fail,
}

/// State captured by the fake build frontend and fake git.
#[derive(Debug, Clone, Default)]
pub struct BuildObservation {
    /// Manifest content at the moment the build ran.
    pub manifest_at_build: Option<String>,
    /// Cleanup paths that still existed when the build ran.
    pub stale_paths_at_build: Vec<Utf8PathBuf>,
    /// The target argument passed to `python -m build`.
    pub build_target: Option<String>,
    /// Number of `git restore` invocations.
    pub restore_calls: usize,
}

/// A temporary project tree shaped like the MLflow repository.
pub struct FakeProject {
    _dir: TempDir,
    root: Utf8PathBuf,
    committed: BTreeMap<String, String>,
    observation: Rc<RefCell<BuildObservation>>,
}

impl FakeProject {
    /// Creates the tree with committed manifest, readme, release template,
    /// and a skinny subdirectory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created or written.
    #[must_use]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("temp dir not UTF-8");

        let committed: BTreeMap<String, String> = [
            ("pyproject.toml", COMMITTED_MANIFEST),
            ("README.md", COMMITTED_README),
        ]
        .into_iter()
        .map(|(name, content)| (name.to_owned(), content.to_owned()))
        .collect();

        let project = Self {
            _dir: dir,
            root,
            committed,
            observation: Rc::new(RefCell::new(BuildObservation::default())),
        };
        project.write("pyproject.toml", COMMITTED_MANIFEST);
        project.write("README.md", COMMITTED_README);
        project.write("pyproject.release.toml", RELEASE_MANIFEST);
        project.write("skinny/pyproject.toml", "[project]\nname = \"mlflow-skinny\"\n");
        project
    }

    /// Returns the project root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Writes `contents` to `relative`, creating parent directories.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directory");
        }
        fs::write(&path, contents).expect("failed to write project file");
    }

    /// Reads `relative` as a string.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be read.
    #[must_use]
    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root.join(relative)).expect("failed to read project file")
    }

    /// Returns `true` if `relative` exists.
    #[must_use]
    pub fn exists(&self, relative: &str) -> bool {
        self.root.join(relative).exists()
    }

    /// Returns the names of the entries in `relative`, sorted.
    #[must_use]
    pub fn list(&self, relative: &str) -> Vec<String> {
        let Ok(entries) = self.root.join(relative).read_dir_utf8() else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.file_name().to_owned())
            .collect();
        names.sort();
        names
    }

    /// Returns a snapshot of what the fake tools observed.
    #[must_use]
    pub fn observation(&self) -> BuildObservation {
        self.observation.borrow().clone()
    }

    /// Returns an executor imitating `python -m build` and `git restore`.
    ///
    /// The fake build records the manifest content and any cleanup path that
    /// still exists, then writes a wheel and an sdist into `<target>/dist`.
    /// The fake restore rewrites each named file with its committed content.
    #[must_use]
    pub fn executor(&self, behaviour: BuildBehaviour) -> ScriptedExecutor {
        let root = self.root.clone();
        let committed = self.committed.clone();
        let observation = Rc::clone(&self.observation);
        let cleanup_paths = LayoutConfig::default().cleanup_paths;

        ScriptedExecutor::new(move |invocation| {
            if invocation.program == "git" {
                let files = invocation.args.iter().skip(1);
                for file in files {
                    if let Some(content) = committed.get(file) {
                        fs::write(root.join(file), content).expect("failed to restore file");
                    }
                }
                observation.borrow_mut().restore_calls += 1;
                return Ok(exit_status(0));
            }

            let target = invocation.args.last().cloned().unwrap_or_default();
            {
                let mut seen = observation.borrow_mut();
                seen.manifest_at_build = fs::read_to_string(root.join("pyproject.toml")).ok();
                seen.stale_paths_at_build = cleanup_paths
                    .iter()
                    .filter(|path| root.join(path).exists())
                    .cloned()
                    .collect();
                seen.build_target = Some(target.clone());
            }

            if behaviour == BuildBehaviour::Fail {
                return Ok(exit_status(1));
            }

            let (wheel, sdist) = if target == "." {
                (FULL_WHEEL, "mlflow-2.0.0.tar.gz")
            } else {
                (SKINNY_WHEEL, "mlflow_skinny-2.0.0.tar.gz")
            };
            let out_dir = root.join(&target).join("dist");
            fs::create_dir_all(&out_dir).expect("failed to create build output");
            fs::write(out_dir.join(wheel), b"wheel").expect("failed to write wheel");
            fs::write(out_dir.join(sdist), b"sdist").expect("failed to write sdist");
            Ok(exit_status(0))
        })
    }
}

impl Default for FakeProject {
    fn default() -> Self {
        Self::new()
    }
}
