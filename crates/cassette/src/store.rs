use std::collections::{BTreeMap, BTreeSet};
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tape_std::{Fs, TapeStdError};

use crate::{CassetteError, Fixture};

/// Options controlling which files are treated as fixtures.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// File extensions (without the dot) that hold fixtures.
    pub extensions: Vec<String>,
    /// Directory names that are never descended into.
    pub ignore_dirs: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["cs".into()],
            ignore_dirs: vec![".git".into(), "target".into(), "node_modules".into()],
        }
    }
}

impl LoadOptions {
    fn is_fixture(&self, path: &Utf8Path) -> bool {
        path.extension()
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }

    fn should_ignore_dir(&self, path: &Utf8Path) -> bool {
        match path.file_name() {
            Some(name) => name.starts_with('.') || self.ignore_dirs.iter().any(|d| d == name),
            None => false,
        }
    }
}

/// A file that could not be loaded. Failures never stop the rest of the store from loading.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: Utf8PathBuf,
    pub error: CassetteError,
}

/// Every fixture found under a root directory, keyed by operation name.
#[derive(Debug, Default)]
pub struct FixtureStore {
    fixtures: BTreeMap<String, Fixture>,
    failures: Vec<LoadFailure>,
}

impl FixtureStore {
    pub fn new() -> FixtureStore {
        FixtureStore::default()
    }

    /// Loads every fixture under `root`, which may also be a single fixture file.
    ///
    /// Only an unreadable `root` is an error; files that fail to parse and
    /// nested directories that cannot be read are recorded in
    /// [`FixtureStore::failures`].
    pub fn load<P>(root: P, options: &LoadOptions) -> Result<FixtureStore, CassetteError>
    where
        P: AsRef<Utf8Path>,
    {
        let root = root.as_ref();
        tracing::info!("loading fixtures from {}", root);
        let Discovery { files, failures } = Discovery::run(root, options)?;
        let mut store = FixtureStore {
            failures,
            ..FixtureStore::default()
        };
        for path in files {
            match Fixture::load(&path) {
                Ok(fixture) => {
                    if let Err(error) = store.insert(fixture) {
                        tracing::warn!(%path, %error, "skipping duplicate fixture");
                        store.failures.push(LoadFailure { path, error });
                    }
                }
                Err(error) => {
                    tracing::warn!(%path, %error, "skipping fixture that could not be loaded");
                    store.failures.push(LoadFailure { path, error });
                }
            }
        }
        tracing::info!(
            loaded = store.fixtures.len(),
            failed = store.failures.len(),
            "finished loading fixtures"
        );
        Ok(store)
    }

    /// Adds `fixture`, refusing a second fixture for the same operation.
    pub fn insert(&mut self, fixture: Fixture) -> Result<(), CassetteError> {
        if let Some(existing) = self.fixtures.get(fixture.operation_name()) {
            return Err(CassetteError::DuplicateFixture {
                operation: fixture.operation_name().to_string(),
                first: existing.path().to_path_buf(),
                second: fixture.path().to_path_buf(),
            });
        }
        self.fixtures
            .insert(fixture.operation_name().to_string(), fixture);
        Ok(())
    }

    pub fn get(&self, operation: &str) -> Result<&Fixture, CassetteError> {
        self.fixtures
            .get(operation)
            .ok_or_else(|| CassetteError::UnknownFixture {
                operation: operation.to_string(),
                available: self.operation_names().map(str::to_string).collect(),
            })
    }

    /// Fixtures in operation name order.
    pub fn fixtures(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures.values()
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.fixtures.keys().map(String::as_str)
    }

    pub fn failures(&self) -> &[LoadFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

/// Fixture files found under a root, and the directories or entries that
/// could not be read along the way.
#[derive(Debug, Default)]
struct Discovery {
    files: BTreeSet<Utf8PathBuf>,
    failures: Vec<LoadFailure>,
}

impl Discovery {
    /// Walks `root`. Only an unreadable `root` is an error.
    fn run(root: &Utf8Path, options: &LoadOptions) -> Result<Discovery, CassetteError> {
        let mut discovery = Discovery::default();
        if !Fs::path_is_dir(root)? {
            discovery.files.insert(root.to_path_buf());
            return Ok(discovery);
        }

        let mut queue = discovery.read_dir(root, options)?;
        while let Some(dir) = queue.pop() {
            let subdirs = discovery.visit(dir, options);
            queue.extend(subdirs);
        }

        tracing::debug!(
            files = discovery.files.len(),
            failures = discovery.failures.len(),
            "discovered fixture files"
        );
        Ok(discovery)
    }

    /// Like [`Discovery::read_dir`], but a `dir` that cannot be read is
    /// recorded as a failure.
    fn visit(&mut self, dir: Utf8PathBuf, options: &LoadOptions) -> Vec<Utf8PathBuf> {
        match self.read_dir(&dir, options) {
            Ok(subdirs) => subdirs,
            Err(error) => {
                tracing::warn!(%dir, %error, "skipping directory that could not be read");
                self.failures.push(LoadFailure { path: dir, error });
                Vec::new()
            }
        }
    }

    /// Records the fixture files directly inside `dir` and returns the
    /// subdirectories still to visit.
    fn read_dir(
        &mut self,
        dir: &Utf8Path,
        options: &LoadOptions,
    ) -> Result<Vec<Utf8PathBuf>, CassetteError> {
        let mut subdirs = Vec::new();
        for entry in Fs::get_dir_entries(dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    self.failures.push(LoadFailure {
                        path: dir.to_path_buf(),
                        error: unreadable_entry(dir, source),
                    });
                    continue;
                }
            };
            let entry_path = entry.path().to_path_buf();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(source) => {
                    let error = unreadable_entry(&entry_path, source);
                    self.failures.push(LoadFailure {
                        path: entry_path,
                        error,
                    });
                    continue;
                }
            };
            if file_type.is_dir() {
                if !options.should_ignore_dir(&entry_path) {
                    subdirs.push(entry_path);
                }
            } else if file_type.is_file() && options.is_fixture(&entry_path) {
                self.files.insert(entry_path);
            }
        }
        Ok(subdirs)
    }
}

fn unreadable_entry(path: &Utf8Path, source: io::Error) -> CassetteError {
    CassetteError::Fs(TapeStdError::Io {
        action: "read",
        path: path.to_path_buf(),
        source,
    })
}
