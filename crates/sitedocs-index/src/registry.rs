//! Process-wide cache of project indices with single-flight builds.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::error::{IndexError, Result};
use crate::project_index::ProjectIndex;

/// Produces a fresh index for a project.
///
/// `Ok(None)` means the project has no usable documents.
pub trait IndexSource: Send + Sync {
    fn build<'a>(&'a self, project: &'a str) -> BoxFuture<'a, Result<Option<ProjectIndex>>>;
}

type BuildOutcome = std::result::Result<Option<Arc<ProjectIndex>>, Arc<IndexError>>;
type SharedBuild = Shared<BoxFuture<'static, BuildOutcome>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Publish {
    /// Insert on success, leave the map alone otherwise.
    Fill,
    /// Insert on success, remove on empty, keep the old entry on error.
    Replace,
}

struct InFlight {
    id: u64,
    build: SharedBuild,
}

struct Inner {
    source: Arc<dyn IndexSource>,
    indices: RwLock<HashMap<String, Arc<ProjectIndex>>>,
    in_flight: Mutex<HashMap<String, InFlight>>,
    next_id: AtomicU64,
}

impl Inner {
    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cached(&self, project: &str) -> Option<Arc<ProjectIndex>> {
        self.indices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project)
            .cloned()
    }

    /// Publish a finished build, then retire its in-flight slot.
    ///
    /// The index map is updated before the slot is removed, so a caller that
    /// finds no in-flight build under the slot lock always sees the result.
    fn complete(
        &self,
        project: &str,
        id: u64,
        publish: Publish,
        result: Result<Option<ProjectIndex>>,
    ) -> BuildOutcome {
        let outcome = match result {
            Ok(Some(index)) => {
                let index = Arc::new(index);
                self.indices
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(project.to_owned(), Arc::clone(&index));
                Ok(Some(index))
            }
            Ok(None) => {
                if publish == Publish::Replace {
                    let removed = self
                        .indices
                        .write()
                        .unwrap_or_else(PoisonError::into_inner)
                        .remove(project);
                    if removed.is_some() {
                        tracing::info!(project, "project has no documents left, index dropped");
                    }
                }
                Ok(None)
            }
            Err(e) => {
                if publish == Publish::Replace && self.cached(project).is_some() {
                    tracing::warn!(project, error = %e, "rebuild failed, keeping previous index");
                }
                Err(Arc::new(e))
            }
        };

        let mut in_flight = self.lock_in_flight();
        if in_flight.get(project).is_some_and(|f| f.id == id) {
            in_flight.remove(project);
        }
        outcome
    }
}

/// Project name to [`ProjectIndex`] map, built lazily on first use.
///
/// Concurrent requests for the same project share one build. Only complete
/// indices are ever published; a failed or timed-out build leaves the map as
/// it was. Builds run as tokio tasks, so the registry must be used from
/// within a tokio runtime. Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct IndexRegistry {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for IndexRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexRegistry")
            .field("cached", &self.cached_projects())
            .finish_non_exhaustive()
    }
}

impl IndexRegistry {
    #[must_use]
    pub fn new(source: Arc<dyn IndexSource>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                indices: RwLock::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Return the cached index, building it if absent.
    ///
    /// `Ok(None)` (no documents) is not cached, so the next call scans the
    /// folder again.
    ///
    /// # Errors
    ///
    /// Returns the build failure, shared with every caller that joined it.
    pub async fn get_or_build(&self, project: &str) -> Result<Option<Arc<ProjectIndex>>> {
        if let Some(index) = self.get(project) {
            tracing::debug!(project, "index cache hit");
            return Ok(Some(index));
        }

        let build = {
            let mut in_flight = self.inner.lock_in_flight();
            if let Some(index) = self.get(project) {
                return Ok(Some(index));
            }
            if let Some(pending) = in_flight.get(project) {
                tracing::debug!(project, "joining in-flight index build");
                pending.build.clone()
            } else {
                self.start_build(&mut in_flight, project, Publish::Fill)
            }
        };

        build.await.map_err(IndexError::Shared)
    }

    /// Build the project's index from scratch, ignoring the cache.
    ///
    /// Waits for any in-flight build of the same project first. On success
    /// the entry is replaced; when the project has no documents any more the
    /// entry is removed; on failure the previous entry stays.
    ///
    /// # Errors
    ///
    /// Returns the build failure.
    pub async fn rebuild(&self, project: &str) -> Result<Option<Arc<ProjectIndex>>> {
        let build = loop {
            let pending = {
                let mut in_flight = self.inner.lock_in_flight();
                match in_flight.get(project) {
                    Some(pending) => pending.build.clone(),
                    None => break self.start_build(&mut in_flight, project, Publish::Replace),
                }
            };
            // The earlier build may predate new files; only wait for it.
            let _ = pending.await;
        };

        build.await.map_err(IndexError::Shared)
    }

    /// Rebuild every named project in turn and count those that produced an
    /// index. One project's failure does not stop the rest.
    pub async fn rebuild_all<S: AsRef<str>>(&self, projects: &[S]) -> usize {
        let mut built = 0;
        for project in projects {
            let project = project.as_ref();
            match self.rebuild(project).await {
                Ok(Some(index)) => {
                    built += 1;
                    tracing::info!(project, chunks = index.len(), "project index rebuilt");
                }
                Ok(None) => tracing::info!(project, "no documents, nothing to index"),
                Err(e) => tracing::warn!(project, error = %e, "project index rebuild failed"),
            }
        }
        built
    }

    /// Cached index without triggering a build.
    #[must_use]
    pub fn get(&self, project: &str) -> Option<Arc<ProjectIndex>> {
        self.inner.cached(project)
    }

    /// Names of projects with a cached index, sorted.
    #[must_use]
    pub fn cached_projects(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .indices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .indices
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The build runs on its own task, so it finishes and publishes even when
    // every caller has gone away. A panicking source fails this attempt only.
    fn start_build(
        &self,
        in_flight: &mut HashMap<String, InFlight>,
        project: &str,
        publish: Publish,
    ) -> SharedBuild {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let name = project.to_owned();

        let task = tokio::spawn(async move {
            let result = match AssertUnwindSafe(inner.source.build(&name))
                .catch_unwind()
                .await
            {
                Ok(result) => result,
                Err(_) => {
                    tracing::error!(project = %name, "index build panicked");
                    Err(IndexError::Build("index build panicked".into()))
                }
            };
            inner.complete(&name, id, publish, result)
        });

        let inner = Arc::clone(&self.inner);
        let name = project.to_owned();
        let build = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => inner.complete(
                    &name,
                    id,
                    publish,
                    Err(IndexError::Build(format!("index build task failed: {e}"))),
                ),
            }
        }
        .boxed()
        .shared();

        in_flight.insert(
            project.to_owned(),
            InFlight {
                id,
                build: build.clone(),
            },
        );
        build
    }
}
