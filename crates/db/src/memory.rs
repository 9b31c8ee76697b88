//! In-memory [`JobStore`] for tests.
//!
//! Counts reads and writes so tests can assert write suppression, and can
//! be switched into an unavailable state to exercise store failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use reelforge_core::inputs::ProjectInputs;
use reelforge_core::job_status::JobStatusMap;
use reelforge_core::stage::GenerationStage;
use reelforge_core::types::DbId;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::store::JobStore;

#[derive(Default)]
struct MemoryState {
    projects: HashMap<DbId, ProjectInputs>,
    job_status: HashMap<(DbId, GenerationStage), JobStatusMap>,
}

/// Process-local store backed by hash maps.
#[derive(Default)]
pub struct InMemoryJobStore {
    state: Mutex<MemoryState>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project's generation inputs.
    pub async fn insert_project(&self, inputs: ProjectInputs) {
        self.state
            .lock()
            .await
            .projects
            .insert(inputs.project_id, inputs);
    }

    /// Seed a status map without counting it as a write.
    pub async fn seed_job_status(&self, project_id: DbId, stage: GenerationStage, map: JobStatusMap) {
        self.state
            .lock()
            .await
            .job_status
            .insert((project_id, stage), map);
    }

    /// Current stored map, bypassing counters.
    pub async fn snapshot(&self, project_id: DbId, stage: GenerationStage) -> Option<JobStatusMap> {
        self.state
            .lock()
            .await
            .job_status
            .get(&(project_id, stage))
            .cloned()
    }

    /// Number of status map reads served.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of status map writes applied (unconditional and successful
    /// conditional replaces).
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("in-memory store switched off".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }

    async fn load_project(&self, project_id: DbId) -> Result<Option<ProjectInputs>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().await.projects.get(&project_id).cloned())
    }

    async fn load_job_status(
        &self,
        project_id: DbId,
        stage: GenerationStage,
    ) -> Result<Option<JobStatusMap>, StoreError> {
        self.check_available()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .lock()
            .await
            .job_status
            .get(&(project_id, stage))
            .cloned())
    }

    async fn replace_job_status(
        &self,
        project_id: DbId,
        stage: GenerationStage,
        map: &JobStatusMap,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        self.state
            .lock()
            .await
            .job_status
            .insert((project_id, stage), map.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn compare_and_replace_job_status(
        &self,
        project_id: DbId,
        stage: GenerationStage,
        expected: &JobStatusMap,
        map: &JobStatusMap,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        match state.job_status.get_mut(&(project_id, stage)) {
            Some(current) if current.same_wire(expected) => {
                *current = map.clone();
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
