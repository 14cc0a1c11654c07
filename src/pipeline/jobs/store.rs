//! In-memory job registry for status lookups.
//!
//! Bounded: once `capacity` is exceeded the oldest finished jobs are
//! evicted. Unfinished jobs are never evicted; while every retained job is
//! still running the store grows past `capacity` and shrinks back as jobs
//! finish. The lock is never held across an await point.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use super::types::{ExtractionJob, JobFailure};

struct StoreInner {
    jobs: HashMap<Uuid, ExtractionJob>,
    order: VecDeque<Uuid>,
}

pub struct JobStore {
    inner: Mutex<StoreInner>,
    capacity: usize,
}

impl JobStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                jobs: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Insert a job or replace the stored snapshot of it.
    pub fn record(&self, job: &ExtractionJob) {
        let mut inner = self.lock();
        if inner.jobs.insert(job.id, job.clone()).is_none() {
            inner.order.push_back(job.id);
        }
        self.evict(&mut inner);
    }

    pub fn get(&self, id: &Uuid) -> Option<ExtractionJob> {
        self.lock().jobs.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail a job that never reached a terminal state. No-op otherwise.
    pub fn fail_unfinished(&self, id: &Uuid, failure: JobFailure) {
        let mut inner = self.lock();
        if let Some(job) = inner.jobs.get_mut(id) {
            if !job.status().is_terminal() && job.fail(failure).is_ok() {
                tracing::warn!(job_id = %id, "Extraction job abandoned before completion");
            }
        }
    }

    /// All retained jobs, oldest first.
    #[cfg(test)]
    pub(crate) fn snapshot(&self) -> Vec<ExtractionJob> {
        let inner = self.lock();
        inner
            .order
            .iter()
            .filter_map(|id| inner.jobs.get(id).cloned())
            .collect()
    }

    fn evict(&self, inner: &mut StoreInner) {
        while inner.jobs.len() > self.capacity {
            let victim = inner.order.iter().position(|id| {
                inner
                    .jobs
                    .get(id)
                    .map_or(true, |job| job.status().is_terminal())
            });
            let Some(id) = victim.and_then(|i| inner.order.remove(i)) else {
                break;
            };
            inner.jobs.remove(&id);
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // Entries are plain data; a panic elsewhere cannot leave them half-written.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extraction::{Document, DocumentType, JobConfig};
    use crate::pipeline::jobs::types::{FailureKind, JobStatus};

    fn job(name: &str) -> ExtractionJob {
        let doc = Document::new(name, "application/pdf", vec![0u8; 4]);
        ExtractionJob::new(&doc, DocumentType::Invoice, JobConfig::new())
    }

    fn finished(name: &str) -> ExtractionJob {
        let mut j = job(name);
        j.start().unwrap();
        j.fail(JobFailure::new(FailureKind::Backend, "x")).unwrap();
        j
    }

    #[test]
    fn record_then_get() {
        let store = JobStore::new(8);
        let j = job("a.pdf");
        store.record(&j);
        assert_eq!(store.get(&j.id).unwrap().document.filename, "a.pdf");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn record_replaces_snapshot() {
        let store = JobStore::new(8);
        let mut j = job("a.pdf");
        store.record(&j);
        j.start().unwrap();
        store.record(&j);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&j.id).unwrap().status(), JobStatus::Running);
    }

    #[test]
    fn evicts_oldest_finished_first() {
        let store = JobStore::new(2);
        let running = {
            let mut j = job("running.pdf");
            j.start().unwrap();
            j
        };
        let done_a = finished("a.pdf");
        let done_b = finished("b.pdf");

        store.record(&running);
        store.record(&done_a);
        store.record(&done_b);

        assert_eq!(store.len(), 2);
        assert!(store.get(&running.id).is_some());
        assert!(store.get(&done_a.id).is_none());
        assert!(store.get(&done_b.id).is_some());
    }

    #[test]
    fn running_jobs_kept_over_capacity_until_finished() {
        let store = JobStore::new(2);
        let mut jobs: Vec<_> = ["a.pdf", "b.pdf", "c.pdf"]
            .into_iter()
            .map(|name| {
                let mut j = job(name);
                j.start().unwrap();
                j
            })
            .collect();
        for j in &jobs {
            store.record(j);
        }

        assert_eq!(store.len(), 3);
        assert!(jobs.iter().all(|j| store.get(&j.id).is_some()));

        jobs[1].fail(JobFailure::new(FailureKind::Backend, "x")).unwrap();
        store.record(&jobs[1]);

        assert_eq!(store.len(), 2);
        assert!(store.get(&jobs[0].id).is_some());
        assert!(store.get(&jobs[1].id).is_none());
        assert!(store.get(&jobs[2].id).is_some());
    }

    #[test]
    fn fail_unfinished_marks_running_job() {
        let store = JobStore::new(4);
        let mut j = job("a.pdf");
        j.start().unwrap();
        store.record(&j);

        store.fail_unfinished(&j.id, JobFailure::cancelled());

        let stored = store.get(&j.id).unwrap();
        assert_eq!(stored.status(), JobStatus::Failed);
        assert_eq!(stored.failure().unwrap().kind, FailureKind::Cancelled);
    }

    #[test]
    fn fail_unfinished_leaves_terminal_job() {
        let store = JobStore::new(4);
        let j = finished("a.pdf");
        store.record(&j);

        store.fail_unfinished(&j.id, JobFailure::cancelled());

        assert_eq!(
            store.get(&j.id).unwrap().failure().unwrap().kind,
            FailureKind::Backend
        );
    }

    #[test]
    fn unknown_id_is_none() {
        let store = JobStore::new(4);
        assert!(store.get(&Uuid::new_v4()).is_none());
        assert!(store.is_empty());
    }
}
