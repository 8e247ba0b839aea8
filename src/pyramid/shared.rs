// src/pyramid/shared.rs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};

use log::info;

use super::{AggregateEntry, LevelId, Pyramid};

/// Samples appended per write-lock acquisition during a batch ingest.
pub const INGEST_CHUNK: usize = 4096;

/// Owned copy of a [`Slice`](super::Slice), safe to carry across threads.
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedSlice {
    Level {
        level: LevelId,
        absolute_factor: usize,
        start_index: usize,
        entries: Vec<AggregateEntry>,
    },
    UseRawSource,
}

impl OwnedSlice {
    pub fn entries(&self) -> &[AggregateEntry] {
        match self {
            OwnedSlice::Level { entries, .. } => entries,
            OwnedSlice::UseRawSource => &[],
        }
    }
}

/// Cloneable handle for one ingest thread plus any number of readers.
///
/// Appends take the write lock once per chunk; a reader therefore sees some
/// prefix of the ingested data, never a half-written entry.
#[derive(Debug, Clone)]
pub struct SharedPyramid {
    inner: Arc<RwLock<Pyramid>>,
    ingested: Arc<AtomicU64>,
}

impl SharedPyramid {
    pub fn new(pyramid: Pyramid) -> Self {
        let ingested = Arc::new(AtomicU64::new(pyramid.samples_ingested()));
        Self {
            inner: Arc::new(RwLock::new(pyramid)),
            ingested,
        }
    }

    // Entries are pushed whole before the lock is released, so a poisoned
    // lock still guards consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Pyramid> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Pyramid> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, sample: f32) {
        let mut p = self.write();
        p.append(sample);
        self.ingested.store(p.samples_ingested(), Ordering::Release);
    }

    /// Consumes `source`, publishing progress every [`INGEST_CHUNK`] samples.
    pub fn extend<I>(&self, source: I) -> u64
    where
        I: IntoIterator<Item = f32>,
    {
        let mut chunk = Vec::with_capacity(INGEST_CHUNK);
        let mut total = 0u64;
        for sample in source {
            chunk.push(sample);
            if chunk.len() == INGEST_CHUNK {
                total += self.flush(&mut chunk);
            }
        }
        total + self.flush(&mut chunk)
    }

    fn flush(&self, chunk: &mut Vec<f32>) -> u64 {
        if chunk.is_empty() {
            return 0;
        }
        let mut p = self.write();
        let n = p.extend(chunk.drain(..));
        self.ingested.store(p.samples_ingested(), Ordering::Release);
        n
    }

    /// Lock-free read of the ingest progress.
    pub fn samples_ingested(&self) -> u64 {
        self.ingested.load(Ordering::Acquire)
    }

    /// Runs `f` against the current state under the read lock.
    pub fn with_pyramid<R>(&self, f: impl FnOnce(&Pyramid) -> R) -> R {
        f(&*self.read())
    }

    pub fn query_owned(&self, zoom: f64, offset: u64, count: usize) -> OwnedSlice {
        self.read().query(zoom, offset, count).into_owned()
    }

    /// Drains `source` on a dedicated thread. The handle yields the number of
    /// samples ingested.
    pub fn spawn_ingest<I>(&self, source: I) -> JoinHandle<u64>
    where
        I: IntoIterator<Item = f32> + Send + 'static,
    {
        let shared = self.clone();
        thread::spawn(move || {
            let n = shared.extend(source);
            let lens: Vec<usize> = shared.with_pyramid(|p| p.levels().map(|l| l.values().len()).collect());
            info!("ingest finished: {n} samples, entries per level {lens:?}");
            n
        })
    }
}
