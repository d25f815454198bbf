//! In-memory [`NoticeSource`] for tests and offline runs.
//!
//! Honours the same ordering contract as the MySQL source: newest
//! `created_at` first, ties kept in insertion order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use signboard_core::NoticeRecord;

use crate::source::{NoticeSession, NoticeSource};
use crate::SyncError;

/// Failure a [`StaticSource`] should simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    DriverMissing,
    Unreachable,
    CountFails,
    FetchFails,
}

#[derive(Debug, Default)]
pub struct StaticSource {
    records: Vec<NoticeRecord>,
    failure: Option<Failure>,
    connects: AtomicUsize,
    closes: Arc<AtomicUsize>,
    fetch_limits: Arc<Mutex<Vec<u32>>>,
}

impl StaticSource {
    pub fn new(records: Vec<NoticeRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    pub fn failing(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    /// Records available, but the given step fails.
    pub fn with_failure(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Number of `connect` calls so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of sessions closed so far.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// `limit` argument of every `fetch_latest` call so far.
    pub fn fetch_limits(&self) -> Vec<u32> {
        self.fetch_limits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl NoticeSource for StaticSource {
    async fn connect(&self) -> Result<Box<dyn NoticeSession>, SyncError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(Failure::DriverMissing) => {
                return Err(SyncError::DriverUnavailable("no driver in test".to_string()))
            }
            Some(Failure::Unreachable) => {
                return Err(SyncError::RemoteUnavailable("connection refused".to_string()))
            }
            _ => {}
        }
        Ok(Box::new(StaticSession {
            records: self.records.clone(),
            failure: self.failure,
            closes: Arc::clone(&self.closes),
            fetch_limits: Arc::clone(&self.fetch_limits),
        }))
    }

    fn describe(&self) -> String {
        format!("static({} records)", self.records.len())
    }
}

struct StaticSession {
    records: Vec<NoticeRecord>,
    failure: Option<Failure>,
    closes: Arc<AtomicUsize>,
    fetch_limits: Arc<Mutex<Vec<u32>>>,
}

#[async_trait]
impl NoticeSession for StaticSession {
    async fn count_notices(&mut self) -> Result<u64, SyncError> {
        if self.failure == Some(Failure::CountFails) {
            return Err(SyncError::RemoteQueryFailed("count failed".to_string()));
        }
        Ok(self.records.len() as u64)
    }

    async fn fetch_latest(&mut self, limit: u32) -> Result<Vec<NoticeRecord>, SyncError> {
        self.fetch_limits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(limit);
        if self.failure == Some(Failure::FetchFails) {
            return Err(SyncError::RemoteQueryFailed("fetch failed".to_string()));
        }
        let mut records = self.records.clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn close(self: Box<Self>) -> Result<(), SyncError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
