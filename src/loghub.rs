// ABOUTME: Bounded ring buffer of request log entries with multi-subscriber fan-out
// ABOUTME: Non-blocking delivery; slow subscribers drop entries, the ring stays authoritative
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright (c) 2025 Mock OIDC Server Project

//! Request log hub.
//!
//! The hub keeps the last `capacity` entries in a ring and fans every append
//! out to live subscribers over bounded channels. Delivery uses `try_send`:
//! a subscriber whose channel is full simply misses that entry. Subscribers
//! therefore never back-pressure the request pipeline, and `snapshot` is the
//! authoritative view of recent history.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tokio::sync::mpsc;

use crate::models::LogEntry;

/// Per-subscriber channel depth
const SUBSCRIBER_BUFFER: usize = 64;

#[derive(Debug)]
struct HubInner {
    ring: VecDeque<LogEntry>,
    subscribers: HashMap<u64, mpsc::Sender<LogEntry>>,
    next_subscriber_id: u64,
}

/// A live feed of log entries.
///
/// Dropping the subscription (or calling [`LogHub::unsubscribe`]) closes the
/// channel; the receiver then observes end-of-stream.
#[derive(Debug)]
pub struct LogSubscription {
    pub id: u64,
    pub receiver: mpsc::Receiver<LogEntry>,
}

/// Bounded request-log ring with publish/subscribe fan-out.
#[derive(Debug)]
pub struct LogHub {
    capacity: usize,
    inner: Mutex<HubInner>,
}

impl LogHub {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(HubInner {
                ring: VecDeque::with_capacity(capacity),
                subscribers: HashMap::new(),
                next_subscriber_id: 0,
            }),
        }
    }

    /// Append an entry, evicting the oldest at capacity, then fan out to
    /// subscribers without blocking.
    pub fn append(&self, entry: LogEntry) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock();

        if inner.ring.len() == self.capacity {
            inner.ring.pop_front();
        }
        inner.ring.push_back(entry.clone());

        for sender in inner.subscribers.values() {
            // Full or closed channels lose this entry; the ring is the
            // authoritative record.
            let _ = sender.try_send(entry.clone());
        }
    }

    /// Copy of the stored entries, oldest first
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.inner.lock().ring.iter().cloned().collect()
    }

    /// Number of entries currently stored
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().ring.is_empty()
    }

    /// Register a new subscriber with a bounded buffer
    #[must_use]
    pub fn subscribe(&self) -> LogSubscription {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_BUFFER);
        let mut inner = self.inner.lock();
        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;
        inner.subscribers.insert(id, sender);
        LogSubscription { id, receiver }
    }

    /// Remove a subscriber; its receiver observes channel closure
    pub fn unsubscribe(&self, id: u64) {
        self.inner.lock().subscribers.remove(&id);
    }

    /// Drop every subscriber channel. Called on shutdown so receivers see
    /// end-of-stream instead of a hung channel.
    pub fn close(&self) {
        self.inner.lock().subscribers.clear();
    }
}
