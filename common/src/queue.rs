//! Bounded queue monitor coordinating producers and consumers
//!
//! One mutex guards the queue contents, the completion flag and the shared
//! input cursor. Producers must wait for space *before* reading, and the read
//! itself happens under the lock, so each record is read by exactly one
//! producer exactly once. Which producer gets which record is decided by lock
//! acquisition order; with more than one producer the source-to-queue order
//! is nondeterministic even though no record is duplicated or lost.
//!
//! The completion flag is one-shot: it transitions `false -> true` at most
//! once and never resets. Setting it when already set is a no-op.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::source::{Line, LineRead};

/// Result of `pop`: either a record or the end-of-stream sentinel.
///
/// `EndOfStream` is only returned once the queue is empty *and* the
/// completion flag is set; a consumer observing it can exit immediately.
#[derive(Debug, PartialEq, Eq)]
pub enum Popped {
    Line(Line),
    EndOfStream,
}

struct State<S> {
    items: VecDeque<Line>,
    source: S,
    completed: bool,
}

/// Fixed-capacity FIFO shared between producer and consumer threads.
///
/// Capacity is enforced purely by blocking; callers can never observe more
/// than `capacity` queued records. Waiting uses the standard wait-recheck
/// loop, so spurious wakeups re-evaluate the predicate.
pub struct BoundedQueue<S> {
    state: Mutex<State<S>>,
    not_full: Condvar,
    not_empty: Condvar,
    capacity: usize,
}

impl<S: LineRead> BoundedQueue<S> {
    pub fn new(capacity: usize, source: S) -> Self {
        assert!(capacity > 0);
        BoundedQueue {
            state: Mutex::new(State {
                items: VecDeque::with_capacity(capacity),
                source,
                completed: false,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
            capacity,
        }
    }

    /// Producer step: wait for space, read the next record under the lock and
    /// queue it. Returns `Ok(false)` once the input is exhausted (whether
    /// this producer hit end-of-input itself or another one already did).
    ///
    /// End-of-input sets the completion flag and broadcasts to *all* blocked
    /// consumers -- each of them must re-evaluate the now-true flag, a single
    /// wake would strand the rest. A read error also completes the queue
    /// before propagating so no thread is left waiting behind a failed
    /// producer pool.
    pub fn push_next(&self) -> std::io::Result<bool> {
        let mut state = self.state.lock();
        while state.items.len() >= self.capacity && !state.completed {
            self.not_full.wait(&mut state);
        }
        if state.completed {
            return Ok(false);
        }
        match state.source.next_line() {
            Ok(Some(line)) => {
                state.items.push_back(line);
                self.not_empty.notify_one();
                Ok(true)
            }
            Ok(None) => {
                debug!("input exhausted, completing queue");
                state.completed = true;
                self.not_empty.notify_all();
                Ok(false)
            }
            Err(error) => {
                state.completed = true;
                self.not_empty.notify_all();
                self.not_full.notify_all();
                Err(error)
            }
        }
    }

    /// Consumer step: wait while the queue is empty and not completed.
    /// Removing a record wakes one blocked producer.
    pub fn pop(&self) -> Popped {
        let mut state = self.state.lock();
        while state.items.is_empty() && !state.completed {
            self.not_empty.wait(&mut state);
        }
        match state.items.pop_front() {
            Some(line) => {
                self.not_full.notify_one();
                Popped::Line(line)
            }
            None => Popped::EndOfStream,
        }
    }

    /// Abort hook for the orchestrator: complete the queue and wake every
    /// waiter on both sides. Idempotent.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        if !state.completed {
            debug!("queue shutdown requested");
            state.completed = true;
        }
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_completed(&self) -> bool {
        self.state.lock().completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    struct StubSource(std::vec::IntoIter<&'static [u8]>);

    impl StubSource {
        fn new(lines: Vec<&'static [u8]>) -> Self {
            StubSource(lines.into_iter())
        }
    }

    impl LineRead for StubSource {
        fn next_line(&mut self) -> std::io::Result<Option<Line>> {
            Ok(self.0.next().map(Line::from_static))
        }
    }

    struct FailingSource;

    impl LineRead for FailingSource {
        fn next_line(&mut self) -> std::io::Result<Option<Line>> {
            Err(std::io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn single_producer_preserves_fifo_order() {
        let queue = BoundedQueue::new(20, StubSource::new(vec![b"a", b"b", b"c"]));
        while queue.push_next().unwrap() {}
        assert_eq!(queue.pop(), Popped::Line(Line::from_static(b"a")));
        assert_eq!(queue.pop(), Popped::Line(Line::from_static(b"b")));
        assert_eq!(queue.pop(), Popped::Line(Line::from_static(b"c")));
        assert_eq!(queue.pop(), Popped::EndOfStream);
    }

    #[test]
    fn end_of_stream_only_after_drain() {
        let queue = BoundedQueue::new(20, StubSource::new(vec![b"x"]));
        while queue.push_next().unwrap() {}
        assert!(queue.is_completed());
        // completed but not yet drained: the queued record comes first
        assert_eq!(queue.pop(), Popped::Line(Line::from_static(b"x")));
        assert_eq!(queue.pop(), Popped::EndOfStream);
        assert_eq!(queue.pop(), Popped::EndOfStream);
    }

    #[test]
    fn empty_source_completes_immediately() {
        let queue = BoundedQueue::new(20, StubSource::new(vec![]));
        assert!(!queue.push_next().unwrap());
        assert!(queue.is_completed());
        assert_eq!(queue.pop(), Popped::EndOfStream);
    }

    #[test]
    fn completion_is_idempotent_across_producers() {
        let queue = Arc::new(BoundedQueue::new(20, StubSource::new(vec![b"only"])));
        let mut handles = vec![];
        for _ in 0..4 {
            let queue = queue.clone();
            handles.push(std::thread::spawn(move || {
                let mut pushed = 0usize;
                while queue.push_next().unwrap() {
                    pushed += 1;
                }
                pushed
            }));
        }
        let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(total, 1);
        assert!(queue.is_completed());
    }

    #[test]
    fn producer_blocks_while_full() {
        let lines: Vec<&'static [u8]> = (0..5).map(|_| &b"line"[..]).collect();
        let queue = Arc::new(BoundedQueue::new(2, StubSource::new(lines)));
        let producer = {
            let queue = queue.clone();
            std::thread::spawn(move || while queue.push_next().unwrap() {})
        };
        std::thread::sleep(Duration::from_millis(100));
        // producer must be parked on the not-full condvar with 2 queued
        assert_eq!(queue.len(), 2);
        assert!(!queue.is_completed());
        let mut popped = 0;
        while queue.pop() != Popped::EndOfStream {
            popped += 1;
            assert!(queue.len() <= 2);
        }
        producer.join().unwrap();
        assert_eq!(popped, 5);
    }

    #[test]
    fn consumer_blocks_until_line_or_completion() {
        let queue = Arc::new(BoundedQueue::new(4, StubSource::new(vec![b"late"])));
        let consumer = {
            let queue = queue.clone();
            std::thread::spawn(move || {
                let first = queue.pop();
                let second = queue.pop();
                (first, second)
            })
        };
        std::thread::sleep(Duration::from_millis(100));
        while queue.push_next().unwrap() {}
        let (first, second) = consumer.join().unwrap();
        assert_eq!(first, Popped::Line(Line::from_static(b"late")));
        assert_eq!(second, Popped::EndOfStream);
    }

    #[test]
    fn shutdown_unblocks_consumers() {
        let queue = Arc::new(BoundedQueue::new(4, StubSource::new(vec![b"never read"])));
        let consumer = {
            let queue = queue.clone();
            std::thread::spawn(move || queue.pop())
        };
        std::thread::sleep(Duration::from_millis(50));
        queue.shutdown();
        assert_eq!(consumer.join().unwrap(), Popped::EndOfStream);
        // push after shutdown is a no-op
        assert!(!queue.push_next().unwrap());
        assert!(queue.is_empty());
    }

    #[test]
    fn read_error_completes_queue_before_propagating() {
        let queue = Arc::new(BoundedQueue::new(4, FailingSource));
        let consumer = {
            let queue = queue.clone();
            std::thread::spawn(move || queue.pop())
        };
        std::thread::sleep(Duration::from_millis(50));
        assert!(queue.push_next().is_err());
        assert!(queue.is_completed());
        assert_eq!(consumer.join().unwrap(), Popped::EndOfStream);
    }

    #[test]
    fn capacity_never_exceeded_under_contention() {
        let lines: Vec<&'static [u8]> = (0..200).map(|_| &b"payload"[..]).collect();
        let expected = lines.len();
        let queue = Arc::new(BoundedQueue::new(3, StubSource::new(lines)));
        let mut producers = vec![];
        for _ in 0..2 {
            let queue = queue.clone();
            producers.push(std::thread::spawn(move || {
                while queue.push_next().unwrap() {
                    assert!(queue.len() <= 3);
                }
            }));
        }
        let mut consumers = vec![];
        for _ in 0..2 {
            let queue = queue.clone();
            consumers.push(std::thread::spawn(move || {
                let mut count = 0usize;
                while let Popped::Line(_) = queue.pop() {
                    assert!(queue.len() <= 3);
                    count += 1;
                }
                count
            }));
        }
        for producer in producers {
            producer.join().unwrap();
        }
        let consumed: usize = consumers.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(consumed, expected);
    }
}
