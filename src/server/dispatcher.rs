/*!
 * Dispatcher
 *
 * One producer feeding a fixed pool of consumers through the lock-free queue.
 *
 * # Flow
 *
 * ```text
 * records -> producer -> LockFreeQueue<Task> -> consumers -> OrderedFeed
 *                                                   |
 *                                                   v
 *                                              ResponseSink
 * ```
 *
 * The calling thread is the producer. It enqueues each task and signals one
 * idle consumer. DONE, end of input and an undecodable record all set the
 * `closing` flag and wake every consumer.
 *
 * # Consumer states
 *
 * - `Run`: dequeue and execute; an empty queue leads to `Wait`
 * - `Wait`: parked on the idle signal until work arrives or closing is set
 * - `Drain`: closing is set, keep executing until the queue is empty
 * - `Exit`: closing is set and the queue is empty
 *
 * No queued task is dropped: consumers only exit once closing is set and the
 * queue is observed empty, and the producer stops enqueuing before it sets
 * closing.
 */

use super::codec::Response;
use super::config::{Mode, ServerConfig};
use super::sink::ResponseSink;
use super::task::Task;
use crate::core::errors::{ServerError, ServerResult};
use crate::core::limits::CONSUMER_THREAD_PREFIX;
use crate::core::sync::{IdleSignal, LockFreeQueue};
use crate::feed::OrderedFeed;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Why the producer stopped reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerExit {
    /// The record source ran dry
    EndOfInput,
    /// A DONE record was read
    Shutdown,
    /// A record could not be decoded; the rest of the input was ignored
    DecodeFailed,
}

/// Summary of one dispatcher run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub exit: ProducerExit,
    /// Tasks accepted from the source (DONE excluded)
    pub accepted: usize,
    /// Tasks executed against the feed
    pub processed: usize,
    /// Tasks executed per consumer; empty in sequential mode
    pub per_consumer: Vec<usize>,
    /// Responses the sink failed to write
    pub failed_emits: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsumerState {
    Wait,
    Run,
    Drain,
    Exit,
}

/// Producer/consumer engine around a single feed
pub struct Dispatcher<S> {
    config: ServerConfig,
    queue: LockFreeQueue<Task>,
    feed: OrderedFeed,
    closing: AtomicBool,
    idle: IdleSignal,
    sink: S,
    failed_emits: AtomicUsize,
}

impl<S: ResponseSink> Dispatcher<S> {
    pub fn new(config: ServerConfig, sink: S) -> Self {
        let feed = OrderedFeed::with_options(config.reader_cap, config.duplicate_policy);
        Self {
            config,
            queue: LockFreeQueue::new(),
            feed,
            closing: AtomicBool::new(false),
            idle: IdleSignal::new(),
            sink,
            failed_emits: AtomicUsize::new(0),
        }
    }

    /// Process `records` until DONE, end of input or a decode failure
    ///
    /// Returns once the producer has stopped and every consumer has drained
    /// the queue and exited. The feed keeps its posts across runs.
    #[tracing::instrument(name = "dispatch", skip_all, fields(mode = ?self.config.mode))]
    pub fn run<I>(&mut self, records: I) -> ServerResult<DispatchReport>
    where
        I: IntoIterator<Item = ServerResult<Task>>,
    {
        self.config.validate()?;
        self.closing.store(false, Ordering::SeqCst);
        self.failed_emits.store(0, Ordering::Relaxed);
        let start = Instant::now();

        let (exit, accepted, per_consumer) = match self.config.mode {
            Mode::Sequential => {
                let (exit, accepted) = self.pump(records, |task| self.execute(task));
                (exit, accepted, Vec::new())
            }
            Mode::Parallel { consumers } => self.run_parallel(consumers, records)?,
        };

        self.sink.flush()?;

        let processed = match self.config.mode {
            Mode::Sequential => accepted,
            Mode::Parallel { .. } => per_consumer.iter().sum(),
        };
        let report = DispatchReport {
            exit,
            accepted,
            processed,
            per_consumer,
            failed_emits: self.failed_emits.load(Ordering::Relaxed),
            elapsed: start.elapsed(),
        };
        info!(
            exit = ?report.exit,
            accepted = report.accepted,
            processed = report.processed,
            failed_emits = report.failed_emits,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Dispatcher shut down"
        );
        Ok(report)
    }

    fn run_parallel<I>(
        &self,
        consumers: usize,
        records: I,
    ) -> ServerResult<(ProducerExit, usize, Vec<usize>)>
    where
        I: IntoIterator<Item = ServerResult<Task>>,
    {
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(consumers);
            for worker in 0..consumers {
                let spawned = thread::Builder::new()
                    .name(format!("{CONSUMER_THREAD_PREFIX}-{worker}"))
                    .spawn_scoped(scope, move || self.consume(worker));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(err) => {
                        error!(worker, error = %err, "Failed to spawn consumer");
                        // Started consumers see closing and exit; the scope joins them
                        self.close();
                        return Err(ServerError::Io(err));
                    }
                }
            }
            debug!(consumers, "Consumers started");

            let (exit, accepted) = self.pump(records, |task| {
                self.queue.enqueue(task);
                self.idle.notify_one();
            });

            // Join barrier: every consumer must reach Exit
            let mut per_consumer = Vec::with_capacity(consumers);
            let mut panicked = None;
            for handle in handles {
                match handle.join() {
                    Ok(processed) => per_consumer.push(processed),
                    Err(payload) => {
                        let message = panic_message(payload);
                        error!(panic = %message, "Consumer panicked");
                        panicked.get_or_insert(message);
                    }
                }
            }
            match panicked {
                Some(message) => Err(ServerError::WorkerPanicked(message)),
                None => Ok((exit, accepted, per_consumer)),
            }
        })
    }

    /// Producer loop: read records and hand each task to `dispatch`
    fn pump<I, F>(&self, records: I, mut dispatch: F) -> (ProducerExit, usize)
    where
        I: IntoIterator<Item = ServerResult<Task>>,
        F: FnMut(Task),
    {
        let mut accepted = 0;
        let mut exit = ProducerExit::EndOfInput;

        for record in records {
            match record {
                Ok(Task::Shutdown) => {
                    exit = ProducerExit::Shutdown;
                    break;
                }
                Ok(task) => {
                    trace!(kind = %task.kind(), id = ?task.request_id(), "Task accepted");
                    dispatch(task);
                    accepted += 1;
                }
                Err(err) => {
                    error!(error = %err, accepted, "Undecodable request, producer stopping");
                    exit = ProducerExit::DecodeFailed;
                    break;
                }
            }
        }

        self.close();
        (exit, accepted)
    }

    /// Set the closing flag and wake every idle consumer
    fn close(&self) {
        self.closing.store(true, Ordering::SeqCst);
        let woken = self.idle.notify_all();
        debug!(woken = woken.count(), "Dispatcher closing");
    }

    #[inline]
    fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }

    fn active_state(&self) -> ConsumerState {
        if self.is_closing() {
            ConsumerState::Drain
        } else {
            ConsumerState::Run
        }
    }

    /// Consumer loop; returns the number of tasks this consumer executed
    fn consume(&self, worker: usize) -> usize {
        let mut processed = 0;
        let mut state = ConsumerState::Run;
        debug!(worker, "Consumer started");

        loop {
            let next = match state {
                ConsumerState::Run | ConsumerState::Drain => match self.queue.dequeue() {
                    Some(task) => {
                        self.execute(task);
                        processed += 1;
                        self.active_state()
                    }
                    None if self.is_closing() && self.queue.is_empty() => ConsumerState::Exit,
                    None => ConsumerState::Wait,
                },
                ConsumerState::Wait => {
                    self.idle
                        .wait_while(|| !self.is_closing() && self.queue.is_empty());
                    self.active_state()
                }
                ConsumerState::Exit => break,
            };
            if next != state {
                trace!(worker, from = ?state, to = ?next, "Consumer state change");
            }
            state = next;
        }

        debug!(worker, processed, "Consumer exited");
        processed
    }

    /// Apply a task to the feed and emit its response
    fn execute(&self, task: Task) {
        let response = match task {
            Task::Add {
                id,
                body,
                timestamp,
            } => Response::ack(id, self.feed.add(body, timestamp)),
            Task::Remove { id, timestamp } => Response::ack(id, self.feed.remove(timestamp)),
            Task::Contains { id, timestamp } => Response::ack(id, self.feed.contains(timestamp)),
            Task::Feed { id } => Response::feed(id, self.feed.all_posts()),
            Task::Shutdown => return,
        };

        if let Err(err) = self.sink.emit(&response) {
            self.failed_emits.fetch_add(1, Ordering::Relaxed);
            warn!(id = response.id(), error = %err, "Failed to emit response");
        }
    }

    pub fn feed(&self) -> &OrderedFeed {
        &self.feed
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::PostContent;
    use crate::server::sink::MemorySink;
    use pretty_assertions::assert_eq;

    fn add(id: i64, body: &str, timestamp: f64) -> ServerResult<Task> {
        Ok(Task::Add {
            id,
            body: body.to_string(),
            timestamp,
        })
    }

    #[test]
    fn test_sequential_responses_in_order() {
        let mut dispatcher = Dispatcher::new(ServerConfig::sequential(), MemorySink::new());
        let report = dispatcher
            .run(vec![
                add(1, "hi", 5.0),
                add(2, "yo", 7.0),
                Ok(Task::Remove { id: 3, timestamp: 5.0 }),
                Ok(Task::Contains { id: 4, timestamp: 5.0 }),
                Ok(Task::Feed { id: 5 }),
                Ok(Task::Remove { id: 6, timestamp: 99.0 }),
                Ok(Task::Shutdown),
                add(7, "never", 1.0),
            ])
            .unwrap();

        assert_eq!(report.exit, ProducerExit::Shutdown);
        assert_eq!(report.accepted, 6);
        assert_eq!(report.processed, 6);
        assert!(report.per_consumer.is_empty());
        assert_eq!(
            dispatcher.sink().responses(),
            vec![
                Response::ack(1, true),
                Response::ack(2, true),
                Response::ack(3, true),
                Response::ack(4, false),
                Response::feed(5, vec![PostContent::new("yo", 7.0)]),
                Response::ack(6, false),
            ]
        );
    }

    #[test]
    fn test_parallel_drains_after_shutdown() {
        let mut dispatcher = Dispatcher::new(ServerConfig::parallel(3), MemorySink::new());
        let mut records: Vec<_> = (0..300).map(|i| add(i, "p", i as f64)).collect();
        records.push(Ok(Task::Shutdown));

        let report = dispatcher.run(records).unwrap();
        assert_eq!(report.exit, ProducerExit::Shutdown);
        assert_eq!(report.accepted, 300);
        assert_eq!(report.processed, 300);
        assert_eq!(report.per_consumer.len(), 3);
        assert_eq!(dispatcher.sink().len(), 300);
        assert_eq!(dispatcher.feed().len(), 300);
    }

    #[test]
    fn test_decode_failure_stops_producer() {
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let mut dispatcher = Dispatcher::new(ServerConfig::parallel(2), MemorySink::new());
        let report = dispatcher
            .run(vec![add(1, "a", 1.0), Err(bad.into()), add(2, "b", 2.0)])
            .unwrap();

        assert_eq!(report.exit, ProducerExit::DecodeFailed);
        assert_eq!(report.accepted, 1);
        assert_eq!(dispatcher.sink().responses(), vec![Response::ack(1, true)]);
    }

    #[test]
    fn test_end_of_input_without_done() {
        let mut dispatcher = Dispatcher::new(ServerConfig::parallel(2), MemorySink::new());
        let report = dispatcher.run(Vec::<ServerResult<Task>>::new()).unwrap();
        assert_eq!(report.exit, ProducerExit::EndOfInput);
        assert_eq!(report.processed, 0);
        assert_eq!(report.per_consumer, vec![0, 0]);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut dispatcher = Dispatcher::new(ServerConfig::parallel(0), MemorySink::new());
        assert!(matches!(
            dispatcher.run(Vec::<ServerResult<Task>>::new()),
            Err(ServerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_panic_message() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new(String::from("bang"))), "bang");
        assert_eq!(panic_message(Box::new(3u8)), "unknown panic");
    }
}
