use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use deadqueue::limited::Queue;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, error, info};

use crate::{pipeline::Pipeline, request::Request};

enum Job {
    Process(Request),
    Stop,
}

/// Fixed set of download workers fed from a bounded queue.
pub struct WorkerPool {
    queue: Arc<Queue<Job>>,
    in_flight: Arc<AtomicUsize>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn start(pipeline: Arc<Pipeline>, workers: usize, queue_size: usize) -> Self {
        let queue = Arc::new(Queue::new(queue_size));
        let in_flight = Arc::new(AtomicUsize::new(0));

        let handles = (0..workers)
            .map(|n| {
                tokio::spawn(run_worker(
                    n,
                    queue.clone(),
                    pipeline.clone(),
                    in_flight.clone(),
                ))
            })
            .collect();

        info!(workers, queue_size, "Download workers started");

        Self {
            queue,
            in_flight,
            workers: Mutex::new(handles),
        }
    }

    /// Queue a request. Waits only while the queue is full.
    pub async fn submit(&self, request: Request) {
        debug!(id = %request.id, queued = self.queue.len(), "Queueing request");
        self.queue.push(Job::Process(request)).await;
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Let already queued requests finish, then stop every worker.
    pub async fn shutdown(&self) {
        let handles = std::mem::take(&mut *self.workers.lock().await);
        info!(
            workers = handles.len(),
            queued = self.queued(),
            in_flight = self.in_flight(),
            "Shutting down download workers"
        );

        for _ in 0..handles.len() {
            self.queue.push(Job::Stop).await;
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(?e, "Download worker crashed");
            }
        }

        info!("Download workers stopped");
    }
}

async fn run_worker(
    n: usize,
    queue: Arc<Queue<Job>>,
    pipeline: Arc<Pipeline>,
    in_flight: Arc<AtomicUsize>,
) {
    debug!(worker = n, "Worker ready");

    loop {
        let request = match queue.pop().await {
            Job::Process(request) => request,
            Job::Stop => break,
        };

        let id = request.id;
        in_flight.fetch_add(1, Ordering::SeqCst);

        let pipeline = pipeline.clone();
        let res = tokio::spawn(async move { pipeline.process(request).await }).await;

        in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Err(e) = res {
            error!(worker = n, %id, ?e, "Request task panicked");
        }
    }

    debug!(worker = n, "Worker stopped");
}
