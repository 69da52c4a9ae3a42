//! Background height-field generation on a worker thread pool.
//!
//! Every accepted submission gets a ticket. A coordinate has at most one live
//! ticket at a time, and only the result carrying that ticket is delivered:
//! results of cancelled submissions are dropped on drain even if a worker
//! finished them before the cancel landed. Output is bit-identical to
//! [`generate_height_field`] on the calling thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, bounded};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::coord::ChunkCoord;
use crate::heightfield::{ChunkGrid, HeightField, generate_height_field};
use crate::sampler::TerrainSampler;

/// A request to generate one chunk's height field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightFieldTask {
    pub grid: ChunkGrid,
    /// Lower runs sooner within a [`AsyncHeightFieldGenerator::submit_batch`];
    /// typically the squared chunk distance to the viewer.
    pub priority: u64,
}

impl HeightFieldTask {
    pub fn coord(&self) -> ChunkCoord {
        self.grid.coord
    }
}

/// A finished height field.
#[derive(Debug)]
pub struct GeneratedHeightField {
    /// Ticket returned by the submit that produced this field.
    pub ticket: u64,
    pub coord: ChunkCoord,
    pub field: HeightField,
    pub generation_time_us: u64,
}

struct Job {
    ticket: u64,
    grid: ChunkGrid,
    cancelled: Arc<AtomicBool>,
}

struct Pending {
    ticket: u64,
    cancelled: Arc<AtomicBool>,
}

/// Worker body: runs jobs until every sender is gone.
fn run_jobs(
    sampler: &TerrainSampler,
    jobs: &Receiver<Job>,
    results: &Sender<GeneratedHeightField>,
    in_flight: &AtomicU64,
) {
    for job in jobs.iter() {
        if !job.cancelled.load(Ordering::Acquire) {
            let start = Instant::now();
            let field = generate_height_field(sampler, &job.grid);
            let generated = GeneratedHeightField {
                ticket: job.ticket,
                coord: job.grid.coord,
                field,
                generation_time_us: start.elapsed().as_micros() as u64,
            };
            if !job.cancelled.load(Ordering::Acquire) && results.send(generated).is_err() {
                in_flight.fetch_sub(1, Ordering::AcqRel);
                return;
            }
        }
        in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Generates height fields across a pool of worker threads.
pub struct AsyncHeightFieldGenerator {
    jobs: Sender<Job>,
    results: Receiver<GeneratedHeightField>,
    pending: DashMap<ChunkCoord, Pending>,
    next_ticket: AtomicU64,
    in_flight: Arc<AtomicU64>,
}

impl AsyncHeightFieldGenerator {
    /// Spawn `thread_count` workers (at least one).
    ///
    /// `max_queued` bounds the submissions waiting for a worker and
    /// `result_capacity` bounds the finished fields waiting for a drain.
    pub fn new(
        sampler: Arc<TerrainSampler>,
        thread_count: usize,
        max_queued: usize,
        result_capacity: usize,
    ) -> std::io::Result<Self> {
        let (jobs, job_queue) = bounded::<Job>(max_queued.max(1));
        let (result_sender, results) = bounded(result_capacity.max(1));
        let in_flight = Arc::new(AtomicU64::new(0));
        let threads = thread_count.max(1);

        for index in 0..threads {
            let sampler = Arc::clone(&sampler);
            let job_queue = job_queue.clone();
            let result_sender = result_sender.clone();
            let in_flight = Arc::clone(&in_flight);
            std::thread::Builder::new()
                .name(format!("heightfield-worker-{index}"))
                .spawn(move || run_jobs(&sampler, &job_queue, &result_sender, &in_flight))?;
        }
        tracing::debug!("Spawned {threads} height-field workers");

        Ok(Self {
            jobs,
            results,
            pending: DashMap::new(),
            next_ticket: AtomicU64::new(1),
            in_flight,
        })
    }

    /// A pool sized to the machine, leaving one core for the calling thread.
    pub fn with_defaults(sampler: Arc<TerrainSampler>) -> std::io::Result<Self> {
        let threads = num_cpus::get().saturating_sub(1).max(1);
        Self::new(sampler, threads, 64, 128)
    }

    /// Queue `task` and return its ticket.
    ///
    /// The task comes back when its coordinate already has a live ticket or
    /// the queue is full.
    pub fn submit(&self, task: HeightFieldTask) -> Result<u64, HeightFieldTask> {
        let coord = task.coord();
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let cancelled = Arc::new(AtomicBool::new(false));

        match self.pending.entry(coord) {
            Entry::Occupied(_) => return Err(task),
            Entry::Vacant(slot) => {
                slot.insert(Pending {
                    ticket,
                    cancelled: Arc::clone(&cancelled),
                });
            }
        }

        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let job = Job {
            ticket,
            grid: task.grid,
            cancelled,
        };
        if self.jobs.try_send(job).is_err() {
            self.in_flight.fetch_sub(1, Ordering::AcqRel);
            self.pending.remove_if(&coord, |_, p| p.ticket == ticket);
            return Err(task);
        }
        Ok(ticket)
    }

    /// Submit the most urgent tasks first, stopping after `limit` are
    /// accepted. Returns how many were accepted.
    pub fn submit_batch(&self, mut tasks: Vec<HeightFieldTask>, limit: usize) -> usize {
        tasks.sort_by_key(|task| (task.priority, task.coord()));
        let mut accepted = 0;
        for task in tasks {
            if accepted == limit {
                break;
            }
            if self.submit(task).is_ok() {
                accepted += 1;
            }
        }
        accepted
    }

    /// Cancel the live ticket for `coord`. Returns `false` when there was none.
    pub fn cancel(&self, coord: &ChunkCoord) -> bool {
        match self.pending.remove(coord) {
            Some((_, pending)) => {
                pending.cancelled.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// Finished fields for live tickets, without blocking.
    pub fn drain_results(&self) -> Vec<GeneratedHeightField> {
        self.results
            .try_iter()
            .filter(|generated| {
                self.pending
                    .remove_if(&generated.coord, |_, p| p.ticket == generated.ticket)
                    .is_some()
            })
            .collect()
    }

    /// Submissions queued or running.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_pending(&self, coord: &ChunkCoord) -> bool {
        self.pending.contains_key(coord)
    }

    /// Coordinates with a live ticket, in no particular order.
    pub fn pending_coords(&self) -> Vec<ChunkCoord> {
        self.pending.iter().map(|entry| *entry.key()).collect()
    }
}
