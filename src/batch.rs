use crate::client::CompressionClient;
use crate::download::DownloadPolicy;
use crate::error::CompressionError;
use crate::resolver::Source;
use crate::utils::{calculate_compression_ratio, format_file_size, progress_style};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, Span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// One file or URL to compress, owned by whichever worker picks it up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionJob {
    pub source: Source,
    /// `None` writes the result next to the source
    pub output_dir: Option<PathBuf>,
}

impl CompressionJob {
    pub fn new(source: Source, output_dir: Option<PathBuf>) -> Self {
        Self { source, output_dir }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedJob {
    pub output: PathBuf,
    pub original_size: u64,
    pub compressed_size: u64,
    pub written: u64,
}

#[derive(Debug)]
pub enum JobStatus {
    Done(CompletedJob),
    Failed(CompressionError),
}

#[derive(Debug)]
pub struct JobOutcome {
    pub source: Source,
    pub worker: usize,
    pub status: JobStatus,
}

impl JobOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self.status, JobStatus::Done(_))
    }
}

/// Every outcome of a batch, in completion order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<JobOutcome>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_done()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Source, &CompressionError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            JobStatus::Failed(e) => Some((&o.source, e)),
            JobStatus::Done(_) => None,
        })
    }

    /// Consumes the report and returns the first failure, if any.
    pub fn into_first_error(self) -> Option<CompressionError> {
        self.outcomes.into_iter().find_map(|o| match o.status {
            JobStatus::Failed(e) => Some(e),
            JobStatus::Done(_) => None,
        })
    }

    pub fn total_sizes(&self) -> (u64, u64) {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.status {
                JobStatus::Done(done) => Some((done.original_size, done.compressed_size)),
                JobStatus::Failed(_) => None,
            })
            .fold((0, 0), |(before, after), (o, c)| (before + o, after + c))
    }

    pub fn print_summary(&self) {
        let (total_before, total_after) = self.total_sizes();

        println!("\n📊 Batch Compression Summary:");
        println!("  📁 Files processed: {}", self.total());
        println!("  ✅ Succeeded: {}", self.succeeded());
        if self.failed() > 0 {
            println!("  ⚠️  Failed: {}", self.failed());
        }
        println!("  📊 Total original size: {}", format_file_size(total_before));
        println!("  📊 Total compressed size: {}", format_file_size(total_after));
        println!(
            "  🎯 Overall compression ratio: {:.1}%",
            calculate_compression_ratio(total_before, total_after)
        );
        println!("  ⏱️  Total time: {:.2?}", self.elapsed);
    }
}

/// Fixed-size pool of workers sharing one job queue.
///
/// Each job is delivered to exactly one worker and runs in its own task, so a failing or
/// panicking job is recorded and the worker moves on to the next one.
pub struct BatchRunner {
    client: Arc<dyn CompressionClient>,
    policy: Arc<DownloadPolicy>,
    workers: usize,
    progress: Option<Span>,
}

impl BatchRunner {
    pub fn new(client: Arc<dyn CompressionClient>, policy: DownloadPolicy, workers: usize) -> Self {
        Self {
            client,
            policy: Arc::new(policy),
            workers: workers.max(1),
            progress: None,
        }
    }

    /// Draws a bar on `span`, advanced once per finished job. The caller keeps the span
    /// entered (or instruments `run` with it) while the batch runs.
    pub fn with_progress(mut self, span: Span) -> Self {
        self.progress = Some(span);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every job to completion and returns once all workers have drained the queue.
    pub async fn run(&self, jobs: Vec<CompressionJob>) -> BatchReport {
        let start_time = Instant::now();
        let total = jobs.len();
        if total == 0 {
            return BatchReport::default();
        }

        let worker_count = self.workers.min(total);
        debug!(
            jobs = total,
            workers = worker_count,
            client = self.client.name(),
            "starting batch"
        );

        if let Some(span) = &self.progress {
            span.pb_set_style(&progress_style());
            span.pb_set_length(total as u64);
        }

        let (tx, rx) = mpsc::channel::<CompressionJob>(worker_count);
        let rx = Arc::new(Mutex::new(rx));

        // Dropping the sender once everything is queued closes the channel.
        let producer = tokio::spawn(async move {
            for job in jobs {
                if tx.send(job).await.is_err() {
                    break;
                }
            }
        });

        let mut pool = JoinSet::new();
        for id in 0..worker_count {
            let rx = Arc::clone(&rx);
            let client = Arc::clone(&self.client);
            let policy = Arc::clone(&self.policy);
            let progress = self.progress.clone();
            pool.spawn(async move {
                let mut outcomes = Vec::new();
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(job) = next else { break };

                    let source = job.source.clone();
                    let task = tokio::spawn(process_job(
                        id,
                        job,
                        Arc::clone(&client),
                        Arc::clone(&policy),
                    ));
                    // A panicking job still leaves exactly one outcome behind.
                    let outcome = match task.await {
                        Ok(outcome) => outcome,
                        Err(e) => {
                            error!(worker = id, source = %source, error = %e, "job aborted");
                            JobOutcome {
                                source,
                                worker: id,
                                status: JobStatus::Failed(CompressionError::JobAborted(e.to_string())),
                            }
                        }
                    };
                    if let Some(span) = &progress {
                        span.pb_inc(1);
                    }
                    outcomes.push(outcome);
                }
                debug!(worker = id, processed = outcomes.len(), "worker finished");
                outcomes
            });
        }
        // Workers own the receiver now; if they all die the producer stops instead of blocking.
        drop(rx);

        let mut report = BatchReport::default();
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(outcomes) => report.outcomes.extend(outcomes),
                Err(e) => error!(error = %e, "worker task aborted"),
            }
        }
        if let Err(e) = producer.await {
            error!(error = %e, "job producer aborted");
        }

        report.elapsed = start_time.elapsed();
        report
    }
}

/// Compress, then download. Any failure ends the job but not the worker.
async fn process_job(
    worker: usize,
    job: CompressionJob,
    client: Arc<dyn CompressionClient>,
    policy: Arc<DownloadPolicy>,
) -> JobOutcome {
    debug!(worker, source = %job.source, "job in flight");

    let result = async {
        let artifact = client.compress(&job.source).await?;
        let output = policy.resolve(&job.source, &artifact, job.output_dir.as_deref())?;
        let written = policy.materialize(&artifact, &output).await?;
        Ok::<_, CompressionError>(CompletedJob {
            output,
            original_size: artifact.original_size,
            compressed_size: artifact.compressed_size,
            written,
        })
    }
    .await;

    let status = match result {
        Ok(done) => {
            info!(
                source = %job.source,
                output = %done.output.display(),
                original = %format_file_size(done.original_size),
                compressed = %format_file_size(done.compressed_size),
                "compressed, {:.1}% smaller",
                calculate_compression_ratio(done.original_size, done.compressed_size)
            );
            JobStatus::Done(done)
        }
        Err(e) => {
            error!(source = %job.source, error = %e, "failed to compress");
            JobStatus::Failed(e)
        }
    };

    JobOutcome {
        source: job.source,
        worker,
        status,
    }
}
