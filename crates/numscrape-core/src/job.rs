//! Scrape job orchestration.
//!
//! A job pulls up to `limit` messages newest-first from a [`MessageSource`],
//! classifies each one, shuffles everything it collected and hands the result to
//! an [`OutputSink`]. Jobs own all their state; nothing is shared between them
//! besides the immutable [`ScrapeSettings`].

use rand::{seq::SliceRandom, Rng};

use crate::{
    classify::classify,
    delivery::OutputSink,
    domain::{Mode, TargetChat},
    extract::Candidate,
    formatting::{
        completed_caption, empty_status, failed_status, progress_status, started_status,
        truncate_chars,
    },
    source::MessageSource,
    Result,
};

const MAX_REASON_CHARS: usize = 300;

/// Job-independent settings, fixed at construction time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrapeSettings {
    pub target: TargetChat,
    /// Update the status every N scanned messages (0 disables progress updates).
    pub progress_every: usize,
}

/// What the requester asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub mode: Mode,
    pub limit: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running { scanned: usize, collected: usize },
    Completed { count: usize },
    Failed { reason: String },
    /// Every message was processed and none yielded a candidate.
    Empty,
}

pub struct ScrapeJob {
    settings: ScrapeSettings,
    request: ScrapeRequest,
    state: JobState,
}

impl ScrapeJob {
    pub fn new(settings: ScrapeSettings, request: ScrapeRequest) -> Self {
        Self {
            settings,
            request,
            state: JobState::Idle,
        }
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Run the job to a terminal state.
    ///
    /// Source and delivery faults end in [`JobState::Failed`]; they are reported
    /// through the sink rather than returned.
    pub async fn run<R>(
        &mut self,
        source: &dyn MessageSource,
        sink: &dyn OutputSink,
        rng: &mut R,
    ) -> &JobState
    where
        R: Rng + Send + ?Sized,
    {
        let ScrapeRequest { mode, limit } = self.request;
        self.state = JobState::Running {
            scanned: 0,
            collected: 0,
        };
        tracing::info!(
            %mode,
            limit,
            source = source.name(),
            chat = %self.settings.target,
            "scrape started"
        );
        report(sink, &started_status(mode, limit)).await;

        let mut candidates = match self.collect(source, sink).await {
            Ok(c) => c,
            Err(e) => return self.fail(sink, &e.to_string()).await,
        };

        if candidates.is_empty() {
            tracing::info!(%mode, "scrape finished without matches");
            self.state = JobState::Empty;
            report(sink, &empty_status()).await;
            return &self.state;
        }

        candidates.shuffle(rng);
        let count = candidates.len();
        let caption = completed_caption(mode, count);

        if let Err(e) = sink
            .deliver(&mode.output_file_name(), &candidates, &caption)
            .await
        {
            return self.fail(sink, &e.to_string()).await;
        }

        tracing::info!(%mode, count, "scrape completed");
        self.state = JobState::Completed { count };
        &self.state
    }

    async fn collect(
        &mut self,
        source: &dyn MessageSource,
        sink: &dyn OutputSink,
    ) -> Result<Vec<Candidate>> {
        let ScrapeRequest { mode, limit } = self.request;
        let mut cursor = source.history(&self.settings.target, limit).await?;

        let mut candidates = Vec::new();
        let mut scanned = 0usize;
        while scanned < limit {
            let Some(msg) = cursor.next_message().await? else {
                break;
            };
            scanned += 1;
            candidates.extend(classify(msg.text.as_deref(), mode));

            self.state = JobState::Running {
                scanned,
                collected: candidates.len(),
            };
            let every = self.settings.progress_every;
            if every > 0 && scanned % every == 0 && scanned < limit {
                report(
                    sink,
                    &progress_status(mode, scanned, limit, candidates.len()),
                )
                .await;
            }
        }

        tracing::debug!(%mode, scanned, collected = candidates.len(), "history exhausted");
        Ok(candidates)
    }

    async fn fail(&mut self, sink: &dyn OutputSink, reason: &str) -> &JobState {
        tracing::warn!(mode = %self.request.mode, "scrape failed: {reason}");
        let reason = truncate_chars(reason, MAX_REASON_CHARS);
        report(sink, &failed_status(&reason)).await;
        self.state = JobState::Failed { reason };
        &self.state
    }
}

/// Status updates are best-effort; a lost status never fails the job.
async fn report(sink: &dyn OutputSink, html: &str) {
    if let Err(e) = sink.status(html).await {
        tracing::warn!("failed to update status: {e}");
    }
}
