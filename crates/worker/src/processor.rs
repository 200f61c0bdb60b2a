//! The worker loop: polls subscriber control rooms, dispatches
//! commands, and drives room summarization.

use chrono::{NaiveDate, Utc};
use lookout_database::{
    daily_count, processing_state, room, subscriber, summary, task, Database, DatabaseError,
    NewSummary, Subscriber, TaskChange, WatchedRoom,
};
use summarizer_core::{
    build_context, ContextMessage, PendingTask, PreviousRun, RoomDescriptor, Summarizer,
    SummarizerError,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::commands::{self, Command};
use crate::config::WorkerConfig;
use crate::formatting;
use crate::gateway::{Gateway, GatewayResolver, MatrixError};

/// Errors that can occur while processing a subscriber.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Error talking to the chat platform.
    #[error("gateway error: {0}")]
    Gateway(#[from] MatrixError),

    /// Error from the summarizer backend.
    #[error("summarizer error: {0}")]
    Summarizer(#[from] SummarizerError),

    /// Error from the persistence layer.
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// The staged context payload could not be serialized.
    #[error("context serialization failed: {0}")]
    Context(#[from] serde_json::Error),
}

/// The long-running worker.
///
/// Generic over the gateway and summarizer so tests can run the whole
/// loop against in-memory doubles.
pub struct Worker<G: Gateway, S: Summarizer> {
    db: Database,
    gateway: G,
    summarizer: S,
    config: WorkerConfig,
}

impl<G: Gateway, S: Summarizer> Worker<G, S> {
    /// Create a new worker.
    pub fn new(db: Database, gateway: G, summarizer: S, config: WorkerConfig) -> Self {
        Self {
            db,
            gateway,
            summarizer,
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run until the token is cancelled.
    ///
    /// Cancellation is checked between subscribers and between cycles:
    /// the in-flight subscriber finishes, no new one starts.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(
            "Worker started (cycle delay {:?}, summarizer: {})",
            self.config.cycle_delay,
            self.summarizer.name()
        );

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            if let Err(e) = self.run_cycle(&shutdown).await {
                error!("Cycle failed: {}", e);
            }

            tokio::select! {
                () = shutdown.cancelled() => break,
                () = tokio::time::sleep(self.config.cycle_delay) => {}
            }
        }

        info!("Worker stopped");
    }

    /// Run one polling cycle over all active subscribers.
    ///
    /// A subscriber's failure is logged and never prevents the rest of
    /// the cycle from being served.
    pub async fn run_cycle(&self, shutdown: &CancellationToken) -> Result<(), WorkerError> {
        let subscribers = subscriber::list_active_with_control_room(self.db.pool()).await?;

        if subscribers.is_empty() {
            debug!("No active subscribers");
            return Ok(());
        }

        for sub in subscribers {
            if shutdown.is_cancelled() {
                info!("Shutdown requested, stopping after current subscriber");
                break;
            }

            if let Err(e) = self.process_subscriber(&sub).await {
                error!(subscriber = sub.id, "Failed to process subscriber: {}", e);
            }
        }

        Ok(())
    }

    /// Poll one subscriber's control room and dispatch its last message.
    pub async fn process_subscriber(&self, sub: &Subscriber) -> Result<(), WorkerError> {
        let Some(control_room) = sub.control_room_id.as_deref().filter(|r| !r.is_empty()) else {
            return Ok(());
        };

        let Some(last) = self.gateway.last_message(control_room).await? else {
            return Ok(());
        };

        // The bot's own reply is always the newest message after it
        // answers; reacting to it would loop forever.
        if last.sender == self.config.bot_user_id {
            return Ok(());
        }

        let body = last.body.trim();
        match commands::parse(body) {
            Some(command) => {
                info!(subscriber = sub.id, ?command, "Dispatching command");
                self.dispatch(sub, control_room, command).await
            }
            None => {
                if commands::looks_like_command(body) {
                    self.gateway
                        .send_message(control_room, formatting::unknown_command())
                        .await?;
                }
                Ok(())
            }
        }
    }

    async fn dispatch(
        &self,
        sub: &Subscriber,
        control_room: &str,
        command: Command,
    ) -> Result<(), WorkerError> {
        match command {
            Command::Help => {
                self.gateway
                    .send_message(control_room, formatting::help_text())
                    .await?;
                Ok(())
            }
            Command::Rooms => self.handle_rooms(sub, control_room).await,
            Command::SummaryAll => self.handle_summary_all(sub, control_room).await,
            Command::SummaryRoom(alias) => {
                self.handle_summary_room(sub, control_room, &alias).await
            }
            Command::TodoAll => self.handle_todo_all(sub, control_room).await,
            Command::TodoRoom(alias) => self.handle_todo_room(sub, control_room, &alias).await,
        }
    }

    async fn handle_rooms(&self, sub: &Subscriber, control_room: &str) -> Result<(), WorkerError> {
        let rooms = room::list_active_for_subscriber(self.db.pool(), sub.id).await?;

        let reply = if rooms.is_empty() {
            formatting::no_rooms().to_string()
        } else {
            formatting::rooms_list(&rooms)
        };

        self.gateway.send_message(control_room, &reply).await?;
        Ok(())
    }

    async fn handle_summary_all(
        &self,
        sub: &Subscriber,
        control_room: &str,
    ) -> Result<(), WorkerError> {
        let rooms = room::list_active_for_subscriber(self.db.pool(), sub.id).await?;

        if rooms.is_empty() {
            self.gateway
                .send_message(control_room, formatting::no_rooms())
                .await?;
            return Ok(());
        }

        if self.reply_if_cooling_down(sub, control_room).await? {
            return Ok(());
        }

        self.summarize_rooms(sub, control_room, rooms).await
    }

    async fn handle_summary_room(
        &self,
        sub: &Subscriber,
        control_room: &str,
        alias: &str,
    ) -> Result<(), WorkerError> {
        let Some(target) = room::find_by_alias(self.db.pool(), sub.id, alias).await? else {
            self.gateway
                .send_message(control_room, &formatting::room_not_found(alias))
                .await?;
            return Ok(());
        };

        if self.reply_if_cooling_down(sub, control_room).await? {
            return Ok(());
        }

        self.summarize_rooms(sub, control_room, vec![target]).await
    }

    async fn handle_todo_all(
        &self,
        sub: &Subscriber,
        control_room: &str,
    ) -> Result<(), WorkerError> {
        let tasks =
            task::pending_for_subscriber(self.db.pool(), sub.id, self.config.todo_limit).await?;

        self.gateway
            .send_message(control_room, &formatting::todo_list_all(&tasks))
            .await?;
        Ok(())
    }

    async fn handle_todo_room(
        &self,
        sub: &Subscriber,
        control_room: &str,
        alias: &str,
    ) -> Result<(), WorkerError> {
        let Some(target) = room::find_by_alias(self.db.pool(), sub.id, alias).await? else {
            self.gateway
                .send_message(control_room, &formatting::room_not_found(alias))
                .await?;
            return Ok(());
        };

        let tasks =
            task::pending_for_room(self.db.pool(), target.id, self.config.todo_limit).await?;

        self.gateway
            .send_message(
                control_room,
                &formatting::todo_list_room(target.title(), &tasks),
            )
            .await?;
        Ok(())
    }

    /// Cooldown gate: reads the most recent *delivered* summary across
    /// the subscriber's rooms. Replies with the remaining wait and
    /// returns true when still cooling down.
    async fn reply_if_cooling_down(
        &self,
        sub: &Subscriber,
        control_room: &str,
    ) -> Result<bool, WorkerError> {
        let Some(last) = summary::latest_delivered_for_subscriber(self.db.pool(), sub.id).await?
        else {
            return Ok(false);
        };
        let Some(sent_at) = last.sent_at else {
            return Ok(false);
        };

        let elapsed_minutes = (Utc::now() - sent_at).num_minutes();
        let remaining = self.config.cooldown_minutes - elapsed_minutes;
        if remaining <= 0 {
            return Ok(false);
        }

        self.gateway
            .send_message(control_room, &formatting::cooldown(remaining))
            .await?;
        Ok(true)
    }

    /// Summarize a set of rooms independently; send one fallback notice
    /// when none of them produced a summary.
    async fn summarize_rooms(
        &self,
        sub: &Subscriber,
        control_room: &str,
        rooms: Vec<WatchedRoom>,
    ) -> Result<(), WorkerError> {
        let today = Utc::now().date_naive();
        let mut summaries_sent = 0usize;

        for target in rooms {
            match self.summarize_room(control_room, &target, today).await {
                Ok(true) => summaries_sent += 1,
                Ok(false) => debug!(room = target.id, "nothing to summarize"),
                Err(e) => {
                    error!(
                        subscriber = sub.id,
                        room = target.id,
                        "Failed to summarize room: {}",
                        e
                    );
                }
            }
        }

        if summaries_sent == 0 {
            self.gateway
                .send_message(control_room, formatting::nothing_to_summarize())
                .await?;
        }

        Ok(())
    }

    /// Run the full pipeline for one room: fetch, build context, stage,
    /// complete, reconcile, record, deliver. Returns true when a
    /// summary was delivered.
    async fn summarize_room(
        &self,
        control_room: &str,
        target: &WatchedRoom,
        today: NaiveDate,
    ) -> Result<bool, WorkerError> {
        let pool = self.db.pool();
        let state = processing_state::get_or_create(pool, target.id).await?;

        let messages = self
            .gateway
            .fetch_messages(
                &target.room_id,
                state.last_message_synced_at,
                self.config.fetch_limit,
            )
            .await?;

        if messages.is_empty() {
            return Ok(false);
        }

        let previous = summary::latest_for_room(pool, target.id)
            .await?
            .map(|s| PreviousRun {
                summary: s.summary,
                tasks: s.new_task_descriptions.0,
            });

        let pending = task::pending_for_room(pool, target.id, self.config.todo_limit).await?;
        let pending_context: Vec<PendingTask> = pending
            .iter()
            .map(|t| PendingTask {
                id: t.id,
                description: t.description.clone(),
                notes: t.notes.clone(),
            })
            .collect();

        let context_messages: Vec<ContextMessage> = messages
            .iter()
            .map(|m| ContextMessage {
                sender: m.sender.clone(),
                content: m.body.clone(),
            })
            .collect();

        let descriptor = RoomDescriptor {
            alias: target.alias.clone(),
            name: target.display_name.clone(),
        };
        let resolver = GatewayResolver::new(&self.gateway);

        let Some(document) = build_context(
            descriptor,
            &context_messages,
            &self.config.bot_user_id,
            previous,
            pending_context,
            &resolver,
        )
        .await
        else {
            return Ok(false);
        };

        let staged = serde_json::to_string(&document)?;
        processing_state::mark_processing(pool, state.id, &staged, Utc::now()).await?;

        let result = match self.summarizer.complete(&document).await {
            Ok(result) => result,
            Err(e) => {
                processing_state::mark_failed(pool, state.id, &e.to_string()).await?;
                return Err(e.into());
            }
        };

        let changes: Vec<TaskChange> = result
            .task_updates
            .iter()
            .map(|update| TaskChange {
                task_id: update.id,
                status: Some(update.status.clone()),
                note: update.note.clone(),
            })
            .collect();

        let report = match task::reconcile(pool, target.id, &changes, &result.new_todos).await {
            Ok(report) => report,
            Err(e) => {
                processing_state::mark_failed(pool, state.id, &e.to_string()).await?;
                return Err(e.into());
            }
        };

        // collect_messages guarantees chronological order; bounds are
        // the covered time range.
        let first_ts = messages.first().map(|m| m.timestamp);
        let last_ts = messages.last().map(|m| m.timestamp);

        let record = summary::create_summary(
            pool,
            target.id,
            NewSummary {
                summary: result.summary.clone(),
                reply: result.reply.clone(),
                needs_more_information: result.needs_more_information,
                new_task_descriptions: report
                    .created
                    .iter()
                    .map(|t| t.description.clone())
                    .collect(),
                message_count: messages.len() as i64,
                from_timestamp: first_ts,
                to_timestamp: last_ts,
            },
        )
        .await?;

        let daily = daily_count::increment(pool, target.id, today).await?;

        let created_ids: Vec<i64> = report.created.iter().map(|t| t.id).collect();
        let remaining: Vec<_> = task::pending_for_room(pool, target.id, self.config.todo_limit)
            .await?
            .into_iter()
            .filter(|t| !created_ids.contains(&t.id))
            .collect();

        let reply_text = formatting::summary_message(
            target,
            &result,
            &report.created,
            &remaining,
            messages.len(),
            daily,
        );

        match self.gateway.send_message(control_room, &reply_text).await {
            Ok(event_id) => {
                let now = Utc::now();
                summary::mark_sent(pool, record.id, now).await?;
                if let Some(synced) = last_ts {
                    processing_state::complete(pool, state.id, synced, now).await?;
                    room::advance_last_read(pool, target.id, synced).await?;
                }
                info!(room = target.id, event_id = %event_id, "Sent summary");
                Ok(true)
            }
            Err(e) => {
                warn!(room = target.id, "Summary delivery failed: {}", e);
                summary::mark_send_failed(pool, record.id, Utc::now(), &e.to_string()).await?;
                processing_state::mark_failed(pool, state.id, &format!("send failed: {}", e))
                    .await?;
                Err(e.into())
            }
        }
    }
}
