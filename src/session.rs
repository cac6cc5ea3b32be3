//! Companion Session: wires classifier, sequencer and lip-sync for one chat.
//!
//! The chat transport delivers one `ChatEvent` per message in arrival
//! order. Every text event is classified and its cue enqueued; companion
//! replies without synthesized audio also drive the lip-sync fallback.
//! Replies and tips also set the coarse avatar emotion, and the time from
//! a user message to its reply feeds the response-time metric.

use crate::cue::{
    tag_reply_emotion, AvatarEmotion, Classifier, Cue, CueConfig, CueSequencer, LipSync,
};
use crate::metrics::CompanionMetrics;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use uuid::Uuid;

/// Tips at or above this amount get the excited reaction.
pub const GENEROUS_TIP: f64 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    /// Text typed by the user.
    User(String),
    /// Text generated for the companion. `has_audio` is true when voice
    /// synthesis produced audio the renderer can lip-sync against.
    Companion { text: String, has_audio: bool },
    /// A tip arrived for the companion.
    Tip { amount: f64 },
    /// Reply generation failed for the pending user message.
    ReplyFailed(String),
    /// The session view was reset.
    Clear,
}

pub struct CompanionSession {
    id: Uuid,
    classifier: Classifier,
    rng: Box<dyn RngCore + Send>,
    sequencer: CueSequencer,
    lip_sync: LipSync,
    emotion: watch::Sender<AvatarEmotion>,
    awaiting_reply: Option<Instant>,
    metrics: Option<Arc<CompanionMetrics>>,
}

impl CompanionSession {
    /// Create a session with an explicit random source for cue selection.
    pub fn new<R>(config: &CueConfig, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        let id = Uuid::new_v4();
        let (emotion, _) = watch::channel(AvatarEmotion::default());
        tracing::info!(target: "session", "[Session] {} started", id);
        Self {
            id,
            classifier: config.classifier(),
            rng: Box::new(rng),
            sequencer: CueSequencer::new(config.duration_table()),
            lip_sync: LipSync::new(config.lip_sync_ms_per_word),
            emotion,
            awaiting_reply: None,
            metrics: None,
        }
    }

    /// Create a session seeded from system entropy.
    pub fn from_config(config: &CueConfig) -> Self {
        Self::new(config, StdRng::from_entropy())
    }

    /// Report into `metrics`. The session counts as an active user until
    /// `run` returns.
    pub fn with_metrics(mut self, metrics: Arc<CompanionMetrics>) -> Self {
        metrics.user_connected(&self.id.to_string());
        self.metrics = Some(metrics);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sequencer(&self) -> &CueSequencer {
        &self.sequencer
    }

    pub fn lip_sync(&self) -> &LipSync {
        &self.lip_sync
    }

    pub fn emotion(&self) -> AvatarEmotion {
        *self.emotion.borrow()
    }

    /// Follow the avatar emotion. Like the cue feed, holds the latest value.
    pub fn subscribe_emotion(&self) -> watch::Receiver<AvatarEmotion> {
        self.emotion.subscribe()
    }

    /// Apply one chat event. Returns the cue enqueued for text events.
    pub fn handle(&mut self, event: ChatEvent) -> Option<Cue> {
        match event {
            ChatEvent::User(text) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_message();
                }
                self.awaiting_reply.get_or_insert_with(Instant::now);
                Some(self.enqueue_for(&text))
            }
            ChatEvent::Companion { text, has_audio } => {
                if let Some(started) = self.awaiting_reply.take() {
                    if let Some(metrics) = &self.metrics {
                        metrics.record_response_time(started.elapsed());
                    }
                }
                self.set_emotion(tag_reply_emotion(&text));
                let cue = self.enqueue_for(&text);
                if !has_audio {
                    self.lip_sync.speak(&text);
                }
                Some(cue)
            }
            ChatEvent::Tip { amount } => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_tip(amount);
                }
                let reaction = if amount >= GENEROUS_TIP {
                    AvatarEmotion::Excited
                } else {
                    AvatarEmotion::Thankful
                };
                tracing::info!(target: "session", "[Session] {} tip of {}", self.id, amount);
                self.set_emotion(reaction);
                None
            }
            ChatEvent::ReplyFailed(reason) => {
                tracing::warn!(target: "session", "[Session] {} reply failed: {}", self.id, reason);
                self.awaiting_reply = None;
                if let Some(metrics) = &self.metrics {
                    metrics.record_error();
                }
                None
            }
            ChatEvent::Clear => {
                self.sequencer.clear();
                self.lip_sync.stop();
                tracing::debug!(target: "session", "[Session] {} cleared", self.id);
                None
            }
        }
    }

    fn enqueue_for(&mut self, text: &str) -> Cue {
        let cue = self.classifier.classify(text, self.rng.as_mut());
        tracing::debug!(target: "session", "[Session] {} classified as {}", self.id, cue);
        self.sequencer.enqueue(cue);
        cue
    }

    fn set_emotion(&self, emotion: AvatarEmotion) {
        tracing::debug!(target: "session", "[Session] {} emotion {}", self.id, emotion);
        self.emotion.send_replace(emotion);
    }

    /// Consume events until the transport closes, then reset.
    pub async fn run(mut self, mut events: mpsc::Receiver<ChatEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        self.sequencer.clear();
        self.lip_sync.stop();
        if let Some(metrics) = &self.metrics {
            metrics.user_disconnected(&self.id.to_string());
        }
        tracing::info!(target: "session", "[Session] {} closed", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session() -> CompanionSession {
        CompanionSession::new(&CueConfig::default(), StdRng::seed_from_u64(11))
    }

    #[tokio::test(start_paused = true)]
    async fn user_text_is_classified_and_played() {
        let mut session = session();
        assert_eq!(session.handle(ChatEvent::User("hello!".into())), Some(Cue::Wave));
        assert_eq!(session.sequencer().current(), Cue::Wave);
        assert!(!session.lip_sync().is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn replies_queue_behind_the_active_cue() {
        let mut session = session();
        session.handle(ChatEvent::User("hey".into()));
        session.handle(ChatEvent::Companion {
            text: "hmm, perhaps".into(),
            has_audio: true,
        });
        assert_eq!(session.sequencer().current(), Cue::Wave);
        assert_eq!(session.sequencer().snapshot().pending, vec![Cue::Thinking]);

        tokio::time::sleep(Duration::from_millis(2001)).await;
        assert_eq!(session.sequencer().current(), Cue::Thinking);
    }

    #[tokio::test(start_paused = true)]
    async fn replies_without_audio_pulse_lip_sync() {
        let mut session = session();
        session.handle(ChatEvent::Companion {
            text: "nice to see you".into(),
            has_audio: false,
        });
        assert!(session.lip_sync().is_speaking());

        tokio::time::sleep(Duration::from_millis(1201)).await;
        assert!(!session.lip_sync().is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_resets_cues_and_speaking() {
        let mut session = session();
        session.handle(ChatEvent::Companion {
            text: "let's dance and party".into(),
            has_audio: false,
        });
        session.handle(ChatEvent::User("haha".into()));
        assert_eq!(session.handle(ChatEvent::Clear), None);

        assert_eq!(session.sequencer().current(), Cue::Idle);
        assert_eq!(session.sequencer().pending_len(), 0);
        assert!(!session.lip_sync().is_speaking());
    }

    #[tokio::test(start_paused = true)]
    async fn user_messages_are_counted() {
        let metrics = Arc::new(CompanionMetrics::new());
        let mut session = session().with_metrics(Arc::clone(&metrics));
        session.handle(ChatEvent::User("one".into()));
        session.handle(ChatEvent::User("two".into()));
        session.handle(ChatEvent::Companion {
            text: "three".into(),
            has_audio: true,
        });
        assert_eq!(metrics.snapshot().total_messages, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn run_processes_events_in_order_until_closed() {
        let session = session();
        let mut cues = session.sequencer().subscribe();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(session.run(rx));

        tx.send(ChatEvent::User("wow".into())).await.unwrap();
        cues.changed().await.unwrap();
        assert_eq!(*cues.borrow_and_update(), Cue::Surprised);

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn replies_set_the_avatar_emotion() {
        let mut session = session();
        let mut emotions = session.subscribe_emotion();
        assert_eq!(session.emotion(), AvatarEmotion::Neutral);

        session.handle(ChatEvent::Companion {
            text: "Wow, that's amazing!".into(),
            has_audio: true,
        });
        assert!(emotions.has_changed().unwrap());
        assert_eq!(*emotions.borrow_and_update(), AvatarEmotion::Excited);

        session.handle(ChatEvent::Companion {
            text: "Really? You did?".into(),
            has_audio: true,
        });
        assert_eq!(session.emotion(), AvatarEmotion::Surprised);

        // User text never changes the emotion.
        session.handle(ChatEvent::User("thank you".into()));
        assert_eq!(session.emotion(), AvatarEmotion::Surprised);
    }

    #[tokio::test(start_paused = true)]
    async fn tips_react_by_amount_and_are_counted() {
        let metrics = Arc::new(CompanionMetrics::new());
        let mut session = session().with_metrics(Arc::clone(&metrics));

        assert_eq!(session.handle(ChatEvent::Tip { amount: 0.005 }), None);
        assert_eq!(session.emotion(), AvatarEmotion::Thankful);
        assert_eq!(session.handle(ChatEvent::Tip { amount: GENEROUS_TIP }), None);
        assert_eq!(session.emotion(), AvatarEmotion::Excited);

        let snap = metrics.snapshot();
        assert_eq!(snap.total_tips, 2);
        assert!((snap.total_tip_amount - 0.015).abs() < 1e-9);
        // Tips do not touch the cue queue.
        assert_eq!(session.sequencer().current(), Cue::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_latency_is_measured_from_the_first_unanswered_message() {
        let metrics = Arc::new(CompanionMetrics::new());
        let mut session = session().with_metrics(Arc::clone(&metrics));

        session.handle(ChatEvent::User("one".into()));
        tokio::time::advance(Duration::from_millis(100)).await;
        session.handle(ChatEvent::User("two".into()));
        tokio::time::advance(Duration::from_millis(150)).await;
        session.handle(ChatEvent::Companion {
            text: "sure".into(),
            has_audio: true,
        });
        // A reply with nothing pending is not a sample.
        session.handle(ChatEvent::Companion {
            text: "also".into(),
            has_audio: true,
        });

        let snap = metrics.snapshot();
        assert_eq!(snap.response_samples, 1);
        assert!((snap.average_response_ms - 250.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_replies_count_as_errors_and_drop_the_pending_timer() {
        let metrics = Arc::new(CompanionMetrics::new());
        let mut session = session().with_metrics(Arc::clone(&metrics));

        session.handle(ChatEvent::User("hello?".into()));
        let failed = ChatEvent::ReplyFailed("upstream timeout".into());
        assert_eq!(session.handle(failed), None);
        session.handle(ChatEvent::Companion {
            text: "late".into(),
            has_audio: true,
        });

        let snap = metrics.snapshot();
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.response_samples, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn session_is_an_active_user_until_run_returns() {
        let metrics = Arc::new(CompanionMetrics::new());
        let session = session().with_metrics(Arc::clone(&metrics));
        assert_eq!(metrics.snapshot().active_users, 1);

        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(session.run(rx));
        drop(tx);
        task.await.unwrap();
        assert_eq!(metrics.snapshot().active_users, 0);
    }
}
