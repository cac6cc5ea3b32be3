//! Companion metrics: lightweight counters for the chat orchestrator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Response times kept for the moving average.
pub const RESPONSE_WINDOW: usize = 100;

#[derive(Default)]
struct Window {
    samples: VecDeque<f64>,
    sum: f64,
}

impl Window {
    fn push(&mut self, value: f64) {
        self.samples.push_back(value);
        self.sum += value;
        if self.samples.len() > RESPONSE_WINDOW {
            if let Some(old) = self.samples.pop_front() {
                self.sum -= old;
            }
        }
    }

    fn average(&self) -> f64 {
        if self.samples.is_empty() {
            0.0
        } else {
            self.sum / self.samples.len() as f64
        }
    }
}

pub struct CompanionMetrics {
    messages: AtomicU64,
    tips: AtomicU64,
    errors: AtomicU64,
    tip_total: Mutex<f64>,
    response_times: Mutex<Window>,
    active_users: Mutex<HashSet<String>>,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl Default for CompanionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CompanionMetrics {
    pub fn new() -> Self {
        Self {
            messages: AtomicU64::new(0),
            tips: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            tip_total: Mutex::new(0.0),
            response_times: Mutex::new(Window::default()),
            active_users: Mutex::new(HashSet::new()),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn record_message(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(target: "metrics", "[Metrics] message_processed");
    }

    pub fn record_tip(&self, amount: f64) {
        self.tips.fetch_add(1, Ordering::Relaxed);
        *self.tip_total.lock().unwrap_or_else(|p| p.into_inner()) += amount;
        tracing::debug!(target: "metrics", "[Metrics] tip_received: {}", amount);
    }

    pub fn record_response_time(&self, elapsed: Duration) {
        let ms = elapsed.as_secs_f64() * 1000.0;
        self.response_times
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(ms);
        tracing::debug!(target: "metrics", "[Metrics] response_time: {:.1}ms", ms);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn user_connected(&self, id: &str) {
        self.active_users
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(id.to_string());
    }

    pub fn user_disconnected(&self, id: &str) {
        self.active_users
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(id);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.snapshot_at(self.started.elapsed())
    }

    fn snapshot_at(&self, uptime: Duration) -> MetricsSnapshot {
        let total_messages = self.messages.load(Ordering::Relaxed);
        let minutes = uptime.as_secs_f64() / 60.0;
        let messages_per_minute = if minutes > 0.0 {
            total_messages as f64 / minutes
        } else {
            0.0
        };
        let (average_response_ms, response_samples) = {
            let window = self.response_times.lock().unwrap_or_else(|p| p.into_inner());
            (window.average(), window.samples.len())
        };

        MetricsSnapshot {
            total_messages,
            total_tips: self.tips.load(Ordering::Relaxed),
            total_tip_amount: *self.tip_total.lock().unwrap_or_else(|p| p.into_inner()),
            errors: self.errors.load(Ordering::Relaxed),
            active_users: self
                .active_users
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .len(),
            average_response_ms,
            response_samples,
            uptime_ms: uptime.as_millis() as u64,
            started_at: self.started_at.to_rfc3339(),
            messages_per_minute,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_messages: u64,
    pub total_tips: u64,
    pub total_tip_amount: f64,
    pub errors: u64,
    pub active_users: usize,
    pub average_response_ms: f64,
    pub response_samples: usize,
    pub uptime_ms: u64,
    pub started_at: String,
    pub messages_per_minute: f64,
}
