//! Console driver for the cue engine.
//!
//! Each stdin line is a user message. `/reply <text>` feeds a companion
//! reply without audio, `/tip <amount>` sends a tip, `/fail <reason>`
//! reports a failed reply, `/clear` resets the session and `/metrics`
//! prints the counters. Cue and emotion changes are printed as they happen.

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use waifuverse_engine_lib::config::load_json_config;
use waifuverse_engine_lib::{ChatEvent, CompanionMetrics, CompanionSession, CueConfig};

const CONFIG_ENV: &str = "WAIFUVERSE_CUE_CONFIG";

fn config_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("cues.json"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = config_path();
    let config: CueConfig = load_json_config(&path, "Cues");
    config
        .validate()
        .with_context(|| format!("invalid cue config at {}", path.display()))?;

    let metrics = Arc::new(CompanionMetrics::new());
    let session = CompanionSession::from_config(&config).with_metrics(Arc::clone(&metrics));

    let mut cues = session.sequencer().subscribe();
    let mut speaking = session.lip_sync().subscribe();
    let mut emotion = session.subscribe_emotion();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = cues.changed() => {
                    if changed.is_err() { break; }
                    println!("[cue] {}", *cues.borrow_and_update());
                }
                changed = speaking.changed() => {
                    if changed.is_err() { break; }
                    println!("[speaking] {}", *speaking.borrow_and_update());
                }
                changed = emotion.changed() => {
                    if changed.is_err() { break; }
                    println!("[emotion] {}", *emotion.borrow_and_update());
                }
            }
        }
    });

    let (tx, rx) = mpsc::channel(32);
    let runner = tokio::spawn(session.run(rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let event = match line.trim() {
            "/clear" => ChatEvent::Clear,
            "/metrics" => {
                println!("{}", serde_json::to_string_pretty(&metrics.snapshot())?);
                continue;
            }
            trimmed => {
                if let Some(reply) = trimmed.strip_prefix("/reply ") {
                    ChatEvent::Companion {
                        text: reply.to_string(),
                        has_audio: false,
                    }
                } else if let Some(amount) = trimmed.strip_prefix("/tip ") {
                    match amount.trim().parse::<f64>() {
                        Ok(value) if value.is_finite() && value >= 0.0 => {
                            ChatEvent::Tip { amount: value }
                        }
                        _ => {
                            tracing::warn!("[Console] Bad tip amount {:?}", amount);
                            continue;
                        }
                    }
                } else if let Some(reason) = trimmed.strip_prefix("/fail ") {
                    ChatEvent::ReplyFailed(reason.to_string())
                } else {
                    ChatEvent::User(trimmed.to_string())
                }
            }
        };
        if tx.send(event).await.is_err() {
            break;
        }
    }

    drop(tx);
    runner.await.context("session task panicked")?;
    Ok(())
}
