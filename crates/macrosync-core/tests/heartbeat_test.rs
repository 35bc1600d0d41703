#![allow(clippy::unwrap_used)]
// Heartbeat ticking under a paused tokio clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use macrosync_core::{
    CoreError, Heartbeat, MacroDefinition, Monitoring, Notification, Notifier, StatusSignal,
};

#[derive(Default)]
struct Recorder {
    notes: Mutex<Vec<String>>,
    pushes: Mutex<Vec<(StatusSignal, Value)>>,
}

#[async_trait]
impl Notifier for Recorder {
    async fn notify(&self, notification: &Notification) -> Result<(), CoreError> {
        self.notes.lock().unwrap().push(notification.message.clone());
        Ok(())
    }
}

#[async_trait]
impl Monitoring for Recorder {
    async fn get_macros(&self, _host_id: &str) -> Result<Vec<MacroDefinition>, CoreError> {
        Ok(vec![])
    }

    async fn set_macros(&self, _host_id: &str, _macros: &[MacroDefinition]) -> Result<(), CoreError> {
        Ok(())
    }

    async fn push_signal(&self, signal: StatusSignal, value: Value) -> Result<(), CoreError> {
        self.pushes.lock().unwrap().push((signal, value));
        Ok(())
    }
}

#[tokio::test]
async fn test_tick_counts_minutes() {
    let rec = Arc::new(Recorder::default());
    let hb = Heartbeat::new(Duration::from_secs(60), rec.clone(), rec.clone());

    assert_eq!(hb.tick().await, 1);
    assert_eq!(hb.tick().await, 2);
    assert_eq!(hb.uptime_minutes(), 2);

    assert_eq!(
        *rec.notes.lock().unwrap(),
        vec!["App is up. Uptime: 1 minutes", "App is up. Uptime: 2 minutes"]
    );
    assert_eq!(
        *rec.pushes.lock().unwrap(),
        vec![(StatusSignal::Uptime, json!(1)), (StatusSignal::Uptime, json!(2))]
    );
}

#[tokio::test]
async fn test_longer_interval_advances_by_its_minutes() {
    let rec = Arc::new(Recorder::default());
    let hb = Heartbeat::new(Duration::from_secs(300), rec.clone(), rec.clone());
    assert_eq!(hb.tick().await, 5);
}

#[tokio::test]
async fn test_sub_minute_interval_accumulates_seconds() {
    let rec = Arc::new(Recorder::default());
    let hb = Heartbeat::new(Duration::from_secs(30), rec.clone(), rec.clone());

    assert_eq!(hb.tick().await, 0);
    assert_eq!(hb.tick().await, 1);
    assert_eq!(hb.tick().await, 1);
    assert_eq!(hb.tick().await, 2);
    assert_eq!(hb.uptime_minutes(), 2);
}

#[tokio::test]
async fn test_uneven_interval_does_not_round_each_tick() {
    let rec = Arc::new(Recorder::default());
    let hb = Heartbeat::new(Duration::from_secs(90), rec.clone(), rec.clone());

    assert_eq!(hb.tick().await, 1);
    assert_eq!(hb.tick().await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_spawned_task_ticks_until_cancelled() {
    let rec = Arc::new(Recorder::default());
    let hb = Arc::new(Heartbeat::new(Duration::from_secs(60), rec.clone(), rec.clone()));
    let cancel = CancellationToken::new();

    let handle = hb.clone().spawn(cancel.clone());

    tokio::time::sleep(Duration::from_secs(185)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert_eq!(hb.uptime_minutes(), 3);
    assert_eq!(rec.pushes.lock().unwrap().len(), 3);
}
