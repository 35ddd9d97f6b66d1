//! Integration tests for the Tokio-backed timer.
//!
//! Uses paused time so `sleep_until` resolves as soon as the runtime is
//! idle, and a oneshot channel to learn that the fire callback ran.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arbiter_timer::{TimerCallbacks, TimerConfig, TimerService, TokioTimer};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::Instant;

// =========================================================================
// Helpers
// =========================================================================

type Events = Arc<Mutex<Vec<String>>>;

fn recording(events: &Events, done: oneshot::Sender<()>) -> TimerCallbacks {
    let alerts = Arc::clone(events);
    let fires = Arc::clone(events);
    TimerCallbacks {
        on_alert: Arc::new(move |remaining| {
            alerts
                .lock()
                .unwrap()
                .push(format!("alert {}", remaining.as_secs()));
        }),
        on_fire: Box::new(move || {
            fires.lock().unwrap().push("fire".to_string());
            let _ = done.send(());
        }),
    }
}

fn flag_on_fire(flag: &Arc<AtomicBool>) -> TimerCallbacks {
    let flag = Arc::clone(flag);
    TimerCallbacks::on_fire(move || flag.store(true, Ordering::SeqCst))
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_alerts_then_fire_in_order() {
    let timer = TokioTimer::new(TimerConfig {
        alert_before_secs: vec![10, 30],
    });
    let events = Events::default();
    let (tx, rx) = oneshot::channel();
    let start = Instant::now();

    let _handle = timer.start(Duration::from_secs(60), recording(&events, tx));
    rx.await.unwrap();

    assert!(start.elapsed() >= Duration::from_secs(60));
    assert_eq!(*events.lock().unwrap(), vec!["alert 30", "alert 10", "fire"]);
}

#[tokio::test(start_paused = true)]
async fn test_marks_not_below_duration_are_skipped() {
    let timer = TokioTimer::new(TimerConfig::default());
    let events = Events::default();
    let (tx, rx) = oneshot::channel();

    let _handle = timer.start(Duration::from_secs(20), recording(&events, tx));
    rx.await.unwrap();

    assert_eq!(*events.lock().unwrap(), vec!["alert 10", "fire"]);
}

#[tokio::test(start_paused = true)]
async fn test_start_from_foreign_thread_uses_captured_runtime() {
    let events = Events::default();
    let (tx, rx) = oneshot::channel();
    let runtime = Handle::current();
    let callbacks = recording(&events, tx);

    let handle = std::thread::spawn(move || {
        TokioTimer::with_handle(runtime, TimerConfig::silent())
            .start(Duration::from_secs(5), callbacks)
    })
    .join()
    .unwrap();
    rx.await.unwrap();

    assert_eq!(*events.lock().unwrap(), vec!["fire"]);
    drop(handle);
}

// =========================================================================
// Cancellation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_cancel_before_deadline_never_fires() {
    let timer = TokioTimer::new(TimerConfig::silent());
    let fired = Arc::new(AtomicBool::new(false));

    let handle = timer.start(Duration::from_secs(10), flag_on_fire(&fired));
    tokio::time::sleep(Duration::from_secs(5)).await;
    handle.cancel();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(!fired.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_cancels() {
    let timer = TokioTimer::new(TimerConfig::silent());
    let fired = Arc::new(AtomicBool::new(false));

    drop(timer.start(Duration::from_secs(10), flag_on_fire(&fired)));
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(!fired.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn test_replacing_timer_only_fires_new_one() {
    let timer = TokioTimer::new(TimerConfig::silent());
    let first = Arc::new(AtomicBool::new(false));
    let events = Events::default();
    let (tx, rx) = oneshot::channel();

    let old = timer.start(Duration::from_secs(10), flag_on_fire(&first));
    tokio::time::sleep(Duration::from_secs(5)).await;
    let _new = timer.start(Duration::from_secs(10), recording(&events, tx));
    drop(old);
    rx.await.unwrap();

    assert!(!first.load(Ordering::SeqCst));
    assert_eq!(*events.lock().unwrap(), vec!["fire"]);
}
