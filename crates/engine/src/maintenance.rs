use std::io;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use bizpulse_core::DomainError;
use bizpulse_notifications::ScanReport;

/// What one maintenance pass did. Step failures are collected, not raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaintenanceReport {
    pub reconciled_checks: usize,
    /// Income rows written for cashed checks or paid installments that had none.
    pub repaired_ledger_rows: usize,
    /// Customers whose overdue totals changed.
    pub refreshed_customers: usize,
    pub scan: ScanReport,
    pub cleaned_notifications: usize,
    pub failures: Vec<String>,
}

impl MaintenanceReport {
    pub(crate) fn fail(&mut self, step: &'static str, err: &DomainError) {
        warn!(step, error = %err, "maintenance step failed");
        self.failures.push(format!("{step}: {err}"));
    }
}

/// Work executed on every maintenance tick.
pub trait Maintenance: Send + Sync + 'static {
    fn run(&self) -> MaintenanceReport;
}

/// Shortest cadence the runner accepts; smaller intervals are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Background thread running [`Maintenance`] on a fixed cadence, plus on demand.
#[derive(Debug, Clone)]
pub struct MaintenanceRunner {
    pub interval: Duration,
    /// Upper bound on how long the loop sleeps before re-checking its channels.
    pub poll: Duration,
}

impl Default for MaintenanceRunner {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            poll: Duration::from_millis(250),
        }
    }
}

/// Handle for a running [`MaintenanceRunner`].
#[derive(Debug)]
pub struct MaintenanceHandle {
    shutdown: mpsc::Sender<()>,
    trigger: mpsc::SyncSender<()>,
    reports: mpsc::Receiver<MaintenanceReport>,
    join: Option<thread::JoinHandle<()>>,
}

impl MaintenanceHandle {
    /// Request an extra pass. Triggers coalesce while one is already queued.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Next finished pass, waiting at most `timeout`.
    pub fn next_report(&self, timeout: Duration) -> Option<MaintenanceReport> {
        self.reports.recv_timeout(timeout).ok()
    }

    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl MaintenanceRunner {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Spawn the loop. One pass runs immediately on startup.
    pub fn spawn<M>(&self, name: &str, task: Arc<M>) -> io::Result<MaintenanceHandle>
    where
        M: Maintenance,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);
        let (report_tx, report_rx) = mpsc::channel::<MaintenanceReport>();

        let mut cfg = self.clone();
        cfg.interval = cfg.interval.max(MIN_INTERVAL);
        let thread_name = name.to_string();
        let join = thread::Builder::new().name(thread_name.clone()).spawn(move || {
            runner_loop(&thread_name, cfg, shutdown_rx, trigger_rx, report_tx, task)
        })?;

        Ok(MaintenanceHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            reports: report_rx,
            join: Some(join),
        })
    }
}

fn runner_loop<M>(
    name: &str,
    cfg: MaintenanceRunner,
    shutdown_rx: mpsc::Receiver<()>,
    trigger_rx: mpsc::Receiver<()>,
    report_tx: mpsc::Sender<MaintenanceReport>,
    task: Arc<M>,
) where
    M: Maintenance,
{
    info!(runner = name, interval_ms = cfg.interval.as_millis() as u64, "maintenance runner started");

    let mut next_tick = Instant::now() + cfg.interval;
    let mut pending = true;

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let now = Instant::now();
        if now >= next_tick {
            pending = true;
            while next_tick <= now {
                next_tick += cfg.interval;
            }
        }

        while trigger_rx.try_recv().is_ok() {
            pending = true;
        }

        if !pending {
            let sleep_for = next_tick
                .saturating_duration_since(Instant::now())
                .min(cfg.poll);
            thread::sleep(sleep_for);
            continue;
        }
        pending = false;

        let report = task.run();
        if !report.failures.is_empty() {
            warn!(runner = name, failures = report.failures.len(), "maintenance pass had failures");
        }
        // Nobody listening is fine.
        let _ = report_tx.send(report);
    }

    info!(runner = name, "maintenance runner stopped");
}
