//! Running statistics about collection cycles.
//!
//! Fed by the host after every cycle and rendered by the `/health` endpoint.

use std::fmt::Write as FmtWrite;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Instant;

use crate::collector::CycleReport;

/// Running statistics for a single metric.
#[derive(Clone, Copy, Default)]
pub struct RunningStat {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
    last: f64,
}

impl RunningStat {
    pub fn add(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
            self.last = value;
            self.sum = value;
            self.count = 1;
            return;
        }
        self.count += 1;
        self.sum += value;
        self.last = value;
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / (self.count as f64)
        }
    }
}

/// Thread-safe wrapper for running statistics.
#[derive(Default)]
pub struct Stat {
    inner: Mutex<RunningStat>,
}

impl Stat {
    pub fn add_sample(&self, value: f64) {
        if let Ok(mut s) = self.inner.lock() {
            s.add(value);
        }
    }

    /// (last, avg, max, min, count)
    pub fn snapshot(&self) -> (f64, f64, f64, f64, u64) {
        if let Ok(s) = self.inner.lock() {
            (s.last, s.avg(), s.max, s.min, s.count)
        } else {
            (0.0, 0.0, 0.0, 0.0, 0)
        }
    }
}

/// Counters and timings across all cycles since startup.
pub struct CycleStats {
    pub cycles_total: AtomicU64,
    pub cycles_skipped: AtomicU64,
    pub clean_cycles: AtomicU64,
    pub producer_failures: AtomicU64,
    pub dispatch_failures: AtomicU64,
    pub records_dispatched: AtomicU64,
    pub cycle_duration_ms: Stat,
    pub records_per_cycle: Stat,
    pub start_time: Instant,
    pub last_cycle: RwLock<Option<Instant>>,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self {
            cycles_total: AtomicU64::new(0),
            cycles_skipped: AtomicU64::new(0),
            clean_cycles: AtomicU64::new(0),
            producer_failures: AtomicU64::new(0),
            dispatch_failures: AtomicU64::new(0),
            records_dispatched: AtomicU64::new(0),
            cycle_duration_ms: Stat::default(),
            records_per_cycle: Stat::default(),
            start_time: Instant::now(),
            last_cycle: RwLock::new(None),
        }
    }
}

impl CycleStats {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record_cycle(&self, report: &CycleReport) {
        if report.skipped {
            self.cycles_skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.cycles_total.fetch_add(1, Ordering::Relaxed);
        if report.is_clean() {
            self.clean_cycles.fetch_add(1, Ordering::Relaxed);
        }
        self.producer_failures
            .fetch_add(report.producer_failures.len() as u64, Ordering::Relaxed);
        self.dispatch_failures
            .fetch_add(report.dispatch_failures.len() as u64, Ordering::Relaxed);
        self.records_dispatched
            .fetch_add(report.dispatched as u64, Ordering::Relaxed);
        self.cycle_duration_ms
            .add_sample(report.duration.as_secs_f64() * 1000.0);
        self.records_per_cycle.add_sample(report.dispatched as f64);

        if let Ok(mut guard) = self.last_cycle.write() {
            *guard = Some(Instant::now());
        }
    }

    /// Share of cycles without any producer or dispatch failure, in percent.
    pub fn clean_rate(&self) -> f64 {
        let total = self.cycles_total.load(Ordering::Relaxed);
        if total == 0 {
            100.0
        } else {
            self.clean_cycles.load(Ordering::Relaxed) as f64 / total as f64 * 100.0
        }
    }

    /// Whether at least one cycle has completed.
    pub fn has_run(&self) -> bool {
        self.cycles_total.load(Ordering::Relaxed) > 0
    }

    pub fn get_uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Seconds since the last completed cycle, if any.
    pub fn seconds_since_last_cycle(&self) -> Option<f64> {
        self.last_cycle
            .read()
            .ok()
            .and_then(|guard| guard.map(|t| t.elapsed().as_secs_f64()))
    }

    pub fn render_table(&self) -> String {
        let (cd_cur, cd_avg, cd_max, cd_min, _) = self.cycle_duration_ms.snapshot();
        let (rc_cur, rc_avg, rc_max, rc_min, _) = self.records_per_cycle.snapshot();

        let left_col = 26usize;
        let col_w = 12usize;

        let mut out = String::new();

        writeln!(out, "COLLECTION CYCLES").ok();
        writeln!(out, "=================").ok();
        writeln!(out).ok();

        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "",
            "current",
            "average",
            "max",
            "min",
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "cycle_duration (ms)",
            format!("{:.2}", cd_cur),
            format!("{:.2}", cd_avg),
            format!("{:.2}", cd_max),
            format!("{:.2}", cd_min),
            left = left_col,
            col = col_w
        )
        .ok();
        writeln!(
            out,
            "{:left$} | {:^col$} | {:^col$} | {:^col$} | {:^col$}",
            "records_per_cycle",
            format!("{:.0}", rc_cur),
            format!("{:.1}", rc_avg),
            format!("{:.0}", rc_max),
            format!("{:.0}", rc_min),
            left = left_col,
            col = col_w
        )
        .ok();

        writeln!(out).ok();
        let counters = [
            ("cycles_total", self.cycles_total.load(Ordering::Relaxed)),
            ("cycles_skipped", self.cycles_skipped.load(Ordering::Relaxed)),
            ("producer_failures", self.producer_failures.load(Ordering::Relaxed)),
            ("dispatch_failures", self.dispatch_failures.load(Ordering::Relaxed)),
            ("records_dispatched", self.records_dispatched.load(Ordering::Relaxed)),
        ];
        for (name, value) in counters {
            writeln!(out, "{:left$} | {}", name, value, left = left_col).ok();
        }
        writeln!(
            out,
            "{:left$} | {:.1}",
            "clean_cycle_rate (%)",
            self.clean_rate(),
            left = left_col
        )
        .ok();

        let last = match self.seconds_since_last_cycle() {
            Some(secs) => format!("{:.1}s ago", secs),
            None => "N/A".to_string(),
        };
        writeln!(out, "{:left$} | {}", "last_cycle", last, left = left_col).ok();

        out
    }
}
