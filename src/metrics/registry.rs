//! Metric registry with create-or-lookup by (name, labels)
//!
//! Every metric name maps to one family of a single kind (counter, timer or
//! gauge) with one fixed set of label names. The first observation of a name
//! declares the family and registers it with the underlying Prometheus
//! registry; later calls resolve to the same series for equal label sets.
//!
//! # Concurrency
//!
//! - Family lookup takes a read lock; only family creation takes the write lock
//! - Counters and histograms are lock-free atomics inside `prometheus`
//! - Gauges are not stored here: they read a caller-owned [`GaugeSource`] at
//!   scrape time

use super::exposition;
use super::labels::Labels;
use super::{MetricsError, MetricsResult};
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Kind of a metric family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Timer,
    Gauge,
}

impl MetricKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Timer => "timer",
            MetricKind::Gauge => "gauge",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of an amount passed to [`Timer::record`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
}

impl TimeUnit {
    /// Convert an amount in this unit to seconds (the histogram base unit)
    pub fn to_seconds(&self, amount: f64) -> f64 {
        match self {
            TimeUnit::Nanoseconds => amount / 1_000_000_000.0,
            TimeUnit::Microseconds => amount / 1_000_000.0,
            TimeUnit::Milliseconds => amount / 1_000.0,
            TimeUnit::Seconds => amount,
        }
    }
}

/// Live value backing a gauge
///
/// The registry never caches the value: every scrape calls [`GaugeSource::read`].
pub trait GaugeSource: Send + Sync {
    fn read(&self) -> i64;
}

impl GaugeSource for AtomicI64 {
    fn read(&self) -> i64 {
        self.load(Ordering::Relaxed)
    }
}

impl GaugeSource for AtomicUsize {
    fn read(&self) -> i64 {
        i64::try_from(self.load(Ordering::Relaxed)).unwrap_or(i64::MAX)
    }
}

/// Collector that refreshes an `IntGauge` from its source on every gather
struct SourcedGauge {
    gauge: IntGauge,
    source: Arc<dyn GaugeSource>,
}

impl Collector for SourcedGauge {
    fn desc(&self) -> Vec<&Desc> {
        self.gauge.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.gauge.set(self.source.read());
        self.gauge.collect()
    }
}

/// Handle to one counter series
#[derive(Clone)]
pub struct Counter(IntCounter);

impl Counter {
    /// Add one
    pub fn increment(&self) {
        self.0.inc();
    }

    /// Add `n`
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::InvalidArgument`] if `n` is negative. Counters
    /// are monotonic.
    pub fn increment_by(&self, n: i64) -> MetricsResult<()> {
        let n = u64::try_from(n).map_err(|_| {
            MetricsError::InvalidArgument(format!(
                "counter increment must be non-negative, got: {}",
                n
            ))
        })?;
        self.0.inc_by(n);
        Ok(())
    }

    pub fn value(&self) -> u64 {
        self.0.get()
    }
}

/// Handle to one timer series, backed by a histogram in seconds
#[derive(Clone)]
pub struct Timer(Histogram);

impl Timer {
    /// Record an observation of `amount` in `unit`
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::InvalidArgument`] if `amount` is NaN, infinite
    /// or negative. NaN and infinity corrupt the histogram sum.
    pub fn record(&self, amount: f64, unit: TimeUnit) -> MetricsResult<()> {
        if !amount.is_finite() {
            return Err(MetricsError::InvalidArgument(format!(
                "timer value must be finite (not NaN or Infinity), got: {}",
                amount
            )));
        }

        if amount < 0.0 {
            return Err(MetricsError::InvalidArgument(format!(
                "timer value must be non-negative (duration cannot be negative), got: {}",
                amount
            )));
        }

        self.0.observe(unit.to_seconds(amount));
        Ok(())
    }

    /// Record an elapsed [`Duration`]; durations are never negative
    pub fn record_duration(&self, elapsed: Duration) {
        self.0.observe(elapsed.as_secs_f64());
    }

    /// Number of observations recorded
    pub fn count(&self) -> u64 {
        self.0.get_sample_count()
    }

    /// Sum of all observations, in seconds
    pub fn sum_seconds(&self) -> f64 {
        self.0.get_sample_sum()
    }
}

enum Family {
    Counter {
        vec: IntCounterVec,
        label_names: Vec<String>,
    },
    Timer {
        vec: HistogramVec,
        label_names: Vec<String>,
    },
    Gauge {
        label_names: Vec<String>,
        bound: HashSet<Labels>,
    },
}

impl Family {
    fn kind(&self) -> MetricKind {
        match self {
            Family::Counter { .. } => MetricKind::Counter,
            Family::Timer { .. } => MetricKind::Timer,
            Family::Gauge { .. } => MetricKind::Gauge,
        }
    }

    fn counter(&self, name: &str, labels: &Labels) -> MetricsResult<Counter> {
        match self {
            Family::Counter { vec, label_names } => {
                check_labels(name, label_names, labels)?;
                Ok(Counter(vec.get_metric_with_label_values(labels.values().as_slice())?))
            }
            other => Err(kind_mismatch(name, other.kind(), MetricKind::Counter)),
        }
    }

    fn timer(&self, name: &str, labels: &Labels) -> MetricsResult<Timer> {
        match self {
            Family::Timer { vec, label_names } => {
                check_labels(name, label_names, labels)?;
                Ok(Timer(vec.get_metric_with_label_values(labels.values().as_slice())?))
            }
            other => Err(kind_mismatch(name, other.kind(), MetricKind::Timer)),
        }
    }
}

fn kind_mismatch(name: &str, existing: MetricKind, requested: MetricKind) -> MetricsError {
    MetricsError::KindMismatch {
        name: name.to_string(),
        existing,
        requested,
    }
}

fn check_labels(name: &str, expected: &[String], labels: &Labels) -> MetricsResult<()> {
    let actual = labels.names();
    let matches = actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(actual, expected)| *actual == expected.as_str());

    if matches {
        Ok(())
    } else {
        Err(MetricsError::LabelMismatch {
            name: name.to_string(),
            expected: expected.to_vec(),
            actual: owned_names(labels),
        })
    }
}

fn owned_names(labels: &Labels) -> Vec<String> {
    labels.names().into_iter().map(String::from).collect()
}

/// Process-wide metric registry
///
/// Construct once at startup and share it behind an `Arc`.
pub struct MetricRegistry {
    registry: Registry,
    families: RwLock<HashMap<String, Family>>,
    help: RwLock<HashMap<String, String>>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            families: RwLock::new(HashMap::new()),
            help: RwLock::new(HashMap::new()),
        }
    }

    /// Set the `# HELP` text for a metric name
    ///
    /// Only affects families created after this call. Names without a
    /// description use the metric name as help text.
    pub fn describe(&self, name: &str, help: &str) {
        self.help
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), help.to_string());
    }

    /// Get or create the counter series for `(name, labels)`
    ///
    /// # Errors
    ///
    /// - [`MetricsError::KindMismatch`] if `name` is a timer or gauge
    /// - [`MetricsError::LabelMismatch`] if the label names differ from the family
    /// - [`MetricsError::Prometheus`] for invalid metric or label names
    pub fn counter(&self, name: &str, labels: &Labels) -> MetricsResult<Counter> {
        if let Some(family) = self.read_families().get(name) {
            return family.counter(name, labels);
        }

        let mut families = self.write_families();
        let family = match families.entry(name.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let vec = IntCounterVec::new(Opts::new(name, self.help_for(name)), &labels.names())?;
                self.registry.register(Box::new(vec.clone()))?;
                tracing::debug!(metric = name, labels = ?labels.names(), "Registered counter family");
                entry.insert(Family::Counter {
                    vec,
                    label_names: owned_names(labels),
                })
            }
        };
        family.counter(name, labels)
    }

    /// Get or create the timer series for `(name, labels)`
    ///
    /// Timers are histograms in seconds with the default Prometheus buckets.
    ///
    /// # Errors
    ///
    /// Same as [`MetricRegistry::counter`].
    pub fn timer(&self, name: &str, labels: &Labels) -> MetricsResult<Timer> {
        if let Some(family) = self.read_families().get(name) {
            return family.timer(name, labels);
        }

        let mut families = self.write_families();
        let family = match families.entry(name.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let vec = HistogramVec::new(
                    HistogramOpts::new(name, self.help_for(name)),
                    &labels.names(),
                )?;
                self.registry.register(Box::new(vec.clone()))?;
                tracing::debug!(metric = name, labels = ?labels.names(), "Registered timer family");
                entry.insert(Family::Timer {
                    vec,
                    label_names: owned_names(labels),
                })
            }
        };
        family.timer(name, labels)
    }

    /// Bind the gauge `(name, labels)` to a live source
    ///
    /// The reported value is read from `source` at every scrape, so state the
    /// caller already maintains (like an in-flight request count) is exposed
    /// without a second copy. Binding an identity that is already bound keeps
    /// the first source.
    ///
    /// # Errors
    ///
    /// Same as [`MetricRegistry::counter`].
    pub fn gauge<S>(&self, name: &str, labels: &Labels, source: Arc<S>) -> MetricsResult<()>
    where
        S: GaugeSource + 'static,
    {
        let mut families = self.write_families();

        if let Some(family) = families.get_mut(name) {
            let kind = family.kind();
            let Family::Gauge { label_names, bound } = family else {
                return Err(kind_mismatch(name, kind, MetricKind::Gauge));
            };
            check_labels(name, label_names, labels)?;
            if bound.contains(labels) {
                tracing::debug!(
                    metric = name,
                    labels = %labels,
                    "Gauge already bound, keeping the existing source"
                );
                return Ok(());
            }
            self.register_gauge(name, labels, source)?;
            bound.insert(labels.clone());
            return Ok(());
        }

        self.register_gauge(name, labels, source)?;
        let mut bound = HashSet::new();
        bound.insert(labels.clone());
        families.insert(
            name.to_string(),
            Family::Gauge {
                label_names: owned_names(labels),
                bound,
            },
        );
        Ok(())
    }

    /// Current value of an existing counter series
    ///
    /// Lookup only: returns `None` if the family or the series has not been
    /// observed yet, and never creates either.
    pub fn counter_value(&self, name: &str, labels: &Labels) -> Option<u64> {
        let families = self.read_families();
        let Family::Counter { vec, label_names } = families.get(name)? else {
            return None;
        };
        check_labels(name, label_names, labels).ok()?;

        vec.collect()
            .iter()
            .flat_map(|mf| mf.get_metric())
            .find(|m| {
                let pairs = &m.label;
                pairs.len() == labels.len()
                    && pairs
                        .iter()
                        .all(|pair| labels.get(pair.name()) == Some(pair.value()))
            })
            .map(|m| m.counter.value.unwrap_or(0.0) as u64)
    }

    /// Encode every registered family in the Prometheus text format
    ///
    /// Reading only: counters and timers are not modified. Gauges are
    /// refreshed from their sources.
    pub fn gather(&self) -> MetricsResult<String> {
        exposition::encode(&self.registry.gather())
    }

    fn register_gauge<S>(&self, name: &str, labels: &Labels, source: Arc<S>) -> MetricsResult<()>
    where
        S: GaugeSource + 'static,
    {
        let gauge = IntGauge::with_opts(
            Opts::new(name, self.help_for(name)).const_labels(labels.to_const_labels()),
        )?;
        self.registry
            .register(Box::new(SourcedGauge { gauge, source }))?;
        tracing::debug!(metric = name, labels = %labels, "Bound gauge to source");
        Ok(())
    }

    fn help_for(&self, name: &str) -> String {
        self.help
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    // The map is only mutated by single inserts, so a poisoned lock still
    // holds a consistent map.
    fn read_families(&self) -> RwLockReadGuard<'_, HashMap<String, Family>> {
        self.families.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_families(&self) -> RwLockWriteGuard<'_, HashMap<String, Family>> {
        self.families.write().unwrap_or_else(PoisonError::into_inner)
    }
}
