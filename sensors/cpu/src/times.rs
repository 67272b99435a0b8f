//! CPU time accounting read from `/proc/stat`.
//!
//! The first line of the table is the system-wide aggregate (`cpu`), followed
//! by one contiguous line per logical processor (`cpu0`, `cpu1`, ...). Older
//! kernels omit the trailing steal/guest/guest_nice counters, so those are
//! optional in [`CpuTimes`].

use procsensor_core::lines::{FsLineSource, LineSource};
use procsensor_core::{format, Result, SensorError, PROC_STAT_PATH};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Clock ticks per second used to scale the first seven counters.
pub const CPU_TICK: f64 = 100.0;

/// Label given to the aggregate row.
pub const AGGREGATE_LABEL: &str = "all";

/// Counters every kernel reports: user through softirq.
const REQUIRED_COUNTERS: usize = 7;

/// One row of accounted processor time.
///
/// `user` through `softirq` are divided by [`CPU_TICK`]. `steal`, `guest` and
/// `guest_nice` are kept as reported and are `None` when the kernel did not
/// emit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuTimes {
    /// `all` for the aggregate row, otherwise the kernel label (`cpu3`)
    pub cpu: String,
    /// Time spent in user mode
    pub user: f64,
    /// Time spent in user mode with low priority
    pub nice: f64,
    /// Time spent in kernel mode
    pub system: f64,
    /// Time spent idle
    pub idle: f64,
    /// Time waiting for I/O to complete
    pub iowait: f64,
    /// Time servicing hardware interrupts
    pub irq: f64,
    /// Time servicing software interrupts
    pub softirq: f64,
    /// Time stolen by the hypervisor (Linux >= 2.6.11)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steal: Option<f64>,
    /// Time running a guest (Linux >= 2.6.24)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest: Option<f64>,
    /// Time running a niced guest (Linux >= 3.2.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_nice: Option<f64>,
}

impl CpuTimes {
    /// Whether this is the system-wide row.
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        self.cpu == AGGREGATE_LABEL
    }
}

impl fmt::Display for CpuTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut pairs = vec![
            ("cpu", self.cpu.clone()),
            ("user", format::fixed2(self.user)),
            ("nice", format::fixed2(self.nice)),
            ("sys", format::fixed2(self.system)),
            ("idle", format::fixed2(self.idle)),
            ("iowait", format::fixed2(self.iowait)),
            ("irq", format::fixed2(self.irq)),
            ("softirq", format::fixed2(self.softirq)),
        ];
        let optional = [
            ("steal", self.steal),
            ("guest", self.guest),
            ("guest_nice", self.guest_nice),
        ];
        pairs.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key, format::fixed2(v)))),
        );

        f.write_str(&format::quoted_object(&pairs))
    }
}

/// Parse a single `/proc/stat` CPU line.
///
/// # Errors
///
/// Returns [`SensorError::MalformedLine`] if the line is not a CPU row, has
/// fewer than seven counters, or any present counter is not a non-negative
/// number.
pub fn parse_stat_line(line: &str) -> Result<CpuTimes> {
    let fields: Vec<&str> = line.split_whitespace().collect();

    let label = match fields.first() {
        Some(label) if label.starts_with("cpu") => *label,
        _ => return Err(SensorError::malformed_line("line does not start with 'cpu'", line)),
    };

    if fields.len() <= REQUIRED_COUNTERS {
        return Err(SensorError::malformed_line(
            format!(
                "expected at least {} counters, got {}",
                REQUIRED_COUNTERS,
                fields.len() - 1
            ),
            line,
        ));
    }

    let counter = |idx: usize| -> Result<f64> {
        let raw = fields[idx];
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
            Ok(_) => Err(SensorError::malformed_line(
                format!("counter {} is not a non-negative number: {:?}", idx, raw),
                line,
            )),
            Err(e) => Err(SensorError::malformed_line(
                format!("counter {} ({:?}): {}", idx, raw, e),
                line,
            )),
        }
    };
    let trailing = |idx: usize| -> Result<Option<f64>> {
        if idx < fields.len() {
            counter(idx).map(Some)
        } else {
            Ok(None)
        }
    };

    Ok(CpuTimes {
        cpu: if label == "cpu" {
            AGGREGATE_LABEL.to_owned()
        } else {
            label.to_owned()
        },
        user: counter(1)? / CPU_TICK,
        nice: counter(2)? / CPU_TICK,
        system: counter(3)? / CPU_TICK,
        idle: counter(4)? / CPU_TICK,
        iowait: counter(5)? / CPU_TICK,
        irq: counter(6)? / CPU_TICK,
        softirq: counter(7)? / CPU_TICK,
        steal: trailing(8)?,
        guest: trailing(9)?,
        guest_nice: trailing(10)?,
    })
}

/// Reads [`CpuTimes`] rows from a time-accounting table.
///
/// # Examples
///
/// ```rust,no_run
/// use procsensor_cpu::CpuTimesParser;
///
/// let rows = CpuTimesParser::new().parse(true)?;
/// println!("{}", rows[0]);
/// # Ok::<(), procsensor_core::SensorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct CpuTimesParser<S = FsLineSource> {
    source: S,
    path: PathBuf,
}

impl CpuTimesParser<FsLineSource> {
    /// Parser over the real `/proc/stat`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(FsLineSource, PROC_STAT_PATH)
    }
}

impl Default for CpuTimesParser<FsLineSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LineSource> CpuTimesParser<S> {
    /// Parser reading `path` through `source`.
    pub fn with_source(source: S, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }

    /// Path of the table this parser reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the table.
    ///
    /// With `aggregate_only` only the first line is read. Otherwise every
    /// line up to the first one not starting with `cpu` is parsed. Lines that
    /// fail to parse are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::SourceUnavailable`] if the file cannot be read.
    pub fn parse(&self, aggregate_only: bool) -> Result<Vec<CpuTimes>> {
        let lines = if aggregate_only {
            self.source.read_window(&self.path, 0, Some(1))?
        } else {
            let mut lines = self.source.read_all(&self.path)?;
            let rows = lines.iter().take_while(|l| l.starts_with("cpu")).count();
            lines.truncate(rows);
            lines
        };

        let mut res = Vec::with_capacity(lines.len());
        for line in &lines {
            match parse_stat_line(line) {
                Ok(times) => res.push(times),
                Err(e) => tracing::debug!(
                    category = e.category(),
                    error = %e,
                    "dropping time-accounting line"
                ),
            }
        }

        tracing::debug!(
            path = %self.path.display(),
            aggregate_only,
            lines = lines.len(),
            rows = res.len(),
            "parsed cpu times"
        );
        Ok(res)
    }
}

/// Read CPU times from `/proc/stat`: one row per logical processor when
/// `per_cpu` is set, otherwise just the aggregate row.
///
/// # Errors
///
/// Returns [`SensorError::SourceUnavailable`] if `/proc/stat` cannot be read.
pub fn cpu_times(per_cpu: bool) -> Result<Vec<CpuTimes>> {
    CpuTimesParser::new().parse(!per_cpu)
}
