//! CPU time accounting and topology for procsensor.
//!
//! This crate parses the kernel's `/proc/stat` time-accounting table into
//! [`CpuTimes`] rows and the `/proc/cpuinfo` descriptor listing into a
//! [`CpuTopology`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use procsensor_cpu::{cpu_info, cpu_times};
//!
//! // Aggregate row only
//! let total = cpu_times(false)?;
//! println!("{}", total[0]);
//!
//! let topology = cpu_info()?;
//! println!(
//!     "{} logical processors, {} cores, {} packages",
//!     topology.num_cpu(),
//!     topology.num_core(false),
//!     topology.num_core(true)
//! );
//! # Ok::<(), procsensor_core::SensorError>(())
//! ```

pub mod times;
pub mod topology;

pub use times::{cpu_times, parse_stat_line, CpuTimes, CpuTimesParser, CPU_TICK};
pub use topology::{cpu_info, parse_cpuinfo, CpuTopology, ProcessorInfo, TopologyParser};

use std::num::NonZeroUsize;

/// Number of logical processors available to this process.
///
/// Falls back to 1 when the platform cannot tell.
#[must_use]
pub fn cpu_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
