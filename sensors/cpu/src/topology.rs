//! Processor identity and topology read from `/proc/cpuinfo`.
//!
//! The listing is a series of `key : value` blocks, one per logical
//! processor, separated by blank lines. Each block becomes a
//! [`ProcessorInfo`]; the collected blocks form a [`CpuTopology`].

use procsensor_core::lines::{FsLineSource, LineSource};
use procsensor_core::{Result, SensorError, PROC_CPUINFO_PATH};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Conversion failure raised by a [`FieldSetter`].
pub type FieldError = Box<dyn std::error::Error + Send + Sync>;

/// Converts a trimmed value into its slot on [`ProcessorInfo`].
pub type FieldSetter = fn(&mut ProcessorInfo, &str) -> std::result::Result<(), FieldError>;

/// Static description of one logical processor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessorInfo {
    pub processor: u32,
    pub vendor_id: String,
    pub cpu_family: u32,
    pub model: u32,
    pub model_name: String,
    pub stepping: u32,
    pub cpu_mhz: f64,
    /// Cache size in KB
    pub cache_size: u32,
    pub physical_id: u32,
    pub siblings: u32,
    pub core_id: u32,
    pub cpu_cores: u32,
    pub apicid: u32,
    pub initial_apicid: u32,
    pub fpu: String,
    pub fpu_exception: String,
    pub cpuid_level: u32,
    pub wp: String,
    /// Feature flags in kernel order
    pub flags: Vec<String>,
    pub bogomips: f64,
    pub clflush_size: u32,
    pub cache_alignment: u32,
    pub address_sizes: String,
    pub power_management: String,
}

/// Every recognized label and its converter.
///
/// Labels match exactly (case and inner spacing). Both the kernel's
/// `siblings` and the misspelt `silbings` land in [`ProcessorInfo::siblings`].
pub static FIELDS: &[(&str, FieldSetter)] = &[
    ("processor", |p, v| {
        p.processor = v.parse()?;
        Ok(())
    }),
    ("vendor_id", |p, v| {
        p.vendor_id = v.to_owned();
        Ok(())
    }),
    ("cpu family", |p, v| {
        p.cpu_family = v.parse()?;
        Ok(())
    }),
    ("model", |p, v| {
        p.model = v.parse()?;
        Ok(())
    }),
    ("model name", |p, v| {
        p.model_name = v.to_owned();
        Ok(())
    }),
    ("stepping", |p, v| {
        p.stepping = v.parse()?;
        Ok(())
    }),
    ("cpu MHz", |p, v| {
        p.cpu_mhz = v.parse()?;
        Ok(())
    }),
    ("cache size", |p, v| {
        p.cache_size = v.strip_suffix(" KB").unwrap_or(v).parse()?;
        Ok(())
    }),
    ("physical id", |p, v| {
        p.physical_id = v.parse()?;
        Ok(())
    }),
    ("siblings", |p, v| {
        p.siblings = v.parse()?;
        Ok(())
    }),
    ("silbings", |p, v| {
        p.siblings = v.parse()?;
        Ok(())
    }),
    ("core id", |p, v| {
        p.core_id = v.parse()?;
        Ok(())
    }),
    ("cpu cores", |p, v| {
        p.cpu_cores = v.parse()?;
        Ok(())
    }),
    ("apicid", |p, v| {
        p.apicid = v.parse()?;
        Ok(())
    }),
    ("initial apicid", |p, v| {
        p.initial_apicid = v.parse()?;
        Ok(())
    }),
    ("fpu", |p, v| {
        p.fpu = v.to_owned();
        Ok(())
    }),
    ("fpu_exception", |p, v| {
        p.fpu_exception = v.to_owned();
        Ok(())
    }),
    ("cpuid level", |p, v| {
        p.cpuid_level = v.parse()?;
        Ok(())
    }),
    ("wp", |p, v| {
        p.wp = v.to_owned();
        Ok(())
    }),
    ("flags", |p, v| {
        p.flags = if v.is_empty() {
            Vec::new()
        } else {
            v.split(' ').map(str::to_owned).collect()
        };
        Ok(())
    }),
    ("bogomips", |p, v| {
        p.bogomips = v.parse()?;
        Ok(())
    }),
    ("clflush size", |p, v| {
        p.clflush_size = v.parse()?;
        Ok(())
    }),
    ("cache_alignment", |p, v| {
        p.cache_alignment = v.parse()?;
        Ok(())
    }),
    ("address sizes", |p, v| {
        p.address_sizes = v.to_owned();
        Ok(())
    }),
    ("power management", |p, v| {
        p.power_management = v.to_owned();
        Ok(())
    }),
];

/// Look up the converter for a label.
#[must_use]
pub fn field_setter(key: &str) -> Option<FieldSetter> {
    FIELDS
        .iter()
        .find(|(label, _)| *label == key)
        .map(|(_, setter)| *setter)
}

impl ProcessorInfo {
    /// Apply one `key : value` pair. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::MalformedField`] if a numeric field does not
    /// parse.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match field_setter(key) {
            Some(setter) => {
                setter(self, value).map_err(|e| SensorError::malformed_field(key, value, e))
            }
            None => Ok(()),
        }
    }
}

/// Every logical processor found in the descriptor listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuTopology {
    pub processors: Vec<ProcessorInfo>,
}

impl CpuTopology {
    /// Number of logical processors.
    #[must_use]
    pub fn num_cpu(&self) -> usize {
        self.processors.len()
    }

    /// Number of distinct physical packages when `per_package` is set,
    /// otherwise the number of distinct (package, core) pairs.
    #[must_use]
    pub fn num_core(&self, per_package: bool) -> usize {
        self.processors
            .iter()
            .map(|p| (p.physical_id, (!per_package).then_some(p.core_id)))
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Where the block reader is between lines.
#[derive(Debug, Default)]
enum BlockState {
    /// Outside any processor block.
    #[default]
    Idle,
    /// Collecting fields since the last `processor` line.
    Accumulating(ProcessorInfo),
}

impl BlockState {
    /// End the current block, committing it if it carries a vendor.
    fn flush(&mut self, topology: &mut CpuTopology) {
        if let BlockState::Accumulating(info) = std::mem::take(self) {
            if info.vendor_id.is_empty() {
                tracing::trace!(processor = info.processor, "discarding block without vendor_id");
            } else {
                tracing::trace!(processor = info.processor, "committing processor block");
                topology.processors.push(info);
            }
        }
    }
}

/// Parse descriptor listing lines into a [`CpuTopology`].
///
/// A line without a `:` ends the current block. A `processor` line always
/// starts a new block, dropping any block still pending. Fields seen outside
/// a block are validated and then discarded. The last block is committed at
/// end of input even without a trailing blank line.
///
/// # Errors
///
/// Returns [`SensorError::MalformedField`] on the first numeric field that
/// fails to parse, inside or outside a block; no partial topology is
/// returned.
pub fn parse_cpuinfo<I, L>(lines: I) -> Result<CpuTopology>
where
    I: IntoIterator<Item = L>,
    L: AsRef<str>,
{
    let mut topology = CpuTopology::default();
    let mut state = BlockState::Idle;

    for line in lines {
        let Some((key, value)) = line.as_ref().split_once(':') else {
            state.flush(&mut topology);
            continue;
        };
        let (key, value) = (key.trim(), value.trim());

        if key == "processor" {
            if let BlockState::Accumulating(pending) = &state {
                tracing::trace!(processor = pending.processor, "block replaced before it ended");
            }
            state = BlockState::Accumulating(ProcessorInfo::default());
        }

        match &mut state {
            BlockState::Accumulating(pending) => pending.apply(key, value)?,
            // Fields outside a block are discarded but must still convert.
            BlockState::Idle => ProcessorInfo::default().apply(key, value)?,
        }
    }
    state.flush(&mut topology);

    Ok(topology)
}

/// Reads a [`CpuTopology`] from a descriptor listing.
///
/// # Examples
///
/// ```rust,no_run
/// use procsensor_cpu::TopologyParser;
///
/// let topology = TopologyParser::new().parse()?;
/// println!("{} logical, {} cores", topology.num_cpu(), topology.num_core(false));
/// # Ok::<(), procsensor_core::SensorError>(())
/// ```
#[derive(Debug, Clone)]
pub struct TopologyParser<S = FsLineSource> {
    source: S,
    path: PathBuf,
}

impl TopologyParser<FsLineSource> {
    /// Parser over the real `/proc/cpuinfo`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(FsLineSource, PROC_CPUINFO_PATH)
    }
}

impl Default for TopologyParser<FsLineSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: LineSource> TopologyParser<S> {
    /// Parser reading `path` through `source`.
    pub fn with_source(source: S, path: impl Into<PathBuf>) -> Self {
        Self {
            source,
            path: path.into(),
        }
    }

    /// Path of the listing this parser reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the listing.
    ///
    /// # Errors
    ///
    /// Returns [`SensorError::SourceUnavailable`] if the file cannot be read
    /// and [`SensorError::MalformedField`] if a numeric field is corrupt.
    pub fn parse(&self) -> Result<CpuTopology> {
        let lines = self.source.read_all(&self.path)?;
        let topology = parse_cpuinfo(&lines)?;

        tracing::debug!(
            path = %self.path.display(),
            processors = topology.num_cpu(),
            "parsed cpu topology"
        );
        Ok(topology)
    }
}

/// Read the processor topology from `/proc/cpuinfo`.
///
/// # Errors
///
/// See [`TopologyParser::parse`].
pub fn cpu_info() -> Result<CpuTopology> {
    TopologyParser::new().parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CPUINFO: &str = "\
processor\t: 0
vendor_id\t: GenuineIntel
cpu family\t: 6
model\t\t: 158
model name\t: Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz
stepping\t: 10
microcode\t: 0xf0
cpu MHz\t\t: 3700.000
cache size\t: 12288 KB
physical id\t: 0
siblings\t: 12
core id\t\t: 0
cpu cores\t: 6
apicid\t\t: 0
initial apicid\t: 0
fpu\t\t: yes
fpu_exception\t: yes
cpuid level\t: 22
wp\t\t: yes
flags\t\t: fpu vme de pse tsc msr
bugs\t\t: spectre_v1 spectre_v2
bogomips\t: 7399.70
clflush size\t: 64
cache_alignment\t: 64
address sizes\t: 39 bits physical, 48 bits virtual
power management:

processor\t: 1
vendor_id\t: GenuineIntel
cpu family\t: 6
model\t\t: 158
model name\t: Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz
cpu MHz\t\t: 3699.812
physical id\t: 0
core id\t\t: 1
flags\t\t: fpu vme de pse tsc msr
bogomips\t: 7399.70

";

    fn cpuinfo_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn processor(physical_id: u32, core_id: u32) -> ProcessorInfo {
        ProcessorInfo {
            vendor_id: "GenuineIntel".to_owned(),
            physical_id,
            core_id,
            ..ProcessorInfo::default()
        }
    }

    /// Inverse of [`parse_cpuinfo`] for a single processor.
    fn render_block(p: &ProcessorInfo) -> String {
        let pairs = [
            ("processor", p.processor.to_string()),
            ("vendor_id", p.vendor_id.clone()),
            ("cpu family", p.cpu_family.to_string()),
            ("model", p.model.to_string()),
            ("model name", p.model_name.clone()),
            ("stepping", p.stepping.to_string()),
            ("cpu MHz", format!("{:.3}", p.cpu_mhz)),
            ("cache size", format!("{} KB", p.cache_size)),
            ("physical id", p.physical_id.to_string()),
            ("siblings", p.siblings.to_string()),
            ("core id", p.core_id.to_string()),
            ("cpu cores", p.cpu_cores.to_string()),
            ("apicid", p.apicid.to_string()),
            ("initial apicid", p.initial_apicid.to_string()),
            ("fpu", p.fpu.clone()),
            ("fpu_exception", p.fpu_exception.clone()),
            ("cpuid level", p.cpuid_level.to_string()),
            ("wp", p.wp.clone()),
            ("flags", p.flags.join(" ")),
            ("bogomips", format!("{:.2}", p.bogomips)),
            ("clflush size", p.clflush_size.to_string()),
            ("cache_alignment", p.cache_alignment.to_string()),
            ("address sizes", p.address_sizes.clone()),
            ("power management", p.power_management.clone()),
        ];
        pairs
            .iter()
            .map(|(key, value)| format!("{}\t: {}\n", key, value))
            .collect::<String>()
            + "\n"
    }

    #[test]
    fn test_parse_full_listing() {
        let topology = parse_cpuinfo(CPUINFO.lines()).unwrap();
        assert_eq!(topology.num_cpu(), 2);

        let first = &topology.processors[0];
        assert_eq!(first.processor, 0);
        assert_eq!(first.vendor_id, "GenuineIntel");
        assert_eq!(first.cpu_family, 6);
        assert_eq!(first.model, 158);
        assert_eq!(first.model_name, "Intel(R) Core(TM) i7-8700K CPU @ 3.70GHz");
        assert_eq!(first.stepping, 10);
        assert!((first.cpu_mhz - 3700.0).abs() < 1e-9);
        assert_eq!(first.cache_size, 12288);
        assert_eq!(first.siblings, 12);
        assert_eq!(first.cpu_cores, 6);
        assert_eq!(first.fpu, "yes");
        assert_eq!(first.cpuid_level, 22);
        assert_eq!(first.flags, vec!["fpu", "vme", "de", "pse", "tsc", "msr"]);
        assert!((first.bogomips - 7399.70).abs() < 1e-9);
        assert_eq!(first.clflush_size, 64);
        assert_eq!(first.cache_alignment, 64);
        assert_eq!(first.address_sizes, "39 bits physical, 48 bits virtual");
        assert_eq!(first.power_management, "");

        let second = &topology.processors[1];
        assert_eq!(second.processor, 1);
        assert_eq!(second.core_id, 1);
        assert_eq!(second.cache_size, 0);
    }

    #[test]
    fn test_block_without_vendor_dropped() {
        let lines = [
            "processor : 0",
            "model : 1",
            "core id : 3",
            "",
            "processor : 1",
            "vendor_id : AuthenticAMD",
            "",
        ];
        let topology = parse_cpuinfo(lines).unwrap();
        assert_eq!(topology.num_cpu(), 1);
        assert_eq!(topology.processors[0].processor, 1);
        assert_eq!(topology.processors[0].vendor_id, "AuthenticAMD");
    }

    #[test]
    fn test_last_block_flushed_without_trailing_blank() {
        let lines = ["processor : 0", "vendor_id : GenuineIntel"];
        let topology = parse_cpuinfo(lines).unwrap();
        assert_eq!(topology.num_cpu(), 1);
    }

    #[test]
    fn test_repeated_blank_lines_do_not_duplicate() {
        let lines = ["processor : 0", "vendor_id : GenuineIntel", "", "", "junk", ""];
        let topology = parse_cpuinfo(lines).unwrap();
        assert_eq!(topology.num_cpu(), 1);
    }

    #[test]
    fn test_processor_line_resets_pending_block() {
        let lines = [
            "processor : 0",
            "vendor_id : GenuineIntel",
            "model : 5",
            "processor : 1",
            "physical id : 2",
            "",
        ];
        let topology = parse_cpuinfo(lines).unwrap();
        // The second `processor` line restarted the block, so its vendor is gone.
        assert_eq!(topology.num_cpu(), 0);

        let lines = [
            "processor : 0",
            "vendor_id : GenuineIntel",
            "model : 5",
            "processor : 1",
            "vendor_id : GenuineIntel",
        ];
        let topology = parse_cpuinfo(lines).unwrap();
        assert_eq!(topology.num_cpu(), 1);
        assert_eq!(topology.processors[0].processor, 1);
        assert_eq!(topology.processors[0].model, 0);
    }

    #[test]
    fn test_lines_outside_block_ignored() {
        let lines = [
            "vendor_id : GenuineIntel",
            "model : 7",
            "",
            "processor : 4",
            "vendor_id : GenuineIntel",
        ];
        let topology = parse_cpuinfo(lines).unwrap();
        assert_eq!(topology.num_cpu(), 1);
        assert_eq!(topology.processors[0].processor, 4);
        assert_eq!(topology.processors[0].model, 0);
    }

    #[test]
    fn test_malformed_field_outside_block_aborts() {
        let before_first_block = ["model : abc", "processor : 0", "vendor_id : GenuineIntel"];
        let err = parse_cpuinfo(before_first_block).unwrap_err();
        assert!(matches!(err, SensorError::MalformedField { ref key, .. } if key == "model"));

        let after_boundary = ["processor : 0", "vendor_id : GenuineIntel", "", "model : abc"];
        let err = parse_cpuinfo(after_boundary).unwrap_err();
        assert!(matches!(err, SensorError::MalformedField { ref value, .. } if value == "abc"));

        let float_after_boundary = ["processor : 0", "vendor_id : GenuineIntel", "", "bogomips : n/a"];
        assert!(parse_cpuinfo(float_after_boundary).is_err());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let lines = [
            "processor : 0",
            "vendor_id : GenuineIntel",
            "microcode : 0xde",
            "Model : abc",
            "vmx flags : vnmi preemption_timer",
        ];
        let topology = parse_cpuinfo(lines).unwrap();
        assert_eq!(topology.num_cpu(), 1);
    }

    #[test]
    fn test_malformed_integer_aborts() {
        let lines = [
            "processor : 0",
            "vendor_id : GenuineIntel",
            "",
            "processor : 1",
            "vendor_id : GenuineIntel",
            "model : abc",
        ];
        let err = parse_cpuinfo(lines).unwrap_err();
        match &err {
            SensorError::MalformedField { key, value, .. } => {
                assert_eq!(key, "model");
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_malformed_float_aborts() {
        let lines = ["processor : 0", "vendor_id : x", "cpu MHz : fast"];
        assert!(parse_cpuinfo(lines).is_err());

        let lines = ["processor : zero"];
        assert!(parse_cpuinfo(lines).is_err());
    }

    #[test]
    fn test_cache_size_suffix_stripped() {
        let mut info = ProcessorInfo::default();
        info.apply("cache size", "8192 KB").unwrap();
        assert_eq!(info.cache_size, 8192);

        info.apply("cache size", "512").unwrap();
        assert_eq!(info.cache_size, 512);

        assert!(info.apply("cache size", "8 MB").is_err());
    }

    #[test]
    fn test_flags_split_preserves_order_and_duplicates() {
        let mut info = ProcessorInfo::default();
        info.apply("flags", "fpu vme de pse").unwrap();
        assert_eq!(info.flags, vec!["fpu", "vme", "de", "pse"]);

        info.apply("flags", "sse sse2 sse").unwrap();
        assert_eq!(info.flags, vec!["sse", "sse2", "sse"]);

        info.apply("flags", "").unwrap();
        assert!(info.flags.is_empty());
    }

    #[test]
    fn test_siblings_spellings() {
        let mut info = ProcessorInfo::default();
        info.apply("siblings", "8").unwrap();
        assert_eq!(info.siblings, 8);
        info.apply("silbings", "4").unwrap();
        assert_eq!(info.siblings, 4);
    }

    #[test]
    fn test_value_keeps_text_after_first_colon() {
        let lines = [
            "processor : 0",
            "vendor_id : GenuineIntel",
            "model name : Vendor: Custom",
        ];
        let topology = parse_cpuinfo(lines).unwrap();
        assert_eq!(topology.processors[0].model_name, "Vendor: Custom");
    }

    #[test]
    fn test_recognized_keys_table() {
        let keys: Vec<&str> = FIELDS.iter().map(|(key, _)| *key).collect();
        for key in [
            "processor",
            "vendor_id",
            "cpu family",
            "model",
            "model name",
            "stepping",
            "cpu MHz",
            "cache size",
            "physical id",
            "silbings",
            "core id",
            "cpu cores",
            "apicid",
            "initial apicid",
            "fpu",
            "fpu_exception",
            "cpuid level",
            "wp",
            "flags",
            "bogomips",
            "clflush size",
            "cache_alignment",
            "address sizes",
            "power management",
        ] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(keys.iter().collect::<HashSet<_>>().len(), keys.len());
        assert!(field_setter("cpu mhz").is_none());
        assert!(field_setter("cpu  MHz").is_none());
    }

    #[test]
    fn test_num_core() {
        let topology = CpuTopology {
            processors: vec![processor(0, 0), processor(0, 1), processor(1, 0)],
        };
        assert_eq!(topology.num_cpu(), 3);
        assert_eq!(topology.num_core(true), 2);
        assert_eq!(topology.num_core(false), 3);

        let hyperthreaded = CpuTopology {
            processors: vec![processor(0, 0), processor(0, 0), processor(0, 1), processor(0, 1)],
        };
        assert_eq!(hyperthreaded.num_core(true), 1);
        assert_eq!(hyperthreaded.num_core(false), 2);

        assert_eq!(CpuTopology::default().num_core(false), 0);
    }

    #[test]
    fn test_num_core_keys_do_not_collide() {
        // (1, 12) and (11, 2) would both read "112" if joined naively.
        let topology = CpuTopology {
            processors: vec![processor(1, 12), processor(11, 2)],
        };
        assert_eq!(topology.num_core(false), 2);
    }

    #[test]
    fn test_parser_reads_file() {
        let file = cpuinfo_file(CPUINFO);
        let parser = TopologyParser::with_source(FsLineSource, file.path());
        assert_eq!(parser.path(), file.path());

        let topology = parser.parse().unwrap();
        assert_eq!(topology.num_cpu(), 2);
        assert_eq!(topology.num_core(true), 1);
        assert_eq!(topology.num_core(false), 2);
    }

    #[test]
    fn test_parser_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let parser = TopologyParser::with_source(FsLineSource, dir.path().join("cpuinfo"));
        assert!(matches!(
            parser.parse().unwrap_err(),
            SensorError::SourceUnavailable { .. }
        ));
    }

    #[test]
    fn test_round_trip() {
        let processors = vec![
            ProcessorInfo {
                processor: 0,
                vendor_id: "GenuineIntel".to_owned(),
                cpu_family: 6,
                model: 85,
                model_name: "Intel(R) Xeon(R) Gold 6130 CPU @ 2.10GHz".to_owned(),
                stepping: 4,
                cpu_mhz: 2095.078,
                cache_size: 22528,
                physical_id: 0,
                siblings: 32,
                core_id: 0,
                cpu_cores: 16,
                apicid: 0,
                initial_apicid: 0,
                fpu: "yes".to_owned(),
                fpu_exception: "yes".to_owned(),
                cpuid_level: 22,
                wp: "yes".to_owned(),
                flags: vec!["fpu".to_owned(), "vme".to_owned(), "avx512f".to_owned()],
                bogomips: 4200.0,
                clflush_size: 64,
                cache_alignment: 64,
                address_sizes: "46 bits physical, 48 bits virtual".to_owned(),
                power_management: String::new(),
            },
            ProcessorInfo {
                processor: 1,
                vendor_id: "GenuineIntel".to_owned(),
                physical_id: 1,
                core_id: 7,
                apicid: 46,
                initial_apicid: 46,
                cpu_mhz: 1000.5,
                bogomips: 4190.36,
                flags: vec!["fpu".to_owned(), "fpu".to_owned()],
                ..ProcessorInfo::default()
            },
        ];

        let text: String = processors.iter().map(render_block).collect();
        let file = cpuinfo_file(&text);
        let parsed = TopologyParser::with_source(FsLineSource, file.path())
            .parse()
            .unwrap();

        assert_eq!(parsed.num_cpu(), processors.len());
        for (got, want) in parsed.processors.iter().zip(&processors) {
            assert!((got.cpu_mhz - want.cpu_mhz).abs() < 1e-6);
            assert!((got.bogomips - want.bogomips).abs() < 1e-6);

            let mut got = got.clone();
            got.cpu_mhz = want.cpu_mhz;
            got.bogomips = want.bogomips;
            assert_eq!(&got, want);
        }
    }

    #[test]
    fn test_topology_serializes() {
        let topology = parse_cpuinfo(CPUINFO.lines()).unwrap();
        let json = serde_json::to_value(&topology).unwrap();
        assert_eq!(json["processors"][0]["cache_size"], 12288);
        assert_eq!(json["processors"][1]["flags"][5], "msr");
    }
}
