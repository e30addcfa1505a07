//! Core discovery.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use cpustake_core::CoreId;
use regex::Regex;
use tracing::{debug, trace};

use crate::error::{HotplugError, HotplugResult};

static CORE_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^cpu([0-9]+)$").expect("core directory pattern is valid")
});

/// Parse `cpu<N>` into its id. Names like `cpufreq` or `cpu` do not match.
pub fn parse_core_name(name: &str) -> Option<CoreId> {
    let caps = CORE_DIR.captures(name)?;
    caps[1].parse::<u32>().ok().map(CoreId)
}

/// Scan `topology_root` for manageable cores.
///
/// Only directories directly under the root whose name is `cpu` followed
/// by digits are kept; nested entries are never inspected.
pub fn discover_cores(topology_root: &Path) -> HotplugResult<BTreeSet<CoreId>> {
    let unreadable = |source: std::io::Error| HotplugError::TopologyUnreadable {
        path: topology_root.to_path_buf(),
        source,
    };

    let mut cores = BTreeSet::new();
    for entry in std::fs::read_dir(topology_root).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        let name = entry.file_name();
        let Some(id) = name.to_str().and_then(parse_core_name) else {
            trace!(entry = ?name, "skipping non-core entry");
            continue;
        };
        // sysfs exposes cpu<N> as directories; follow symlinks like sysfs does.
        if !entry.path().is_dir() {
            trace!(entry = ?name, "skipping non-directory core entry");
            continue;
        }
        cores.insert(id);
    }

    if cores.is_empty() {
        return Err(HotplugError::NoCores(topology_root.to_path_buf()));
    }

    debug!(root = ?topology_root, count = cores.len(), "discovered cores");
    Ok(cores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn core_name_pattern() {
        assert_eq!(parse_core_name("cpu0"), Some(CoreId(0)));
        assert_eq!(parse_core_name("cpu127"), Some(CoreId(127)));
        assert_eq!(parse_core_name("cpu"), None);
        assert_eq!(parse_core_name("cpufreq"), None);
        assert_eq!(parse_core_name("cpuidle"), None);
        assert_eq!(parse_core_name("cpu1a"), None);
        assert_eq!(parse_core_name("xcpu1"), None);
    }

    #[test]
    fn discovers_top_level_core_directories_only() {
        let root = tempfile::tempdir().unwrap();
        for name in ["cpu0", "cpu1", "cpu3", "cpufreq", "cpuidle"] {
            fs::create_dir(root.path().join(name)).unwrap();
        }
        // A file that looks like a core is not a core.
        fs::write(root.path().join("cpu7"), "1").unwrap();
        fs::write(root.path().join("online"), "0-3").unwrap();
        // Nested matches are ignored.
        fs::create_dir_all(root.path().join("cpufreq/cpu9")).unwrap();

        let cores = discover_cores(root.path()).unwrap();
        assert_eq!(
            cores.into_iter().collect::<Vec<_>>(),
            vec![CoreId(0), CoreId(1), CoreId(3)]
        );
    }

    #[test]
    fn unreadable_root_is_an_error() {
        let err = discover_cores(Path::new("/nonexistent/sys/cpu")).unwrap_err();
        assert!(matches!(err, HotplugError::TopologyUnreadable { .. }));
    }

    #[test]
    fn empty_root_has_no_cores() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("cpufreq")).unwrap();

        let err = discover_cores(root.path()).unwrap_err();
        assert!(matches!(err, HotplugError::NoCores(_)));
    }
}
