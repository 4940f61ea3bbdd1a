use std::process::Command;

use crate::error::HarnessError;

/// Resolve the node identity recorded in the report metadata.
///
/// When `NODE_IS_NUMA_NODE=True` the host is a NUMA-partitioned node and the
/// NUMA node id from `numactl --show` is used; otherwise the short hostname.
pub fn resolve_node_id() -> Result<String, HarnessError> {
    let is_numa_node =
        std::env::var("NODE_IS_NUMA_NODE").unwrap_or_else(|_| "False".to_string()) == "True";

    if is_numa_node {
        let output = Command::new("numactl").arg("--show").output()?;
        Ok(numa_node_id(&String::from_utf8_lossy(&output.stdout)))
    } else {
        let output = Command::new("hostname").arg("-s").output()?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Pull the node id out of `numactl --show` output (second line, the value
/// after the colon).
fn numa_node_id(text: &str) -> String {
    text.lines()
        .nth(1)
        .and_then(|line| line.split(':').nth(1))
        .map(str::trim)
        .unwrap_or("unknown")
        .to_string()
}

/// Read a metadata environment variable, defaulting to "unknown".
pub fn env_or_unknown(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| "unknown".to_string())
}
