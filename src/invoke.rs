use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::error::HarnessError;

/// Collective operations covered by the nccl-tests suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Collective {
    Sendrecv,
    Gather,
    Scatter,
    Broadcast,
    Reduce,
    AllGather,
    ReduceScatter,
    AllReduce,
    Alltoall,
    Hypercube,
}

impl Collective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collective::Sendrecv => "sendrecv",
            Collective::Gather => "gather",
            Collective::Scatter => "scatter",
            Collective::Broadcast => "broadcast",
            Collective::Reduce => "reduce",
            Collective::AllGather => "all_gather",
            Collective::ReduceScatter => "reduce_scatter",
            Collective::AllReduce => "all_reduce",
            Collective::Alltoall => "alltoall",
            Collective::Hypercube => "hypercube",
        }
    }

    /// Name of the benchmark executable for this collective
    pub fn binary_name(&self) -> &'static str {
        match self {
            Collective::Sendrecv => "sendrecv_perf",
            Collective::Gather => "gather_perf",
            Collective::Scatter => "scatter_perf",
            Collective::Broadcast => "broadcast_perf",
            Collective::Reduce => "reduce_perf",
            Collective::AllGather => "all_gather_perf",
            Collective::ReduceScatter => "reduce_scatter_perf",
            Collective::AllReduce => "all_reduce_perf",
            Collective::Alltoall => "alltoall_perf",
            Collective::Hypercube => "hypercube_perf",
        }
    }
}

impl std::fmt::Display for Collective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to launch one benchmark process: executable path,
/// argument vector, and the environment variables layered on top of the
/// inherited environment.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

/// Build the invocation for one collective benchmark run.
///
/// The argument vector is fixed apart from the thread count (one thread per
/// visible device) and the inner-loop iteration count. Correctness checking
/// is disabled since only timing is reported.
pub fn build_invocation(
    op: Collective,
    device_ids: &[u32],
    inner_loop: u32,
    disable_p2p: bool,
    nccl_tests_dir: &Path,
) -> Result<Invocation, HarnessError> {
    let program = nccl_tests_dir.join("build").join(op.binary_name());
    if !program.exists() {
        return Err(HarnessError::Configuration(program));
    }

    let args = vec![
        "--nthreads".to_string(),
        device_ids.len().to_string(),
        "--ngpus".to_string(),
        "1".to_string(),
        "--minbytes".to_string(),
        "4".to_string(),
        "--maxbytes".to_string(),
        "1G".to_string(),
        "--stepfactor".to_string(),
        "2".to_string(),
        "--blocking".to_string(),
        "1".to_string(),
        "--datatype".to_string(),
        "uint8".to_string(),
        "--average".to_string(),
        "2".to_string(),
        "--check".to_string(),
        "0".to_string(),
        "--iters".to_string(),
        inner_loop.to_string(),
    ];

    let visible = device_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<String>>()
        .join(",");
    let mut env = vec![("CUDA_VISIBLE_DEVICES".to_string(), visible)];
    if disable_p2p {
        env.push(("NCCL_P2P_DISABLE".to_string(), "1".to_string()));
    }

    Ok(Invocation { program, args, env })
}
