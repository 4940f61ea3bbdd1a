use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

mod error;
mod invoke;
mod parse;
mod report;
mod table;
mod util;
mod wrapper;

use error::HarnessError;
use invoke::Collective;
use table::RunContext;

/// Run one nccl-tests collective benchmark and build a normalized report
/// (console table, CSV, bandwidth charts).
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Type of collective operation
    #[arg(long, value_enum, default_value = "sendrecv")]
    op: Collective,

    /// Number of iterations in inner loop
    #[arg(long, default_value_t = 20)]
    inner_loop: u32,

    /// GPU device ids to use
    #[arg(long, num_args = 1.., default_values_t = [0u32])]
    device_ids: Vec<u32>,

    /// nccl_tests directory (benchmark binaries under build/)
    #[arg(long, default_value = ".")]
    nccl_tests_dir: PathBuf,

    /// Disable P2P access between GPUs
    #[arg(long)]
    disable_p2p: bool,

    /// Output directory path
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,
}

fn run(args: &Args) -> Result<(), HarnessError> {
    if !args.output_dir.exists() {
        std::fs::create_dir_all(&args.output_dir)?;
    }

    let invocation = invoke::build_invocation(
        args.op,
        &args.device_ids,
        args.inner_loop,
        args.disable_p2p,
        &args.nccl_tests_dir,
    )?;

    info!(
        "Running {} Benchmark on {:?}...",
        args.op.as_str().to_uppercase(),
        args.device_ids
    );
    let stdout = wrapper::run_benchmark(&invocation)?;

    let raw = parse::scan_output(&stdout, args.op);
    let rows = parse::type_rows(&raw)?;
    let summary = table::summarize(&rows)?;

    let ctx = RunContext {
        timestamp: chrono::Local::now().date_naive().to_string(),
        node_id: util::resolve_node_id()?,
        iommu: util::env_or_unknown("HAS_IOMMU"),
        card_num: util::env_or_unknown("CARD_NUM"),
        op: args.op.to_string(),
        device_ids: format!("{:?}", args.device_ids),
        p2p: if args.disable_p2p { "shm" } else { "p2p" }.to_string(),
    };

    report::print_table(&rows, &ctx);
    report::print_summary(&summary);

    let mut df = table::to_report(&rows, &ctx)?;
    report::write_csv(&mut df, &args.output_dir.join(format!("{}.csv", ctx.op)))?;
    report::render_charts(&rows, &ctx, &args.output_dir)?;

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
