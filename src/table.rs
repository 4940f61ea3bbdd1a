use polars::prelude::*;

use crate::error::HarnessError;

/// One row of the benchmark performance table.
///
/// Note: The "wrong" columns are sometimes N/A, so they can't use u64.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub size: u64,
    pub count: u64,
    pub dtype: String,
    pub redop: String,
    pub root: i64,
    pub ofp_time: f64,
    pub ofp_algbw: f64,
    pub ofp_busbw: f64,
    pub ofp_wrong: String,
    pub ip_time: f64,
    pub ip_algbw: f64,
    pub ip_busbw: f64,
    pub ip_wrong: String,
}

/// Run metadata broadcast identically onto every row of one report.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub timestamp: String,
    pub node_id: String,
    pub iommu: String,
    pub card_num: String,
    pub op: String,
    pub device_ids: String,
    pub p2p: String,
}

/// Peak bandwidths and best latencies across the whole table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub ofp_peak_algbw: f64,
    pub ofp_peak_busbw: f64,
    pub ip_peak_algbw: f64,
    pub ip_peak_busbw: f64,
    pub ofp_best_time: f64,
    pub ip_best_time: f64,
}

/// Reduce the table to its summary scalars.
///
/// Defined only over a non-empty table: an empty reduction would publish a
/// misleading zero throughput, so it is reported as `NoData` instead.
pub fn summarize(rows: &[Row]) -> Result<Summary, HarnessError> {
    if rows.is_empty() {
        return Err(HarnessError::NoData);
    }

    let max = |field: fn(&Row) -> f64| rows.iter().map(field).fold(f64::NEG_INFINITY, f64::max);
    let min = |field: fn(&Row) -> f64| rows.iter().map(field).fold(f64::INFINITY, f64::min);

    Ok(Summary {
        ofp_peak_algbw: max(|r| r.ofp_algbw),
        ofp_peak_busbw: max(|r| r.ofp_busbw),
        ip_peak_algbw: max(|r| r.ip_algbw),
        ip_peak_busbw: max(|r| r.ip_busbw),
        ofp_best_time: min(|r| r.ofp_time),
        ip_best_time: min(|r| r.ip_time),
    })
}

/// Widen the rows with the run context and lay the columns out in the
/// canonical report order.
///
/// Note: The implementation is very manual and not efficient.
pub fn to_report(rows: &[Row], ctx: &RunContext) -> PolarsResult<DataFrame> {
    let n = rows.len();
    DataFrame::new(vec![
        Series::new("timestamp", vec![ctx.timestamp.clone(); n]),
        Series::new("node_id", vec![ctx.node_id.clone(); n]),
        Series::new("iommu", vec![ctx.iommu.clone(); n]),
        Series::new("card_num", vec![ctx.card_num.clone(); n]),
        Series::new("op", vec![ctx.op.clone(); n]),
        Series::new("device_ids", vec![ctx.device_ids.clone(); n]),
        Series::new("p2p", vec![ctx.p2p.clone(); n]),
        Series::new("size", rows.iter().map(|r| r.size).collect::<Vec<u64>>()),
        Series::new("count", rows.iter().map(|r| r.count).collect::<Vec<u64>>()),
        Series::new("type", rows.iter().map(|r| r.dtype.clone()).collect::<Vec<String>>()),
        Series::new("redop", rows.iter().map(|r| r.redop.clone()).collect::<Vec<String>>()),
        Series::new("root", rows.iter().map(|r| r.root).collect::<Vec<i64>>()),
        Series::new("ofp_time", rows.iter().map(|r| r.ofp_time).collect::<Vec<f64>>()),
        Series::new("ofp_algbw", rows.iter().map(|r| r.ofp_algbw).collect::<Vec<f64>>()),
        Series::new("ofp_busbw", rows.iter().map(|r| r.ofp_busbw).collect::<Vec<f64>>()),
        Series::new("ofp_wrong", rows.iter().map(|r| r.ofp_wrong.clone()).collect::<Vec<String>>()),
        Series::new("ip_time", rows.iter().map(|r| r.ip_time).collect::<Vec<f64>>()),
        Series::new("ip_algbw", rows.iter().map(|r| r.ip_algbw).collect::<Vec<f64>>()),
        Series::new("ip_busbw", rows.iter().map(|r| r.ip_busbw).collect::<Vec<f64>>()),
        Series::new("ip_wrong", rows.iter().map(|r| r.ip_wrong.clone()).collect::<Vec<String>>()),
    ])
}
