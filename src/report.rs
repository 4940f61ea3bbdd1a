use std::fs::File;
use std::path::Path;

use log::info;
use plotters::prelude::*;
use polars::prelude::*;
use prettytable::{format, row, Table};
use termion::color;

use crate::error::HarnessError;
use crate::table::{Row, RunContext, Summary};

/// Print the console subset view of the report: operation, transport mode,
/// message size, and the six timing/bandwidth metrics.
pub fn print_table(rows: &[Row], ctx: &RunContext) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);
    table.add_row(row![
        "op", "p2p", "size", "ofp_time", "ofp_algbw", "ofp_busbw", "ip_time", "ip_algbw",
        "ip_busbw"
    ]);
    for r in rows {
        table.add_row(row![
            ctx.op,
            ctx.p2p,
            r.size,
            r.ofp_time,
            r.ofp_algbw,
            r.ofp_busbw,
            r.ip_time,
            r.ip_algbw,
            r.ip_busbw
        ]);
    }
    println!();
    table.printstd();
}

/// Print the six summary lines below the table.
pub fn print_summary(summary: &Summary) {
    let lines = [
        ("Out-of-Place Avg. Latency", summary.ofp_best_time, "us"),
        ("In-Place     Avg. Latency", summary.ip_best_time, "us"),
        ("Out-of-Place Avg. Alg Throughput", summary.ofp_peak_algbw, "GB/s"),
        ("In-Place     Avg. Alg Throughput", summary.ip_peak_algbw, "GB/s"),
        ("Out-of-Place Avg. Bus Throughput", summary.ofp_peak_busbw, "GB/s"),
        ("In-Place     Avg. Bus Throughput", summary.ip_peak_busbw, "GB/s"),
    ];
    for (label, value, unit) in lines {
        println!(
            "{}: {}{}{} {}",
            label,
            color::Fg(color::LightGreen),
            value,
            color::Fg(color::Reset),
            unit
        );
    }
}

/// Write the full enriched table to CSV with a header row.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), HarnessError> {
    let file = File::create(path)?;
    CsvWriter::new(file).include_header(true).finish(df)?;
    info!("Wrote report CSV to {}", path.display());
    Ok(())
}

/// Render the two bandwidth-vs-size charts (algorithm and bus bandwidth).
pub fn render_charts(rows: &[Row], ctx: &RunContext, output_dir: &Path) -> Result<(), HarnessError> {
    let title = format!("{} Benchmark", ctx.op.to_uppercase());
    draw_bandwidth_chart(
        &output_dir.join(format!("{}_alg.png", ctx.op)),
        &title,
        rows,
        |r| r.ofp_algbw,
        |r| r.ip_algbw,
    )?;
    draw_bandwidth_chart(
        &output_dir.join(format!("{}_bus.png", ctx.op)),
        &title,
        rows,
        |r| r.ofp_busbw,
        |r| r.ip_busbw,
    )?;
    Ok(())
}

/// Draw one log-x line chart overlaying the out-of-place and in-place series
/// against message size.
fn draw_bandwidth_chart(
    path: &Path,
    title: &str,
    rows: &[Row],
    ofp: fn(&Row) -> f64,
    ip: fn(&Row) -> f64,
) -> Result<(), HarnessError> {
    let root = BitMapBackend::new(path, (800, 500)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let x_min = rows.iter().map(|r| r.size).min().unwrap_or(1).max(1) as f64;
    let x_max = (rows.iter().map(|r| r.size).max().unwrap_or(1) as f64).max(x_min * 2.0);
    let y_max = rows
        .iter()
        .map(|r| ofp(r).max(ip(r)))
        .fold(0.0f64, f64::max)
        .max(f64::MIN_POSITIVE)
        * 1.2;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24).into_font())
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d((x_min..x_max).log_scale(), 0f64..y_max)
        .map_err(chart_err)?;

    chart
        .configure_mesh()
        .x_desc("Message Size (bytes)")
        .y_desc("Throughput (GB/s)")
        .axis_desc_style(("sans-serif", 16))
        .draw()
        .map_err(chart_err)?;

    chart
        .draw_series(LineSeries::new(
            rows.iter().map(|r| (r.size as f64, ofp(r))),
            BLUE.stroke_width(2),
        ))
        .map_err(chart_err)?
        .label("Out-of-Place")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    chart
        .draw_series(LineSeries::new(
            rows.iter().map(|r| (r.size as f64, ip(r))),
            RED.stroke_width(2),
        ))
        .map_err(chart_err)?
        .label("In-Place")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    info!("Chart saved to {}", path.display());
    Ok(())
}

fn chart_err<E: std::fmt::Display>(e: E) -> HarnessError {
    HarnessError::Chart(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::{sample_context, sample_rows};
    use crate::table::to_report;

    fn temp_output_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("nccl_report_{}_{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn csv_round_trips_values_in_row_order() {
        let rows = sample_rows();
        let mut df = to_report(&rows, &sample_context()).unwrap();
        let path = temp_output_dir("csv").join("all_reduce.csv");
        write_csv(&mut df, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines = text.lines().collect::<Vec<&str>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "timestamp,node_id,iommu,card_num,op,device_ids,p2p,size,count,type,redop,\
             root,ofp_time,ofp_algbw,ofp_busbw,ofp_wrong,ip_time,ip_algbw,ip_busbw,ip_wrong"
        );

        for (line, expected) in lines[1..].iter().zip(&rows) {
            let fields = line.split(',').collect::<Vec<&str>>();
            assert_eq!(fields.len(), 20);
            assert_eq!(fields[7].parse::<u64>().unwrap(), expected.size);
            assert_eq!(fields[8].parse::<u64>().unwrap(), expected.count);
            assert_eq!(fields[11].parse::<i64>().unwrap(), expected.root);
            assert_eq!(fields[12].parse::<f64>().unwrap(), expected.ofp_time);
            assert_eq!(fields[13].parse::<f64>().unwrap(), expected.ofp_algbw);
            assert_eq!(fields[14].parse::<f64>().unwrap(), expected.ofp_busbw);
            assert_eq!(fields[16].parse::<f64>().unwrap(), expected.ip_time);
            assert_eq!(fields[17].parse::<f64>().unwrap(), expected.ip_algbw);
            assert_eq!(fields[18].parse::<f64>().unwrap(), expected.ip_busbw);
        }
    }

    #[test]
    fn charts_are_written_for_both_bandwidth_kinds() {
        let dir = temp_output_dir("charts");
        let ctx = sample_context();
        render_charts(&sample_rows(), &ctx, &dir).unwrap();
        assert!(dir.join("all_reduce_alg.png").exists());
        assert!(dir.join("all_reduce_bus.png").exists());
    }
}
