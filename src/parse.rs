use log::info;
use regex::Regex;

use crate::error::HarnessError;
use crate::invoke::Collective;
use crate::table::Row;

/// Number of columns in the nccl-tests output table
pub const COLUMNS: usize = 13;

/// Split captured stdout into raw 13-token data rows.
///
/// `#`-prefixed lines are headers and diagnostics: the topology ones
/// (thread/rank listings) are echoed for the operator, the rest dropped.
/// Everything else is tokenized on whitespace and kept only when it matches
/// the table width, which silently drops blank lines and banners.
pub fn scan_output(stdout: &str, op: Collective) -> Vec<Vec<String>> {
    // Matches the device listing headers printed before the table
    let topology_marker = Regex::new(r"nThread|Rank").unwrap();

    let mut rows = Vec::new();
    for line in stdout.lines() {
        if let Some(stripped) = line.strip_prefix('#') {
            let stripped = stripped.trim();
            if topology_marker.is_match(stripped) {
                info!("{}", stripped);
            }
            continue;
        }

        let mut tokens = line
            .split_whitespace()
            .map(str::to_string)
            .collect::<Vec<String>>();

        // hypercube_perf leaves the redop column blank, which drops one
        // token from every data line
        if op == Collective::Hypercube && tokens.len() == COLUMNS - 1 {
            tokens.insert(3, "na.".to_string());
        }

        if tokens.len() == COLUMNS {
            rows.push(tokens);
        }
    }

    rows
}

/// Coerce raw token rows into typed rows, positionally.
///
/// Fail-fast: the first token that does not parse invalidates the whole
/// run. A single corrupt line would otherwise skew the published peaks.
pub fn type_rows(raw: &[Vec<String>]) -> Result<Vec<Row>, HarnessError> {
    raw.iter()
        .enumerate()
        .map(|(index, tokens)| type_row(index, tokens))
        .collect()
}

fn type_row(row: usize, tokens: &[String]) -> Result<Row, HarnessError> {
    Ok(Row {
        size: coerce(row, "size", &tokens[0])?,
        count: coerce(row, "count", &tokens[1])?,
        dtype: tokens[2].clone(),
        redop: tokens[3].clone(),
        root: coerce(row, "root", &tokens[4])?,
        ofp_time: coerce(row, "ofp_time", &tokens[5])?,
        ofp_algbw: coerce(row, "ofp_algbw", &tokens[6])?,
        ofp_busbw: coerce(row, "ofp_busbw", &tokens[7])?,
        ofp_wrong: tokens[8].clone(),
        ip_time: coerce(row, "ip_time", &tokens[9])?,
        ip_algbw: coerce(row, "ip_algbw", &tokens[10])?,
        ip_busbw: coerce(row, "ip_busbw", &tokens[11])?,
        ip_wrong: tokens[12].clone(),
    })
}

fn coerce<T: std::str::FromStr>(
    row: usize,
    column: &'static str,
    token: &str,
) -> Result<T, HarnessError> {
    token.parse().map_err(|_| HarnessError::TypeCoercion {
        row,
        column,
        token: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# nThread 2 nGpus 1 minBytes 4 maxBytes 1073741824
#  Rank  0 Group  0 Pid 100 on host device  0 [0x17] GPU
#  Rank  1 Group  0 Pid 100 on host device  1 [0x65] GPU
#
#       size         count      type   redop    root
           4             1     uint8     sum      -1    12.3    0.01    0.02       0    12.1    0.02    0.03       0
           8             2     uint8     sum      -1    13.0    0.05    0.06       0    12.9    0.06    0.07       0
# Avg bus bandwidth : 0.045
";

    #[test]
    fn comment_lines_never_become_data() {
        let rows = scan_output(SAMPLE, Collective::AllReduce);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "4");
        assert_eq!(rows[1][0], "8");
    }

    #[test]
    fn comment_line_with_thirteen_tokens_is_still_dropped() {
        let text = "# 4 1 uint8 sum -1 12.3 0.01 0.02 0 12.1 0.02 0.03";
        assert!(scan_output(text, Collective::AllReduce).is_empty());
    }

    #[test]
    fn short_and_long_lines_are_dropped() {
        let text = "4 1 uint8\n4 1 uint8 sum -1 12.3 0.01 0.02 0 12.1 0.02 0.03 0 extra\n";
        assert!(scan_output(text, Collective::AllReduce).is_empty());
    }

    #[test]
    fn hypercube_twelve_tokens_gain_a_placeholder_redop() {
        let text = "4 1 uint8 -1 12.3 0.01 0.02 0 12.1 0.02 0.03 0";
        let rows = scan_output(text, Collective::Hypercube);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), COLUMNS);
        assert_eq!(rows[0][3], "na.");
        assert_eq!(rows[0][4], "-1");
    }

    #[test]
    fn hypercube_thirteen_tokens_pass_through_unchanged() {
        let text = "4 1 uint8 sum -1 12.3 0.01 0.02 0 12.1 0.02 0.03 0";
        let rows = scan_output(text, Collective::Hypercube);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][3], "sum");
    }

    #[test]
    fn hypercube_eleven_tokens_are_dropped() {
        let text = "4 1 uint8 12.3 0.01 0.02 0 12.1 0.02 0.03 0";
        assert!(scan_output(text, Collective::Hypercube).is_empty());
    }

    #[test]
    fn twelve_tokens_without_hypercube_are_dropped() {
        let text = "4 1 uint8 -1 12.3 0.01 0.02 0 12.1 0.02 0.03 0";
        assert!(scan_output(text, Collective::AllReduce).is_empty());
    }

    #[test]
    fn typing_yields_typed_rows() {
        let raw = scan_output(SAMPLE, Collective::AllReduce);
        let rows = type_rows(&raw).unwrap();
        assert_eq!(rows[0].size, 4);
        assert_eq!(rows[0].count, 1);
        assert_eq!(rows[0].dtype, "uint8");
        assert_eq!(rows[0].root, -1);
        assert_eq!(rows[1].ofp_algbw, 0.05);
        assert_eq!(rows[1].ip_time, 12.9);
    }

    #[test]
    fn bad_size_token_fails_the_whole_run() {
        let raw = vec![
            "4 1 uint8 sum -1 12.3 0.01 0.02 0 12.1 0.02 0.03 0"
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<String>>(),
            "abc 1 uint8 sum -1 12.3 0.01 0.02 0 12.1 0.02 0.03 0"
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<String>>(),
        ];
        match type_rows(&raw) {
            Err(HarnessError::TypeCoercion { row, column, token }) => {
                assert_eq!(row, 1);
                assert_eq!(column, "size");
                assert_eq!(token, "abc");
            }
            other => panic!("expected TypeCoercion, got {:?}", other.map(|r| r.len())),
        }
    }

    #[test]
    fn negative_size_fails_typing() {
        let raw = vec!["-4 1 uint8 sum -1 12.3 0.01 0.02 0 12.1 0.02 0.03 0"
            .split_whitespace()
            .map(str::to_string)
            .collect::<Vec<String>>()];
        assert!(matches!(
            type_rows(&raw),
            Err(HarnessError::TypeCoercion { column: "size", .. })
        ));
    }

    #[test]
    fn empty_output_yields_no_rows() {
        assert!(scan_output("", Collective::AllReduce).is_empty());
        let only_comments = "# nThread 1\n# some banner\n";
        assert!(scan_output(only_comments, Collective::AllReduce).is_empty());
    }
}
