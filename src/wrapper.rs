use std::process::Command;

use log::{debug, info};

use crate::error::HarnessError;
use crate::invoke::Invocation;

/// Run the benchmark binary synchronously and capture its standard output.
///
/// The child inherits the parent environment with the invocation's overlay
/// applied on top. Parsing only happens after a clean exit; a non-zero
/// status surfaces the captured stderr verbatim.
pub fn run_benchmark(invocation: &Invocation) -> Result<String, HarnessError> {
    info!(
        "{} {}",
        invocation.program.display(),
        invocation.args.join(" ")
    );
    for (key, value) in &invocation.env {
        debug!("with {}={}", key, value);
    }

    let output = Command::new(&invocation.program)
        .args(&invocation.args)
        .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .output()?;

    if !output.status.success() {
        return Err(HarnessError::ProcessExecution {
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn nonzero_exit_surfaces_stderr() {
        let invocation = Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()],
            env: vec![],
        };
        match run_benchmark(&invocation) {
            Err(HarnessError::ProcessExecution { status, stderr }) => {
                assert_eq!(status, 3);
                assert_eq!(stderr.trim(), "boom");
            }
            other => panic!("expected ProcessExecution, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn clean_exit_returns_stdout() {
        let invocation = Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), "echo '# header'; echo data".to_string()],
            env: vec![],
        };
        let stdout = run_benchmark(&invocation).unwrap();
        assert_eq!(stdout, "# header\ndata\n");
    }
}
