//! Parallel Gauss CLI
//!
//! Builds an n×n system from a closed-form formula or a file, solves it with full
//! pivoting on `p` threads, then reports the residual and error norms.
//!
//! # Usage
//! ```bash
//! # 1000x1000 Hilbert-like matrix (formula 4), 8 threads, print a 5x5 corner
//! parallel-gauss 1000 8 5 4
//!
//! # Read the matrix from a file
//! parallel-gauss 3 2 3 0 matrix.txt
//!
//! # Per-step pivot tracing
//! RUST_LOG=parallel_gauss_core=trace parallel-gauss 6 2 6 3
//! ```

mod error;

use clap::error::ErrorKind;
use clap::Parser;
use error::CliError;
use parallel_gauss_core::{
    format_matrix, format_vector, generate, read_matrix, rhs_from_odd_columns,
    verification_threads, verify, Formula, GaussSolver, Matrix, Timings,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "parallel-gauss")]
#[command(about = "Solve Ax = b by multi-threaded Gaussian elimination with full pivoting")]
#[command(version)]
#[command(allow_negative_numbers = true)]
struct Cli {
    /// Matrix dimension
    n: usize,

    /// Number of worker threads
    p: i64,

    /// Number of leading rows and entries to print
    m: usize,

    /// Formula selector (1-4), or 0 to read the matrix from FILE
    k: i64,

    /// Whitespace-separated matrix file, used when k is 0
    file: Option<PathBuf>,
}

impl Cli {
    /// Check argument relationships and return the worker count
    fn validate(&self) -> Result<usize, CliError> {
        if self.m > self.n {
            return Err(CliError::TooManyOutputs {
                m: self.m,
                n: self.n,
            });
        }
        if self.p <= 0 {
            return Err(CliError::InvalidThreads(self.p));
        }
        if self.k == 0 && self.file.is_none() {
            return Err(CliError::MissingFile);
        }
        usize::try_from(self.p).map_err(|_| CliError::InvalidThreads(self.p))
    }

    fn build_matrix(&self, num_threads: usize) -> parallel_gauss_core::Result<Matrix<f64>> {
        match (&self.file, self.k) {
            (Some(path), 0) => Ok(read_matrix(path, self.n)?),
            (_, k) => Ok(generate(Formula::from_selector(k)?, self.n, num_threads)),
        }
    }
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<Timings, CliError> {
    let num_threads = cli.validate()?;
    let total_start = Instant::now();
    let mut timings = Timings::default();

    let start = Instant::now();
    let a = cli.build_matrix(num_threads)?;
    timings.generate_time = start.elapsed().as_secs_f64();

    writeln!(out, "Initial matrix A:")?;
    write!(out, "{}", format_matrix(&a, cli.m))?;

    let b = rhs_from_odd_columns(&a);
    writeln!(out, "Right-hand side b:")?;
    write!(out, "{}", format_vector(&b, cli.m))?;

    let solution = GaussSolver::new(num_threads)?.solve(&a, &b)?;
    timings.solve_time = solution.solve_time;

    writeln!(out, "Solution x:")?;
    write!(out, "{}", format_vector(&solution.x, cli.m))?;

    let start = Instant::now();
    let report = verify(&a, &solution.x, &b, verification_threads(num_threads));
    timings.verify_time = start.elapsed().as_secs_f64();

    writeln!(out, "Residual norm: {:e}", report.residual_norm)?;
    writeln!(out, "Error norm: {:e}", report.error_norm)?;
    writeln!(out, "Solve time: {:.6} s", timings.solve_time)?;

    timings.total_time = total_start.elapsed().as_secs_f64();
    log::info!(
        "n = {}, p = {}: generate {:.6}s, solve {:.6}s, verify {:.6}s, total {:.6}s",
        cli.n,
        num_threads,
        timings.generate_time,
        timings.solve_time,
        timings.verify_time,
        timings.total_time
    );
    Ok(timings)
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(CliError::Usage(err.to_string()).exit_code());
        }
    };

    let stdout = io::stdout();
    match run(&cli, &mut stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parallel_gauss_core::{GaussError, ProviderError};

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("parallel-gauss").chain(args.iter().copied()))
    }

    fn run_args(args: &[&str]) -> (Result<Timings, CliError>, String) {
        let cli = parse(args).unwrap();
        let mut out = Vec::new();
        let result = run(&cli, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    fn exit_code(args: &[&str]) -> u8 {
        run_args(args).0.unwrap_err().exit_code()
    }

    #[test]
    fn test_parse_arguments() {
        let cli = parse(&["100", "4", "5", "2"]).unwrap();
        assert_eq!((cli.n, cli.p, cli.m, cli.k), (100, 4, 5, 2));
        assert!(cli.file.is_none());

        let cli = parse(&["3", "-1", "3", "0", "matrix.txt"]).unwrap();
        assert_eq!(cli.p, -1);
        assert_eq!(cli.file, Some(PathBuf::from("matrix.txt")));
    }

    #[test]
    fn test_usage_errors() {
        assert!(parse(&["10", "2", "3"]).is_err());
        assert!(parse(&["10", "2", "3", "1", "a.txt", "extra"]).is_err());
        assert!(parse(&["ten", "2", "3", "1"]).is_err());
        assert!(parse(&["-10", "2", "3", "1"]).is_err());

        let err = parse(&["10", "2", "3"]).unwrap_err();
        assert_eq!(CliError::Usage(err.to_string()).exit_code(), 3);
    }

    #[test]
    fn test_validation_exit_codes() {
        assert_eq!(exit_code(&["3", "2", "4", "1"]), 1);
        assert_eq!(exit_code(&["3", "0", "3", "1"]), 2);
        assert_eq!(exit_code(&["3", "-4", "3", "1"]), 2);
        assert_eq!(exit_code(&["3", "2", "3", "0"]), 3);
        assert_eq!(exit_code(&["3", "2", "3", "9"]), 4);
        assert_eq!(
            exit_code(&["3", "2", "3", "0", "/nonexistent/parallel-gauss/a.txt"]),
            5
        );
    }

    #[test]
    fn test_build_matrix_errors() {
        let cli = parse(&["3", "2", "3", "7"]).unwrap();
        assert!(matches!(
            cli.build_matrix(2),
            Err(GaussError::Provider(ProviderError::InvalidFormula(7)))
        ));

        let cli = parse(&["3", "2", "3", "0", "/nonexistent/parallel-gauss/a.txt"]).unwrap();
        assert!(matches!(
            cli.build_matrix(2),
            Err(GaussError::Provider(ProviderError::Io { .. }))
        ));

        let cli = parse(&["4", "2", "3", "3"]).unwrap();
        assert_eq!(cli.build_matrix(2).unwrap().dims(), (4, 4));
    }

    #[test]
    fn test_output_order_and_labels() {
        let (result, output) = run_args(&["6", "3", "2", "2"]);
        assert!(result.is_ok());

        let labels: Vec<&str> = output
            .lines()
            .filter(|line| line.ends_with(':') || line.contains("norm") || line.contains("time"))
            .collect();
        assert_eq!(labels[0], "Initial matrix A:");
        assert_eq!(labels[1], "Right-hand side b:");
        assert_eq!(labels[2], "Solution x:");
        assert!(labels[3].starts_with("Residual norm: "));
        assert!(labels[4].starts_with("Error norm: "));
        assert!(labels[5].starts_with("Solve time: "));

        // Max formula: first row of A is 1, 2, 3, ...
        assert!(output.contains("   1.000e0    2.000e0 \n"));
    }

    #[test]
    fn test_matrix_from_file() {
        let path = std::env::temp_dir().join(format!("parallel-gauss-cli-{}.txt", std::process::id()));
        std::fs::write(&path, "2 1 1\n1 3 2\n1 0 0\n").unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let (result, output) = run_args(&["3", "2", "3", "0", &path_arg]);
        assert!(result.is_ok(), "{result:?}");
        assert!(output.contains("Solution x:"));

        std::fs::write(&path, "2 1 1\n1 oops 2\n1 0 0\n").unwrap();
        assert_eq!(exit_code(&["3", "2", "3", "0", &path_arg]), 6);

        std::fs::write(&path, "1 2 3\n0 0 0\n2 4 6\n").unwrap();
        assert_eq!(exit_code(&["3", "2", "3", "0", &path_arg]), 7);

        let _ = std::fs::remove_file(&path);
    }
}
