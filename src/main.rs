//! Command-line driver: verifies and benchmarks the ELL SpMM kernels
//!
//! ```text
//! ellspmm [--mtx PATH | --random N AVG_NNZ] [--iterations N] [--host]
//! ```
//!
//! Thread count and fetch mode come from `ELLSPMM_THREADS` and
//! `ELLSPMM_FETCH`; log verbosity from `RUST_LOG`.

use std::process::ExitCode;

use ellspmm::constants::DEFAULT_SEED;
use ellspmm::generate::MatrixGenerator;
use ellspmm::{
    benchmark_ell, read_matrix_market, test_spmm_ell_kernel, BenchmarkConfig, CsrMatrix, Device,
    EllSpmm, MemoryLocation, SpmmConfig,
};

const DEFAULT_RANDOM_SIZE: usize = 10_000;
const DEFAULT_RANDOM_NNZ: usize = 8;

enum Source {
    MatrixMarket(String),
    Random { n: usize, avg_nnz: usize },
}

struct Options {
    source: Source,
    iterations: Option<usize>,
    location: MemoryLocation,
}

fn print_usage() {
    println!("Usage: ellspmm [--mtx PATH | --random N AVG_NNZ] [--iterations N] [--host]");
    println!();
    println!("Options:");
    println!("  --mtx PATH          - Load a Matrix Market file");
    println!("  --random N AVG_NNZ  - Generate an N x N matrix (default {} {})", DEFAULT_RANDOM_SIZE, DEFAULT_RANDOM_NNZ);
    println!("  --iterations N      - Kernel dispatches per benchmarked width");
    println!("  --host              - Benchmark with operands in host memory");
    println!();
    println!("Environment:");
    println!("  ELLSPMM_THREADS     - Device worker threads");
    println!("  ELLSPMM_FETCH       - direct | cached");
}

fn parse_count(value: Option<&String>, flag: &str) -> Result<usize, String> {
    value
        .ok_or_else(|| format!("{} needs a value", flag))?
        .parse()
        .map_err(|_| format!("{} expects a non-negative integer", flag))
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        source: Source::Random {
            n: DEFAULT_RANDOM_SIZE,
            avg_nnz: DEFAULT_RANDOM_NNZ,
        },
        iterations: None,
        location: MemoryLocation::Device,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--mtx" => {
                let path = iter.next().ok_or("--mtx needs a path")?;
                options.source = Source::MatrixMarket(path.clone());
            }
            "--random" => {
                let n = parse_count(iter.next(), "--random")?;
                let avg_nnz = parse_count(iter.next(), "--random")?;
                options.source = Source::Random { n, avg_nnz };
            }
            "--iterations" => options.iterations = Some(parse_count(iter.next(), "--iterations")?),
            "--host" => options.location = MemoryLocation::Host,
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }

    Ok(options)
}

fn load_matrix(source: &Source) -> ellspmm::Result<CsrMatrix<f64>> {
    match source {
        Source::MatrixMarket(path) => read_matrix_market(path),
        Source::Random { n, avg_nnz } => MatrixGenerator::new(DEFAULT_SEED).random(*n, *avg_nnz),
    }
}

fn run(options: &Options) -> ellspmm::Result<bool> {
    let config = SpmmConfig::from_env();
    let device = Device::new(&config)?;
    let kernel = EllSpmm {
        mode: config.fetch_mode,
    };

    let csr = load_matrix(&options.source)?;
    println!(
        "Matrix: {} x {} with {} nonzeros ({:.2} per row)",
        csr.shape.num_rows,
        csr.shape.num_cols,
        csr.nnz(),
        csr.shape.average_row_length()
    );
    println!(
        "Device: {} threads, {} rows per block, {} fetch",
        device.num_threads(),
        device.block_size(),
        config.fetch_mode
    );

    let bench_config = match options.iterations {
        Some(n) => BenchmarkConfig::with_iterations(n),
        None => BenchmarkConfig::default(),
    };

    let reports = test_spmm_ell_kernel(&device, &csr, &kernel, &bench_config)?;
    let failures = reports.iter().filter(|r| !r.passed()).count();

    benchmark_ell(&device, &csr, &kernel, options.location, kernel.name(), &bench_config)?;

    if failures > 0 {
        println!("\n{} of {} correctness checks reported POSSIBLE FAILURE", failures, reports.len());
    }
    Ok(failures == 0)
}

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("error: {}", message);
            print_usage();
            return ExitCode::from(2);
        }
    };

    match run(&options) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
