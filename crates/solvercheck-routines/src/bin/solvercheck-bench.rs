//! Command-line client: run one case (or an argument-check sweep) and print
//! the report.
//!
//! ```text
//! solvercheck-bench -f larfg -r d n=1024 incx=1
//! solvercheck-bench -f potf2_strided_batched -r z --json '{"n": 64, "batch_count": 32}' perf=1
//! solvercheck-bench --bad-args
//! ```

use std::io;
use std::process::ExitCode;

use clap::Parser;
use solvercheck::device::{Device, DeviceConfig, Handle, WorkspaceMode};
use solvercheck::{
    Arguments, BenchTable, HarnessResult, JsonLinesReporter, Reporter, RunConfig, Validator,
};
use solvercheck_routines::{check_bad_args, routines, run_case};

/// Validate and time device solver routines against host references
#[derive(Parser)]
#[command(name = "solvercheck-bench", version)]
struct Cli {
    /// Routine to run, e.g. larfg
    #[arg(short, long, required_unless_present_any = ["list", "bad_args"])]
    function: Option<String>,

    /// Precision character: s, d, c or z
    #[arg(short = 'r', long, default_value_t = 's')]
    precision: char,

    /// Case and run parameters as key=value
    params: Vec<String>,

    /// Parameters as a JSON object; positional parameters override it
    #[arg(long)]
    json: Option<String>,

    /// One JSON object per case instead of tables
    #[arg(long)]
    json_output: bool,

    /// Run the argument-check sweep (of every routine without --function)
    #[arg(long)]
    bad_args: bool,

    /// Size the workspace with a memory query before each case
    #[arg(long)]
    fixed_workspace: bool,

    /// Device memory in MiB
    #[arg(long, default_value_t = 512)]
    memory_mib: usize,

    /// List registered routines and precisions
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list {
        for (name, precision) in routines() {
            println!("{name} {precision}");
        }
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether every check passed.
fn run(cli: &Cli) -> HarnessResult<bool> {
    let config = DeviceConfig::default().with_memory_limit(cli.memory_mib.saturating_mul(1 << 20));
    let device = Device::new(config)?;
    let mode = if cli.fixed_workspace {
        WorkspaceMode::Fixed
    } else {
        WorkspaceMode::OnDemand
    };
    let handle = Handle::with_workspace_mode(&device, mode);
    log::info!("running on {}", device.name());

    let mut args = arguments(cli)?;
    let config = RunConfig::from_arguments(&mut args)?;

    if cli.json_output {
        execute(cli, &handle, config, JsonLinesReporter::new(io::stdout().lock()), &mut args)
    } else {
        execute(cli, &handle, config, BenchTable::new(io::stdout().lock()), &mut args)
    }
}

fn execute<P: Reporter>(
    cli: &Cli,
    handle: &Handle,
    config: RunConfig,
    reporter: P,
    args: &mut Arguments,
) -> HarnessResult<bool> {
    let mut validator = Validator::new(handle, config, reporter);

    if cli.bad_args {
        let targets: Vec<(&str, char)> = match &cli.function {
            Some(name) => vec![(name.as_str(), cli.precision)],
            None => routines().collect(),
        };
        let mut clean = true;
        for (name, precision) in targets {
            let failures = check_bad_args(&validator, name, precision)?;
            for failure in &failures {
                println!("{name} ({precision}) FAILED: {failure}");
            }
            clean &= failures.is_empty();
        }
        return Ok(clean);
    }

    let Some(name) = &cli.function else {
        return Ok(true);
    };
    let record = run_case(&mut validator, name, cli.precision, args)?;
    Ok(record.passed())
}

/// Named parameters with the bench defaults: timings and errors are reported,
/// the pass/fail check is off unless asked for.
fn arguments(cli: &Cli) -> HarnessResult<Arguments> {
    let mut args = match &cli.json {
        Some(json) => Arguments::from_json(json)?,
        None => Arguments::new(),
    };
    let positional: Arguments = cli.params.join(" ").parse()?;
    for (key, value) in positional.iter() {
        args.set(key, value);
    }

    for (key, default) in [("timing", 1), ("norm_check", 1), ("unit_check", 0)] {
        if !args.contains(key) {
            args.set(key, default);
        }
    }
    Ok(args)
}
