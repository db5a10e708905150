//! Thin CLI adapter: reads IMU/Vicon/reference-time CSVs, builds and solves
//! the calibration graph, and writes the States CSV and Info text file.
//! Everything here is "external collaborator" territory (spec.md §1) --
//! the estimator itself lives in the library crate.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use vicon_imu_calibrate::config::Config;
use vicon_imu_calibrate::error::EstimatorError;
use vicon_imu_calibrate::io;
use vicon_imu_calibrate::solver::Solver;

#[derive(Parser, Debug)]
#[command(name = "vicon-imu-calibrate", about = "Batch IMU/Vicon extrinsic calibration estimator")]
struct Cli {
    /// IMU samples CSV: t,wx,wy,wz,ax,ay,az
    #[arg(long)]
    imu: Option<PathBuf>,

    /// Vicon pose samples CSV: t,qx,qy,qz,qw,px,py,pz[,21 covariance columns]
    #[arg(long)]
    vicon: Option<PathBuf>,

    /// Reference timestamps CSV, single column t
    #[arg(long = "reference-times")]
    reference_times: Option<PathBuf>,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// States output CSV path
    #[arg(long = "states-out")]
    states_out: Option<PathBuf>,

    /// Info output text path
    #[arg(long = "info-out")]
    info_out: Option<PathBuf>,

    /// Raise log verbosity: -v for info, -vv for debug
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {e}");
            return ExitCode::from(4);
        }
    };

    init_logging(cli.verbose.max(config.logging.verbosity));

    match run(&cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn load_config(path: &Option<PathBuf>) -> Result<Config, String> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).map_err(|e| format!("{}: {e}", p.display()))?;
            Config::from_toml_str(&text).map_err(|e| e.to_string())
        }
        None => Ok(Config::default()),
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env().filter_level(level).init();
}

fn run(cli: &Cli, config: Config) -> Result<(), EstimatorError> {
    let imu_path = cli.imu.clone().unwrap_or_else(|| PathBuf::from(&config.io.imu_path));
    let vicon_path = cli.vicon.clone().unwrap_or_else(|| PathBuf::from(&config.io.vicon_path));
    let reference_times_path = cli
        .reference_times
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.io.reference_times_path));
    let states_out_path = cli
        .states_out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.io.states_out_path));
    let info_out_path = cli
        .info_out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.io.info_out_path));

    let mut solver = Solver::new(config.clone());

    let imu_count = io::load_imu(&imu_path, &mut solver)?;
    info!("loaded {imu_count} IMU samples from {}", imu_path.display());

    let vicon_count = io::load_vicon(&vicon_path, &mut solver, &config)?;
    info!("loaded {vicon_count} Vicon samples from {}", vicon_path.display());

    let reference_times = io::load_reference_times(&reference_times_path)?;
    let reference_count = reference_times.len();
    info!("loaded {reference_count} reference timestamps from {}", reference_times_path.display());

    solver.set_reference_times(reference_times)?;

    let outcome = solver.build_and_solve()?;
    info!(
        "solve finished: converged={} iterations={} final_cost={:.9}",
        outcome.converged, outcome.iterations, outcome.final_cost
    );

    io::write_states(&states_out_path, &outcome)?;
    io::write_info(&info_out_path, &outcome, imu_count, vicon_count, reference_count)?;

    Ok(())
}
