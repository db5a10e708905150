//! Adapter-side CSV ingestion and output writers. None of this is part of
//! the core estimator's contract (spec.md §1's "data ingestion ... treated
//! as thin adapters") -- it exists to turn the plain CSV files a caller
//! hands the binary into calls against [`Solver`](crate::solver::Solver),
//! and to turn a [`SolveOutcome`](crate::solver::SolveOutcome) back into the
//! two output artifacts.

use std::fs::File;
use std::io::Write as _;
use std::path::Path;

use crate::config::Config;
use crate::dtype;
use crate::error::{EstimatorError, Result};
use crate::linalg::{Matrix3, Vector3, Vector4};
use crate::solver::{SolveOutcome, Solver};
use crate::variables::{LieGroup, Var, B, V, X};
use crate::vicon::PoseSample;

fn csv_error(path: &Path, e: impl std::fmt::Display) -> EstimatorError {
    EstimatorError::Config(format!("{}: {e}", path.display()))
}

/// Reads `t,wx,wy,wz,ax,ay,az` rows (no header) and feeds them to `solver`.
pub fn load_imu(path: &Path, solver: &mut Solver) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let mut count = 0;
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let row = parse_row::<7>(&record, path)?;
        let t = row[0];
        let gyro = Vector3::new(row[1], row[2], row[3]);
        let accel = Vector3::new(row[4], row[5], row[6]);
        solver.feed_imu(t, gyro, accel)?;
        count += 1;
    }
    Ok(count)
}

/// Reads `t,qx,qy,qz,qw,px,py,pz[,21 upper-triangle covariance columns]`
/// rows (no header) and feeds them to `solver`. When the covariance columns
/// are absent, falls back to `config.vicon`'s manual sigmas.
pub fn load_vicon(path: &Path, solver: &mut Solver, config: &Config) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let default_cov_rot = Matrix3::identity() * config.vicon.rotation_sigma_rad.powi(2);
    let default_cov_pos = Matrix3::identity() * config.vicon.position_sigma_m.powi(2);

    let mut count = 0;
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let fields: Vec<dtype> = record
            .iter()
            .map(|s| s.trim().parse::<dtype>().map_err(|e| csv_error(path, e)))
            .collect::<Result<_>>()?;
        if fields.len() != 8 && fields.len() != 8 + 21 {
            return Err(csv_error(
                path,
                format!("expected 8 or 29 columns, found {}", fields.len()),
            ));
        }

        let t = fields[0];
        let xyzw = Vector4::new(fields[1], fields[2], fields[3], fields[4]);
        let pos = Vector3::new(fields[5], fields[6], fields[7]);

        let (cov_rot, cov_pos) = if config.vicon.use_manual_sigmas || fields.len() == 8 {
            (default_cov_rot, default_cov_pos)
        } else {
            upper_triangle_to_6x6(&fields[8..])
        };

        let sample = PoseSample::new(t, xyzw, pos, cov_rot, cov_pos)?;
        solver.feed_vicon(sample)?;
        count += 1;
    }
    Ok(count)
}

/// Reads a single-column `t` file (no header) into a vector of timestamps.
pub fn load_reference_times(path: &Path) -> Result<Vec<dtype>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let mut times = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        let row = parse_row::<1>(&record, path)?;
        times.push(row[0]);
    }
    Ok(times)
}

fn parse_row<const N: usize>(record: &csv::StringRecord, path: &Path) -> Result<[dtype; N]> {
    if record.len() != N {
        return Err(csv_error(path, format!("expected {N} columns, found {}", record.len())));
    }
    let mut row = [0.0; N];
    for (i, field) in record.iter().enumerate() {
        row[i] = field.trim().parse::<dtype>().map_err(|e| csv_error(path, e))?;
    }
    Ok(row)
}

/// Unpacks the spec's 21-value upper-triangle encoding of a 6x6 covariance
/// (rotation block first, then position block, row-major over the upper
/// triangle) into the separate 3x3 blocks the `Interpolator` stores.
fn upper_triangle_to_6x6(values: &[dtype]) -> (Matrix3, Matrix3) {
    let mut full = crate::linalg::Matrix6::zeros();
    let mut idx = 0;
    for r in 0..6 {
        for c in r..6 {
            full[(r, c)] = values[idx];
            full[(c, r)] = values[idx];
            idx += 1;
        }
    }
    let cov_rot = full.fixed_view::<3, 3>(0, 0).clone_owned();
    let cov_pos = full.fixed_view::<3, 3>(3, 3).clone_owned();
    (cov_rot, cov_pos)
}

/// Writes the per-node trajectory as spec.md §6's States CSV:
/// `t, qx, qy, qz, qw, px, py, pz, vx, vy, vz, bgx, bgy, bgz, bax, bay, baz`,
/// `%.9f` for time and `%.6f` for everything else.
pub fn write_states(path: &Path, outcome: &SolveOutcome) -> Result<()> {
    let mut file = File::create(path).map_err(|e| csv_error(path, e))?;
    for (k, &t) in outcome.reference_times.iter().enumerate() {
        let pose = outcome.values.get(&X(k as u64)).as_pose();
        let vel = outcome.values.get(&V(k as u64)).as_vel();
        let bias = outcome.values.get(&B(k as u64)).as_bias();
        let q = pose.rotation().xyzw();
        let p = pose.translation();

        writeln!(
            file,
            "{t:.9},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6},{:.6}",
            q[0], q[1], q[2], q[3],
            p[0], p[1], p[2],
            vel[0], vel[1], vel[2],
            bias.gyro[0], bias.gyro[1], bias.gyro[2],
            bias.accel[0], bias.accel[1], bias.accel[2],
        )
        .map_err(|e| csv_error(path, e))?;
    }
    Ok(())
}

/// Writes spec.md §6's Info text file: calibration results (as quaternion
/// and matrix), their marginal standard deviations, iteration count, final
/// cost, and input sample counts.
#[allow(clippy::too_many_arguments)]
pub fn write_info(
    path: &Path,
    outcome: &SolveOutcome,
    imu_count: usize,
    vicon_count: usize,
    reference_count: usize,
) -> Result<()> {
    let mut file = File::create(path).map_err(|e| csv_error(path, e))?;
    let calib = outcome.values.get(&crate::variables::C(0)).as_calib();
    let q = calib.r_iv.xyzw();
    let r_mat = calib.r_iv.to_matrix();
    let g = calib.gravity_dir.direction() * 9.81;

    let sigma = |i: usize| outcome.calibration_covariance[(i, i)].max(0.0).sqrt();

    writeln!(file, "# Vicon/IMU calibration result").map_err(|e| csv_error(path, e))?;
    writeln!(file, "converged: {}", outcome.converged).map_err(|e| csv_error(path, e))?;
    writeln!(file, "cancelled: {}", outcome.cancelled).map_err(|e| csv_error(path, e))?;
    writeln!(file, "calibration_held_fixed: {}", outcome.calibration_held_fixed).map_err(|e| csv_error(path, e))?;
    writeln!(file, "iterations: {}", outcome.iterations).map_err(|e| csv_error(path, e))?;
    writeln!(file, "final_cost: {:.9}", outcome.final_cost).map_err(|e| csv_error(path, e))?;
    writeln!(file).map_err(|e| csv_error(path, e))?;
    writeln!(
        file,
        "R_IV quaternion (xyzw): [{:.9}, {:.9}, {:.9}, {:.9}]",
        q[0], q[1], q[2], q[3]
    )
    .map_err(|e| csv_error(path, e))?;
    writeln!(file, "R_IV matrix:").map_err(|e| csv_error(path, e))?;
    for r in 0..3 {
        writeln!(file, "  [{:.9}, {:.9}, {:.9}]", r_mat[(r, 0)], r_mat[(r, 1)], r_mat[(r, 2)])
            .map_err(|e| csv_error(path, e))?;
    }
    writeln!(file, "R_IV rotation sigma (rad): [{:.9}, {:.9}, {:.9}]", sigma(0), sigma(1), sigma(2))
        .map_err(|e| csv_error(path, e))?;
    writeln!(file).map_err(|e| csv_error(path, e))?;
    writeln!(file, "gravity_V: [{:.9}, {:.9}, {:.9}]", g[0], g[1], g[2]).map_err(|e| csv_error(path, e))?;
    writeln!(
        file,
        "gravity_V sigma (chart tangent): [{:.9}, {:.9}]",
        sigma(3),
        sigma(4)
    )
    .map_err(|e| csv_error(path, e))?;
    writeln!(file).map_err(|e| csv_error(path, e))?;
    writeln!(file, "t_off: {:.9}", calib.t_off).map_err(|e| csv_error(path, e))?;
    writeln!(file, "t_off sigma (s): {:.9}", sigma(5)).map_err(|e| csv_error(path, e))?;
    writeln!(file).map_err(|e| csv_error(path, e))?;
    writeln!(file, "imu_samples: {imu_count}").map_err(|e| csv_error(path, e))?;
    writeln!(file, "vicon_samples: {vicon_count}").map_err(|e| csv_error(path, e))?;
    writeln!(file, "reference_times: {reference_count}").map_err(|e| csv_error(path, e))?;
    Ok(())
}
