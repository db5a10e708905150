use crate::dtype;
use crate::error::Result;
use crate::imu::ImuPropagator;
use crate::linalg::Vector3;
use crate::variables::{Calibration, ImuBias, LieGroup, Sphere2, Var, Values, SE3, SO3, B, C, V, X};
use crate::vicon::Interpolator;

/// Initial state nodes and calibration guess for reference timestamps `t`,
/// following spec's "R_k from Interpolator at t_k . R_IV^-1 ... v_k by
/// finite differences of position; biases zero; R_IV identity; g_V from a
/// coarse first-iteration alignment of accel averages; t_off = 0."
pub fn initial_values(t: &[dtype], interpolator: &Interpolator, propagator: &ImuPropagator) -> Result<Values> {
    let r_iv_guess = SO3::identity();

    let mut positions = Vec::with_capacity(t.len());
    let mut rotations = Vec::with_capacity(t.len());
    for &tk in t {
        let (r, p, _cov) = interpolator.interpolate(tk)?;
        rotations.push(r.compose(&r_iv_guess.inverse()));
        positions.push(p);
    }

    let mut values = Values::new();
    for (k, ((r, p), &tk)) in rotations.into_iter().zip(positions.iter()).zip(t.iter()).enumerate() {
        let _ = tk;
        values.insert(X(k as u64), Var::Pose(SE3::new(r, p)));
        values.insert(V(k as u64), Var::Vel(finite_difference_velocity(&positions, t, k)));
        values.insert(B(k as u64), Var::Bias(ImuBias::zero()));
    }

    let gravity_dir = match propagator.mean_accel() {
        Some(mean_accel) if mean_accel.norm() > 1e-6 => Sphere2::from_vec(-mean_accel),
        _ => Sphere2::from_vec(Vector3::new(0.0, 0.0, -1.0)),
    };
    values.insert(C(0), Var::Calib(Calibration::new(r_iv_guess, gravity_dir, 0.0)));

    Ok(values)
}

fn finite_difference_velocity(positions: &[Vector3], t: &[dtype], k: usize) -> Vector3 {
    if positions.len() < 2 {
        return Vector3::zeros();
    }
    if k == 0 {
        (positions[1] - positions[0]) / (t[1] - t[0])
    } else if k == positions.len() - 1 {
        (positions[k] - positions[k - 1]) / (t[k] - t[k - 1])
    } else {
        (positions[k + 1] - positions[k - 1]) / (t[k + 1] - t[k - 1])
    }
}
