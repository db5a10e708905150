use crate::containers::Order;
use crate::factors::LinearFactor;
use crate::linalg::{MatrixX, VectorX};

/// Stack a set of linearized factors into dense Gauss-Newton normal equations
/// `(AtA) dx = Atb` over the global tangent vector laid out by `order`.
///
/// Dense rather than sparse: the calibration problem's state dimension
/// (a handful of poses/velocities/biases per keyframe plus one calibration
/// node) stays small enough that assembling and factoring a dense normal
/// matrix is simpler and fast enough, unlike the much larger SLAM problems
/// a sparse solver is built for.
pub fn assemble_normal_equations(factors: &[LinearFactor], order: &Order) -> (MatrixX, VectorX) {
    let dim = order.dim();

    let per_factor = |factor: &LinearFactor| -> (Vec<usize>, MatrixX, VectorX) {
        let mut cols = Vec::new();
        for key in factor.keys() {
            let idx = order
                .get(key)
                .expect("factor references a key missing from the values");
            cols.extend(idx.idx..idx.idx + idx.dim);
        }

        let a = factor.a();
        let b = factor.b();
        let local_dim = cols.len();
        let mut local_ata = MatrixX::zeros(local_dim, local_dim);
        let mut local_atb = VectorX::zeros(local_dim);

        for li in 0..local_dim {
            for lj in 0..local_dim {
                let mut sum = 0.0;
                for r in 0..a.nrows() {
                    sum += a[(r, li)] * a[(r, lj)];
                }
                local_ata[(li, lj)] = sum;
            }
            let mut bsum = 0.0;
            for r in 0..a.nrows() {
                bsum += a[(r, li)] * b[r];
            }
            local_atb[li] = bsum;
        }

        (cols, local_ata, local_atb)
    };

    // Each factor's dense block is independent of the others; only the
    // scatter into the shared (ata, atb) accumulator is serial. With the
    // `rayon` feature this lets the per-factor block evaluation -- the
    // expensive part for the IMU/Vicon factors, which re-preintegrate or
    // re-interpolate on every linearization -- fan out across a bounded
    // thread pool, matching spec.md §5's "linear solve may optionally fan
    // out to a bounded thread pool for parallel block evaluation."
    #[cfg(feature = "rayon")]
    let blocks: Vec<_> = {
        use rayon::prelude::*;
        factors.par_iter().map(per_factor).collect()
    };
    #[cfg(not(feature = "rayon"))]
    let blocks: Vec<_> = factors.iter().map(per_factor).collect();

    let mut ata = MatrixX::zeros(dim, dim);
    let mut atb = VectorX::zeros(dim);
    for (cols, local_ata, local_atb) in blocks {
        for (li, &gi) in cols.iter().enumerate() {
            for (lj, &gj) in cols.iter().enumerate() {
                ata[(gi, gj)] += local_ata[(li, lj)];
            }
            atb[gi] += local_atb[li];
        }
    }

    (ata, atb)
}
