//! Small residuals used to anchor and regularize the graph: priors on a
//! single node, and a zero-mean "between" constraint linking two nodes of
//! the same type (used for the IMU bias random walk). The two residuals that
//! read raw sensor buffers -- IMU preintegration and interpolated Vicon pose
//! -- live alongside their buffers in [crate::imu] and [crate::vicon]
//! instead, since each needs the buffer and calibration state together.

mod prior;
pub use prior::{PriorBias, PriorCalib, PriorPose};

mod between;
pub use between::BetweenBias;
