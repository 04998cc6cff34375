// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 匀速模型卡尔曼滤波 (Constant-velocity Kalman filter)
//!
//! 状态向量: [x, y, vx, vy], 观测向量: [x, y]
//!
//! ```text
//!     | 1 0 1 0 |        | 1 0 0 0 |
//! F = | 0 1 0 1 |    H = | 0 1 0 0 |
//!     | 0 0 1 0 |
//!     | 0 0 0 1 |
//! ```

use serde::{Deserialize, Serialize};

pub type State = [f32; 4];
pub type Mat4 = [[f32; 4]; 4];

/// 噪声参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanConfig {
    /// 过程噪声 Q (每步每个状态分量)
    pub process_noise: f32,
    /// 观测噪声 R (每个观测分量)
    pub measurement_noise: f32,
    /// 初始误差协方差 P0
    pub initial_error_cov: f32,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            process_noise: 1e-2,
            measurement_noise: 1e-1,
            initial_error_cov: 1.0,
        }
    }
}

pub fn identity(scale: f32) -> Mat4 {
    let mut m = [[0.0; 4]; 4];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = scale;
    }
    m
}

/// 状态转移: x' = F x
pub fn transition(x: &State) -> State {
    [x[0] + x[2], x[1] + x[3], x[2], x[3]]
}

/// 协方差预测: P' = F P F^T + Q
pub fn propagate_covariance(p: &Mat4, q: f32) -> Mat4 {
    // F P: 前两行加上速度行
    let mut fp = *p;
    for j in 0..4 {
        fp[0][j] += p[2][j];
        fp[1][j] += p[3][j];
    }
    // (F P) F^T: 前两列加上速度列
    let mut out = fp;
    for row in out.iter_mut() {
        row[0] += row[2];
        row[1] += row[3];
    }
    for (i, row) in out.iter_mut().enumerate() {
        row[i] += q;
    }
    out
}

/// 观测更新, 返回校正后的状态与协方差
///
/// S = H P H^T + R, K = P H^T S^-1, x = x + K (z - H x), P = (I - K H) P
pub fn correct(x: &State, p: &Mat4, z: [f32; 2], r: f32) -> (State, Mat4) {
    // H P H^T 为 P 左上角 2x2
    let s00 = p[0][0] + r;
    let s01 = p[0][1];
    let s10 = p[1][0];
    let s11 = p[1][1] + r;
    // R > 0 且 P 半正定, S 可逆
    let det = s00 * s11 - s01 * s10;
    let inv = [[s11 / det, -s01 / det], [-s10 / det, s00 / det]];

    // K = P H^T S^-1, P H^T 为 P 的前两列
    let mut k = [[0.0f32; 2]; 4];
    for i in 0..4 {
        for j in 0..2 {
            k[i][j] = p[i][0] * inv[0][j] + p[i][1] * inv[1][j];
        }
    }

    let y = [z[0] - x[0], z[1] - x[1]];
    let mut x_new = *x;
    for i in 0..4 {
        x_new[i] += k[i][0] * y[0] + k[i][1] * y[1];
    }

    // (I - K H) P = P - K (H P), H P 为 P 的前两行
    let mut p_new = *p;
    for i in 0..4 {
        for j in 0..4 {
            p_new[i][j] -= k[i][0] * p[0][j] + k[i][1] * p[1][j];
        }
    }

    (x_new, p_new)
}
