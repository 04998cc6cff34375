// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 单目标跟踪器 (Single-target tracker)

use tracing::{debug, trace};

use super::kalman::{self, KalmanConfig, Mat4, State};
use crate::detection::Point2;
use crate::error::TrackError;

#[derive(Debug, Clone, PartialEq)]
enum TrackerState {
    Uninitialized,
    Tracking {
        /// [x, y, vx, vy]
        state: State,
        /// 估计误差协方差
        cov: Mat4,
    },
}

/// 匀速卡尔曼跟踪器, 每帧接收一个位置观测
///
/// 第一次观测直接作为初始位置 (速度为 0), 之后每次观测执行预测 + 校正。
/// 跟踪新目标时调用 [`TargetTracker::reset`] 或重新构造。
#[derive(Debug, Clone)]
pub struct TargetTracker {
    config: KalmanConfig,
    state: TrackerState,
    steps: u64,
}

impl Default for TargetTracker {
    fn default() -> Self {
        Self::new(KalmanConfig::default())
    }
}

impl TargetTracker {
    pub fn new(config: KalmanConfig) -> Self {
        Self {
            config,
            state: TrackerState::Uninitialized,
            steps: 0,
        }
    }

    pub fn config(&self) -> &KalmanConfig {
        &self.config
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, TrackerState::Tracking { .. })
    }

    /// 已消费的观测数
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// 回到未初始化状态
    pub fn reset(&mut self) {
        self.state = TrackerState::Uninitialized;
        self.steps = 0;
    }

    /// 融合一次观测, 返回校正后的位置
    pub fn track(&mut self, measurement: Point2) -> Result<Point2, TrackError> {
        if !measurement.is_finite() {
            return Err(TrackError::NonFiniteMeasurement {
                x: measurement.x(),
                y: measurement.y(),
            });
        }

        let z = [measurement.x(), measurement.y()];
        self.steps += 1;

        if let TrackerState::Tracking { state, cov } = &mut self.state {
            let predicted = kalman::transition(state);
            let propagated = kalman::propagate_covariance(cov, self.config.process_noise);
            let (corrected, corrected_cov) =
                kalman::correct(&predicted, &propagated, z, self.config.measurement_noise);
            *state = corrected;
            *cov = corrected_cov;

            trace!(
                step = self.steps,
                x = corrected[0],
                y = corrected[1],
                vx = corrected[2],
                vy = corrected[3],
                "tracker corrected"
            );
            return Ok(Point2::new(corrected[0], corrected[1]));
        }

        self.state = TrackerState::Tracking {
            state: [z[0], z[1], 0., 0.],
            cov: kalman::identity(self.config.initial_error_cov),
        };
        debug!(x = z[0], y = z[1], "tracker seeded");
        Ok(measurement)
    }

    /// 下一帧位置预测 (不修改已提交的状态), 未初始化时返回 None
    pub fn predicted_position(&self) -> Option<Point2> {
        match &self.state {
            TrackerState::Uninitialized => None,
            TrackerState::Tracking { state, .. } => {
                let next = kalman::transition(state);
                Some(Point2::new(next[0], next[1]))
            }
        }
    }

    /// 当前位置估计
    pub fn position(&self) -> Option<Point2> {
        match &self.state {
            TrackerState::Uninitialized => None,
            TrackerState::Tracking { state, .. } => Some(Point2::new(state[0], state[1])),
        }
    }

    /// 当前速度估计 (像素/帧)
    pub fn velocity(&self) -> Option<(f32, f32)> {
        match &self.state {
            TrackerState::Uninitialized => None,
            TrackerState::Tracking { state, .. } => Some((state[2], state[3])),
        }
    }
}
