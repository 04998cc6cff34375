// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! 目标跟踪 (Target tracking)
//!
//! - Kalman:  匀速模型的状态转移与协方差更新
//! - Tracker: 单目标跟踪状态机
pub mod kalman;
pub mod tracker;

pub use kalman::KalmanConfig;
pub use tracker::TargetTracker;
