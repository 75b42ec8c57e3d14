//! Control building blocks: discrete LQR and the low-level steer/speed loops

pub mod lqr_control;
pub mod low_level;

pub use lqr_control::{dlqr, solve_dare, GainCache, LqrSolution};
pub use low_level::{SpeedControl, SpeedParams, SteerControl};
