//! # Rescue Controller
//!
//! 差速驱动搜救机器人的反应式控制器。每个仿真 tick：
//!
//! - **感知** (`sensing`): 读取前/左/右距离与识别结果、加速度计，分类出倾倒与幸存者
//! - **策略** (`policy`): 按优先级选择四种行为状态之一
//! - **执行** (`actuation`): 计算左右轮速与指示灯
//! - **广播** (`controller`): 新确认幸存者时发送一次通知
//!
//! 仿真器（物理、识别、消息传输）通过 [`device`] 中的 trait 接入，控制器不实现它们。
//!
//! ```rust,ignore
//! use rescue_controller::{ControllerConfig, run};
//!
//! let summary = run(&mut host, ControllerConfig::default(), None)?;
//! ```

pub mod actuation;
pub mod config;
pub mod controller;
pub mod device;
mod error;
pub mod policy;
pub mod runner;
pub mod sensing;

pub use actuation::{ActuatorCommand, Indicators, TurnDirection, WheelSpeeds, actuate};
pub use config::{ControllerConfig, DeviceNames};
pub use controller::{Notification, RescueController, TickOutput, tick};
pub use device::{
    Accelerometer, Capabilities, Devices, DistanceSensor, Emitter, Led, Motor, RecognizedObject,
    RobotHost, StepOutcome,
};
pub use error::{ControllerError, DeviceError};
pub use policy::{ControlState, RobotState, Transition, transition};
pub use runner::{RunSummary, run};
pub use sensing::{RawReadings, SensorFrame, SensorPosition, SensorReading, classify};
