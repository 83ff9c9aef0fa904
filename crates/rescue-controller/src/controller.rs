//! 控制循环
//!
//! - [`tick`]：纯函数，`(控制状态, 传感帧) -> (新控制状态, 执行器输出, 可选通知)`，
//!   可以被仿真宿主、测试或真实硬件循环直接调用
//! - [`RescueController`]：持有控制状态、遥测计数器和设备，每个 tick 完成
//!   读取 → 分类 → 转移 → 执行 → 广播 → 日志

use tracing::{debug, info};

use crate::actuation::{ActuatorCommand, Indicators, TurnDirection, WheelSpeeds, actuate};
use crate::config::ControllerConfig;
use crate::device::Devices;
use crate::error::ControllerError;
use crate::policy::{ControlState, RobotState, Transition, transition};
use crate::sensing::{SensorFrame, classify};

/// 出站广播
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub channel: i32,
    pub payload: Vec<u8>,
}

/// 一个 tick 的完整输出
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    pub control: ControlState,
    pub command: ActuatorCommand,
    pub notification: Option<Notification>,
    /// 救援计时器是否在本 tick 归零
    pub deploy_finished: bool,
}

/// 纯控制步
pub fn tick(prev: ControlState, frame: &SensorFrame, config: &ControllerConfig) -> TickOutput {
    let Transition {
        next,
        notify,
        deploy_finished,
    } = transition(prev, frame, config);

    let command = actuate(next.state, next.aid_timer, frame, config);
    let notification = notify.then(|| Notification {
        channel: config.emitter_channel,
        payload: config.survivor_payload(),
    });

    TickOutput {
        control: next,
        command,
        notification,
        deploy_finished,
    }
}

/// 搜救控制器
pub struct RescueController {
    config: ControllerConfig,
    devices: Devices,
    control: ControlState,
    /// 自由运行的遥测计数器
    telemetry_counter: u64,
    notifications_sent: u64,
}

impl RescueController {
    /// 配置非法时返回 [`ControllerError::Config`]
    pub fn new(devices: Devices, config: ControllerConfig) -> Result<Self, ControllerError> {
        config.validate()?;
        Ok(Self {
            config,
            devices,
            control: ControlState::default(),
            telemetry_counter: 0,
            notifications_sent: 0,
        })
    }

    pub fn state(&self) -> RobotState {
        self.control.state
    }

    pub fn control(&self) -> ControlState {
        self.control
    }

    pub fn notifications_sent(&self) -> u64 {
        self.notifications_sent
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// 执行一个 tick
    pub fn step(&mut self) -> TickOutput {
        let readings = self.devices.read();
        let frame = classify(&readings, &self.config);
        if let Some(sensor) = frame.survivor_sensor {
            info!(sensor = ?sensor, distance = frame.distance(sensor), "--- SURVIVOR DETECTED ---");
        }

        let prev = self.control;
        let output = tick(prev, &frame, &self.config);
        self.control = output.control;

        if output.deploy_finished {
            info!("Aid deployment finished");
        }
        self.log_transition(&prev, &output);

        if self.control.state == RobotState::AvoidingObstacle {
            let direction = TurnDirection::away_from_nearer(frame.left, frame.right);
            debug!(?direction, left = frame.left, right = frame.right, "Avoiding");
        }

        self.devices.set_indicators(output.command.indicators);
        self.devices.set_wheels(output.command.wheels);

        if let Some(notification) = &output.notification
            && self.devices.emit(notification)
        {
            self.notifications_sent += 1;
            info!(
                channel = notification.channel,
                "Emitter: sent '{}'", self.config.survivor_message
            );
        }

        if self.telemetry_counter % self.config.telemetry_interval == 0 {
            info!(
                state = self.control.state.code(),
                aid = self.control.aid_timer,
                front = frame.front,
                left = frame.left,
                right = frame.right,
                tilt = frame.tilted,
                survivor = frame.survivor_detected,
                speed_left = output.command.wheels.left,
                speed_right = output.command.wheels.right,
                "telemetry"
            );
        }
        self.telemetry_counter += 1;

        output
    }

    /// 停车并释放设备
    pub fn halt(&mut self) {
        self.devices.set_wheels(WheelSpeeds::STOP);
        self.devices.set_indicators(Indicators::OFF);
    }

    fn log_transition(&self, prev: &ControlState, output: &TickOutput) {
        if output.notification.is_some() {
            info!("STATE CHANGE: Survivor Detected! Deploying Aid & Emitting Signal.");
            return;
        }
        if output.control.state == prev.state {
            return;
        }
        match output.control.state {
            RobotState::Tilted => info!("STATE CHANGE: Robot Tilted! Halting."),
            RobotState::AvoidingObstacle => {
                info!("STATE CHANGE: Obstacle Detected (Front DS). Avoiding.")
            },
            RobotState::Searching => info!("STATE CHANGE: Clear. Resuming Search."),
            RobotState::DeployingAid => {},
        }
    }
}
