//! 脚本化仿真世界
//!
//! [`SimWorld`] 实现 [`RobotHost`]：按场景阶段逐 tick 提供传感器输入，记录控制器
//! 写出的轮速与指示灯，按差速模型积分位姿，并通过广播总线转发发射器数据。
//!
//! # 设计要点
//!
//! - **单线程**: 设备句柄通过 `Rc<RefCell<_>>` 共享世界状态
//! - **广播总线**: `crossbeam-channel`，接收端按信道号过滤
//! - **节拍**: `realtime = true` 时用 `spin_sleep` 对齐墙钟

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use rescue_controller::config::{
    ACCELEROMETER_NAME, EMITTER_CHANNEL, EMITTER_NAME, FRONT_SENSOR_NAME, LEFT_LED_NAME,
    LEFT_MOTOR_NAME, LEFT_SENSOR_NAME, RIGHT_LED_NAME, RIGHT_MOTOR_NAME, RIGHT_SENSOR_NAME,
    SURVIVOR_MESSAGE,
};
use rescue_controller::{
    Accelerometer, DeviceError, DistanceSensor, Emitter, Indicators, Led, Motor,
    RecognizedObject, RobotHost, StepOutcome, WheelSpeeds,
};
use spin_sleep::SpinSleeper;
use tracing::{debug, info};

use crate::monitor::SurvivorMonitor;
use crate::scenario::{LEVEL_ACCEL, OPEN_SPACE, Phase, Scenario};

/// 广播数据包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub channel: i32,
    pub payload: Vec<u8>,
}

/// 平面位姿
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    /// 航向角（rad）
    pub heading: f64,
}

impl Pose {
    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, 0.0]
    }

    /// 按差速驱动模型积分一个步长
    pub fn integrate(
        &mut self,
        wheels: WheelSpeeds,
        wheel_radius: f64,
        axle_length: f64,
        dt: f64,
    ) {
        let v_left = wheels.left * wheel_radius;
        let v_right = wheels.right * wheel_radius;
        let linear = (v_left + v_right) / 2.0;
        let angular = (v_right - v_left) / axle_length;

        self.heading += angular * dt;
        self.x += linear * self.heading.cos() * dt;
        self.y += linear * self.heading.sin() * dt;
    }
}

/// 一个已完成 tick 的执行器快照
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickRecord {
    pub tick: u64,
    pub wheels: WheelSpeeds,
    pub indicators: Indicators,
    pub pose: Pose,
}

#[derive(Debug, Default)]
struct WorldState {
    /// 已下发的 tick 数
    tick: u64,
    current: Option<Phase>,
    wheels: WheelSpeeds,
    velocity_mode: bool,
    indicators: Indicators,
    pose: Pose,
    emitter_channel: i32,
    packets_sent: u64,
    records: Vec<TickRecord>,
}

type Shared = Rc<RefCell<WorldState>>;

/// 脚本化仿真世界
pub struct SimWorld {
    scenario: Scenario,
    state: Shared,
    radio_tx: Sender<Packet>,
    radio_rx: Receiver<Packet>,
    stop: Arc<AtomicBool>,
    monitor: Option<SurvivorMonitor>,
    sleeper: SpinSleeper,
    last_step: Option<Instant>,
    sim_time_ms: u64,
    cleaned_up: bool,
}

impl SimWorld {
    pub fn new(scenario: Scenario) -> Self {
        let (radio_tx, radio_rx) = unbounded();
        let state = WorldState {
            pose: Pose {
                x: scenario.world.start[0],
                y: scenario.world.start[1],
                heading: scenario.world.start[2],
            },
            ..Default::default()
        };
        Self {
            scenario,
            state: Rc::new(RefCell::new(state)),
            radio_tx,
            radio_rx,
            stop: Arc::new(AtomicBool::new(false)),
            monitor: None,
            sleeper: SpinSleeper::default(),
            last_step: None,
            sim_time_ms: 0,
            cleaned_up: false,
        }
    }

    /// 附带默认监视端（信道 1，幸存者消息）
    pub fn with_monitor(scenario: Scenario) -> Self {
        let mut world = Self::new(scenario);
        let monitor = SurvivorMonitor::new(world.radio(), EMITTER_CHANNEL, SURVIVOR_MESSAGE);
        world.attach_monitor(monitor);
        world
    }

    pub fn attach_monitor(&mut self, monitor: SurvivorMonitor) {
        self.monitor = Some(monitor);
    }

    pub fn monitor(&self) -> Option<&SurvivorMonitor> {
        self.monitor.as_ref()
    }

    /// 广播总线的接收端
    pub fn radio(&self) -> Receiver<Packet> {
        self.radio_rx.clone()
    }

    /// 外部停止标志（例如 Ctrl-C）
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn records(&self) -> Vec<TickRecord> {
        self.state.borrow().records.clone()
    }

    pub fn pose(&self) -> Pose {
        self.state.borrow().pose
    }

    pub fn packets_sent(&self) -> u64 {
        self.state.borrow().packets_sent
    }

    pub fn velocity_mode(&self) -> bool {
        self.state.borrow().velocity_mode
    }

    pub fn is_cleaned_up(&self) -> bool {
        self.cleaned_up
    }

    /// 仿真时间（s）
    pub fn time(&self) -> f64 {
        self.sim_time_ms as f64 / 1000.0
    }

    fn pace(&mut self, time_step_ms: u32) {
        let period = Duration::from_millis(u64::from(time_step_ms));
        if let Some(last) = self.last_step {
            let elapsed = last.elapsed();
            if elapsed < period {
                self.sleeper.sleep(period - elapsed);
            }
        }
        self.last_step = Some(Instant::now());
    }
}

impl RobotHost for SimWorld {
    fn motor(&mut self, name: &str) -> Option<Box<dyn Motor>> {
        let devices = self.scenario.devices;
        let side = match name {
            LEFT_MOTOR_NAME if devices.left_motor => Side::Left,
            RIGHT_MOTOR_NAME if devices.right_motor => Side::Right,
            _ => return None,
        };
        Some(Box::new(SimMotor {
            side,
            state: Rc::clone(&self.state),
        }))
    }

    fn distance_sensor(&mut self, name: &str) -> Option<Box<dyn DistanceSensor>> {
        let devices = self.scenario.devices;
        let index = match name {
            FRONT_SENSOR_NAME if devices.front_sensor => 0,
            LEFT_SENSOR_NAME if devices.left_sensor => 1,
            RIGHT_SENSOR_NAME if devices.right_sensor => 2,
            _ => return None,
        };
        Some(Box::new(SimSensor {
            name: name.to_string(),
            index,
            recognition_supported: devices.recognition,
            recognition_enabled: false,
            state: Rc::clone(&self.state),
        }))
    }

    fn accelerometer(&mut self, name: &str) -> Option<Box<dyn Accelerometer>> {
        if name != ACCELEROMETER_NAME || !self.scenario.devices.accelerometer {
            return None;
        }
        Some(Box::new(SimAccelerometer {
            state: Rc::clone(&self.state),
        }))
    }

    fn emitter(&mut self, name: &str) -> Option<Box<dyn Emitter>> {
        if name != EMITTER_NAME || !self.scenario.devices.emitter {
            return None;
        }
        Some(Box::new(SimEmitter {
            tx: self.radio_tx.clone(),
            state: Rc::clone(&self.state),
        }))
    }

    fn led(&mut self, name: &str) -> Option<Box<dyn Led>> {
        if !self.scenario.devices.leds {
            return None;
        }
        let side = match name {
            LEFT_LED_NAME => Side::Left,
            RIGHT_LED_NAME => Side::Right,
            _ => return None,
        };
        Some(Box::new(SimLed {
            side,
            state: Rc::clone(&self.state),
        }))
    }

    fn step(&mut self, time_step_ms: u32) -> StepOutcome {
        if self.stop.load(Ordering::Relaxed) {
            return StepOutcome::Stop;
        }

        let dt = f64::from(time_step_ms) / 1000.0;
        let world = self.scenario.world;
        let position = {
            let mut state = self.state.borrow_mut();
            let wheels = state.wheels;
            state
                .pose
                .integrate(wheels, world.wheel_radius, world.axle_length, dt);
            if state.tick > 0 {
                let record = TickRecord {
                    tick: state.tick - 1,
                    wheels,
                    indicators: state.indicators,
                    pose: state.pose,
                };
                state.records.push(record);
            }
            state.pose.position()
        };

        self.sim_time_ms += u64::from(time_step_ms);
        let time = self.time();
        if let Some(monitor) = self.monitor.as_mut() {
            let observation = monitor.observe(time, position);
            debug!(status = ?observation.status, velocity = observation.velocity, "Supervisor observation");
        }

        if world.realtime {
            self.pace(time_step_ms);
        }

        let mut state = self.state.borrow_mut();
        match self.scenario.phase_at(state.tick) {
            Some(phase) => {
                state.current = Some(phase.clone());
                state.tick += 1;
                StepOutcome::Continue
            },
            None => {
                info!(ticks = state.tick, "Scenario finished");
                StepOutcome::Stop
            },
        }
    }

    fn cleanup(&mut self) {
        self.cleaned_up = true;
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

struct SimMotor {
    side: Side,
    state: Shared,
}

impl Motor for SimMotor {
    fn set_position(&mut self, position: f64) {
        self.state.borrow_mut().velocity_mode = position.is_infinite();
    }

    fn set_velocity(&mut self, velocity: f64) {
        let mut state = self.state.borrow_mut();
        match self.side {
            Side::Left => state.wheels.left = velocity,
            Side::Right => state.wheels.right = velocity,
        }
    }
}

struct SimSensor {
    name: String,
    index: usize,
    recognition_supported: bool,
    recognition_enabled: bool,
    state: Shared,
}

impl DistanceSensor for SimSensor {
    fn enable(&mut self, _sampling_period_ms: u32) {}

    fn enable_recognition(&mut self, _sampling_period_ms: u32) -> Result<(), DeviceError> {
        if !self.recognition_supported {
            return Err(DeviceError::RecognitionUnsupported(self.name.clone()));
        }
        self.recognition_enabled = true;
        Ok(())
    }

    fn value(&self) -> f64 {
        self.state
            .borrow()
            .current
            .as_ref()
            .map_or(OPEN_SPACE, |phase| phase.distance(self.index))
    }

    fn recognized_objects(&self) -> Vec<RecognizedObject> {
        if !self.recognition_enabled {
            return Vec::new();
        }
        self.state
            .borrow()
            .current
            .as_ref()
            .map(|phase| {
                phase
                    .objects(self.index)
                    .iter()
                    .map(|name| RecognizedObject::named(name.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

struct SimAccelerometer {
    state: Shared,
}

impl Accelerometer for SimAccelerometer {
    fn enable(&mut self, _sampling_period_ms: u32) {}

    fn values(&self) -> [f64; 3] {
        self.state
            .borrow()
            .current
            .as_ref()
            .map_or(LEVEL_ACCEL, |phase| phase.accel)
    }
}

struct SimEmitter {
    tx: Sender<Packet>,
    state: Shared,
}

impl Emitter for SimEmitter {
    fn set_channel(&mut self, channel: i32) {
        self.state.borrow_mut().emitter_channel = channel;
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), DeviceError> {
        let channel = self.state.borrow().emitter_channel;
        self.tx
            .send(Packet {
                channel,
                payload: payload.to_vec(),
            })
            .map_err(|_| DeviceError::ChannelClosed(channel))?;
        self.state.borrow_mut().packets_sent += 1;
        Ok(())
    }
}

struct SimLed {
    side: Side,
    state: Shared,
}

impl Led for SimLed {
    fn set(&mut self, on: bool) {
        let mut state = self.state.borrow_mut();
        match self.side {
            Side::Left => state.indicators.left = on,
            Side::Right => state.indicators.right = on,
        }
    }
}
