//! 设备抽象层
//!
//! 仿真器（或真实硬件）通过 [`RobotHost`] 暴露按名称查找的设备。控制器在启动时
//! 调用一次 [`Devices::acquire`]，把可选设备解析成能力集合，之后每个 tick 都只
//! 通过 [`Devices`] 读写，不再重复检查设备是否存在。
//!
//! # 错误分级
//!
//! - 驱动轮电机缺失：致命，返回 [`ControllerError::MissingActuator`]
//! - 其他设备缺失：记录一次警告，对应能力在本次运行中关闭

use tracing::{debug, error, info, warn};

use crate::actuation::{Indicators, WheelSpeeds};
use crate::config::ControllerConfig;
use crate::controller::Notification;
use crate::error::{ControllerError, DeviceError};
use crate::sensing::{RawReadings, SensorPosition, SensorReading};

/// 感知服务返回的识别对象
///
/// 只读；控制器不持有也不修改它代表的仿真对象。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecognizedObject {
    /// 对象的 `name` 字段（节点不可访问时为 `None`）
    pub name: Option<String>,
    /// 模型名
    pub model: Option<String>,
}

impl RecognizedObject {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            model: None,
        }
    }
}

/// 宿主 step 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// 继续下一个 tick
    Continue,
    /// 宿主要求退出
    Stop,
}

/// 连续旋转电机
pub trait Motor {
    /// 设置目标位置；`f64::INFINITY` 切换为速度控制模式
    fn set_position(&mut self, position: f64);
    /// 设置角速度（rad/s）
    fn set_velocity(&mut self, velocity: f64);
}

/// 距离传感器（附带目标识别）
pub trait DistanceSensor {
    fn enable(&mut self, sampling_period_ms: u32);
    /// 开启识别；不支持时返回 [`DeviceError::RecognitionUnsupported`]
    fn enable_recognition(&mut self, sampling_period_ms: u32) -> Result<(), DeviceError>;
    /// 当前距离（m）
    fn value(&self) -> f64;
    /// 当前可识别的对象，顺序由感知服务决定
    fn recognized_objects(&self) -> Vec<RecognizedObject>;
}

/// 三轴加速度计
pub trait Accelerometer {
    fn enable(&mut self, sampling_period_ms: u32);
    fn values(&self) -> [f64; 3];
}

/// 广播发射器
///
/// 发后即忘：没有确认，没有重试。
pub trait Emitter {
    fn set_channel(&mut self, channel: i32);
    fn send(&mut self, payload: &[u8]) -> Result<(), DeviceError>;
}

/// 指示灯
pub trait Led {
    fn set(&mut self, on: bool);
}

/// 宿主运行时
///
/// 设备查找返回 `None` 表示设备不存在。
pub trait RobotHost {
    fn motor(&mut self, name: &str) -> Option<Box<dyn Motor>>;
    fn distance_sensor(&mut self, name: &str) -> Option<Box<dyn DistanceSensor>>;
    fn accelerometer(&mut self, name: &str) -> Option<Box<dyn Accelerometer>>;
    fn emitter(&mut self, name: &str) -> Option<Box<dyn Emitter>>;
    fn led(&mut self, name: &str) -> Option<Box<dyn Led>>;

    /// 推进一个仿真步长
    fn step(&mut self, time_step_ms: u32) -> StepOutcome;

    /// 释放设备
    fn cleanup(&mut self) {}
}

/// 本次运行可用的可选能力
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub front_sensor: bool,
    pub left_sensor: bool,
    pub right_sensor: bool,
    pub tilt_detection: bool,
    pub notifications: bool,
    pub indicators: bool,
}

/// 已解析的设备集合
pub struct Devices {
    left_motor: Box<dyn Motor>,
    right_motor: Box<dyn Motor>,
    /// 按 [`SensorPosition`] 顺序：前、左、右
    sensors: [Option<Box<dyn DistanceSensor>>; 3],
    accelerometer: Option<Box<dyn Accelerometer>>,
    emitter: Option<Box<dyn Emitter>>,
    left_led: Option<Box<dyn Led>>,
    right_led: Option<Box<dyn Led>>,
}

impl Devices {
    /// 从宿主获取并初始化全部设备
    pub fn acquire<H>(host: &mut H, config: &ControllerConfig) -> Result<Self, ControllerError>
    where
        H: RobotHost + ?Sized,
    {
        let names = &config.devices;
        let period = config.time_step_ms;

        let mut left_motor = require_motor(host, &names.left_motor)?;
        let mut right_motor = require_motor(host, &names.right_motor)?;
        for motor in [&mut left_motor, &mut right_motor] {
            motor.set_position(f64::INFINITY);
            motor.set_velocity(0.0);
        }

        let sensors = SensorPosition::ALL.map(|position| {
            let name = position.device_name(names);
            let mut sensor = match host.distance_sensor(name) {
                Some(sensor) => sensor,
                None => {
                    warn!("Distance sensor '{}' ({:?}) not found, reading as open space", name, position);
                    return None;
                },
            };
            sensor.enable(period);
            if let Err(e) = sensor.enable_recognition(period) {
                warn!("Recognition disabled for '{}': {}", name, e);
            }
            Some(sensor)
        });

        let accelerometer = match host.accelerometer(&names.accelerometer) {
            Some(mut accel) => {
                accel.enable(period);
                Some(accel)
            },
            None => {
                warn!("Accelerometer '{}' not found, tilt detection disabled", names.accelerometer);
                None
            },
        };

        let emitter = match host.emitter(&names.emitter) {
            Some(mut emitter) => {
                emitter.set_channel(config.emitter_channel);
                Some(emitter)
            },
            None => {
                error!("Emitter '{}' not found! Cannot send survivor signal.", names.emitter);
                None
            },
        };

        let left_led = host.led(&names.left_led);
        let right_led = host.led(&names.right_led);
        for (led, name) in [(&left_led, &names.left_led), (&right_led, &names.right_led)] {
            if led.is_none() {
                warn!("LED '{}' not found", name);
            }
        }

        let devices = Self {
            left_motor,
            right_motor,
            sensors,
            accelerometer,
            emitter,
            left_led,
            right_led,
        };
        info!(capabilities = ?devices.capabilities(), "Devices initialized");
        Ok(devices)
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            front_sensor: self.sensors[SensorPosition::Front.index()].is_some(),
            left_sensor: self.sensors[SensorPosition::Left.index()].is_some(),
            right_sensor: self.sensors[SensorPosition::Right.index()].is_some(),
            tilt_detection: self.accelerometer.is_some(),
            notifications: self.emitter.is_some(),
            indicators: self.left_led.is_some() || self.right_led.is_some(),
        }
    }

    /// 读取本 tick 的原始传感器数据
    pub fn read(&self) -> RawReadings {
        let sensors = self.sensors.each_ref().map(|sensor| {
            sensor.as_ref().map(|s| SensorReading {
                distance: s.value(),
                objects: s.recognized_objects(),
            })
        });
        RawReadings {
            sensors,
            acceleration: self.accelerometer.as_ref().map(|a| a.values()),
        }
    }

    pub fn set_wheels(&mut self, wheels: WheelSpeeds) {
        self.left_motor.set_velocity(wheels.left);
        self.right_motor.set_velocity(wheels.right);
    }

    /// 每个 tick 先熄灭指示灯，再按状态点亮
    pub fn set_indicators(&mut self, indicators: Indicators) {
        for (led, on) in [
            (&mut self.left_led, indicators.left),
            (&mut self.right_led, indicators.right),
        ] {
            if let Some(led) = led {
                led.set(false);
                if on {
                    led.set(true);
                }
            }
        }
    }

    /// 发送通知；发射器缺失或发送失败时返回 `false`
    pub fn emit(&mut self, notification: &Notification) -> bool {
        let Some(emitter) = self.emitter.as_mut() else {
            debug!("Emitter unavailable, survivor signal dropped");
            return false;
        };
        match emitter.send(&notification.payload) {
            Ok(()) => true,
            Err(e) => {
                warn!("Emitter send failed: {}", e);
                false
            },
        }
    }
}

fn require_motor<H>(host: &mut H, name: &str) -> Result<Box<dyn Motor>, ControllerError>
where
    H: RobotHost + ?Sized,
{
    host.motor(name).ok_or_else(|| {
        error!("Wheel motor '{}' not found, cannot operate", name);
        ControllerError::MissingActuator {
            name: name.to_string(),
        }
    })
}
