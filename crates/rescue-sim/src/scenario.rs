//! # 仿真场景
//!
//! 场景以 TOML 描述：哪些设备存在、世界参数，以及按阶段排列的传感器输入。
//!
//! ```toml
//! [devices]
//! accelerometer = false
//!
//! [world]
//! realtime = false
//!
//! [[phase]]
//! ticks = 10
//! front = 0.2
//! front_objects = ["SurvivorObstacle"]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 开阔空间的距离读数（m）
pub const OPEN_SPACE: f64 = 999.0;
/// 静止水平放置时的加速度计读数
pub const LEVEL_ACCEL: [f64; 3] = [0.0, 0.0, 9.81];

const DEMO_SCENARIO: &str = include_str!("../scenarios/demo.toml");

/// 场景错误
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Failed to read scenario '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Scenario has no ticks")]
    Empty,

    #[error("Invalid scenario: {0}")]
    Invalid(String),
}

/// 设备是否存在
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceFlags {
    pub left_motor: bool,
    pub right_motor: bool,
    pub front_sensor: bool,
    pub left_sensor: bool,
    pub right_sensor: bool,
    /// 距离传感器是否支持目标识别
    pub recognition: bool,
    pub accelerometer: bool,
    pub emitter: bool,
    pub leds: bool,
}

impl Default for DeviceFlags {
    fn default() -> Self {
        Self {
            left_motor: true,
            right_motor: true,
            front_sensor: true,
            left_sensor: true,
            right_sensor: true,
            recognition: true,
            accelerometer: true,
            emitter: true,
            leds: true,
        }
    }
}

/// 世界参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldSettings {
    /// 按墙钟时间节拍推进
    pub realtime: bool,
    /// 轮半径（m）
    pub wheel_radius: f64,
    /// 轮距（m）
    pub axle_length: f64,
    /// 起始位姿 `[x, y, heading]`
    pub start: [f64; 3],
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            realtime: false,
            wheel_radius: 0.0325,
            axle_length: 0.1,
            start: [0.0, 0.0, 0.0],
        }
    }
}

/// 一段持续若干 tick 的恒定输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Phase {
    pub ticks: u32,
    pub front: f64,
    pub left: f64,
    pub right: f64,
    pub accel: [f64; 3],
    pub front_objects: Vec<String>,
    pub left_objects: Vec<String>,
    pub right_objects: Vec<String>,
}

impl Default for Phase {
    fn default() -> Self {
        Self {
            ticks: 1,
            front: OPEN_SPACE,
            left: OPEN_SPACE,
            right: OPEN_SPACE,
            accel: LEVEL_ACCEL,
            front_objects: Vec::new(),
            left_objects: Vec::new(),
            right_objects: Vec::new(),
        }
    }
}

impl Phase {
    pub fn objects(&self, index: usize) -> &[String] {
        match index {
            0 => &self.front_objects,
            1 => &self.left_objects,
            _ => &self.right_objects,
        }
    }

    pub fn distance(&self, index: usize) -> f64 {
        match index {
            0 => self.front,
            1 => self.left,
            _ => self.right,
        }
    }
}

/// 完整场景
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub devices: DeviceFlags,
    pub world: WorldSettings,
    #[serde(rename = "phase")]
    pub phases: Vec<Phase>,
}

impl Scenario {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, SimError> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// 内置演示场景
    pub fn demo() -> Self {
        // 内置文件在测试中校验过
        Self::from_toml_str(DEMO_SCENARIO).unwrap_or_default()
    }

    pub fn total_ticks(&self) -> u64 {
        self.phases.iter().map(|p| u64::from(p.ticks)).sum()
    }

    /// 第 `tick` 个 tick 所处的阶段
    pub fn phase_at(&self, tick: u64) -> Option<&Phase> {
        let mut remaining = tick;
        for phase in &self.phases {
            let ticks = u64::from(phase.ticks);
            if remaining < ticks {
                return Some(phase);
            }
            remaining -= ticks;
        }
        None
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.total_ticks() == 0 {
            return Err(SimError::Empty);
        }
        if self.world.wheel_radius <= 0.0 || self.world.axle_length <= 0.0 {
            return Err(SimError::Invalid(format!(
                "wheel_radius {} and axle_length {} must be > 0",
                self.world.wheel_radius, self.world.axle_length
            )));
        }
        if let Some(phase) = self
            .phases
            .iter()
            .find(|p| p.front < 0.0 || p.left < 0.0 || p.right < 0.0)
        {
            return Err(SimError::Invalid(format!(
                "negative distance in phase {:?}",
                phase
            )));
        }
        Ok(())
    }
}
