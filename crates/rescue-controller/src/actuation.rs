//! 执行层：状态 → 轮速与指示灯

use crate::config::ControllerConfig;
use crate::policy::RobotState;
use crate::sensing::SensorFrame;

/// 左右轮角速度（rad/s）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelSpeeds {
    pub left: f64,
    pub right: f64,
}

impl WheelSpeeds {
    pub const STOP: Self = Self {
        left: 0.0,
        right: 0.0,
    };

    pub const fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn is_stopped(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}

/// 指示灯输出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Indicators {
    pub left: bool,
    pub right: bool,
}

impl Indicators {
    pub const OFF: Self = Self {
        left: false,
        right: false,
    };
    pub const ON: Self = Self {
        left: true,
        right: true,
    };
}

/// 避障转向方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    /// 左侧更近则右转；相等时落入左转分支
    pub fn away_from_nearer(left: f64, right: f64) -> Self {
        if left < right { Self::Right } else { Self::Left }
    }

    pub fn wheels(self, turn_speed: f64) -> WheelSpeeds {
        match self {
            Self::Right => WheelSpeeds::new(turn_speed, -turn_speed),
            Self::Left => WheelSpeeds::new(-turn_speed, turn_speed),
        }
    }
}

/// 一个 tick 的执行器输出
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActuatorCommand {
    pub wheels: WheelSpeeds,
    pub indicators: Indicators,
}

/// 根据状态计算执行器输出
///
/// 轮速只取决于状态，`AvoidingObstacle` 额外参考左右距离。
/// 救援期间指示灯按计时器闪烁：`aid_timer % 4 < 2` 时点亮。
pub fn actuate(
    state: RobotState,
    aid_timer: u32,
    frame: &SensorFrame,
    config: &ControllerConfig,
) -> ActuatorCommand {
    match state {
        RobotState::Tilted => ActuatorCommand {
            wheels: WheelSpeeds::STOP,
            indicators: Indicators::ON,
        },
        RobotState::DeployingAid => ActuatorCommand {
            wheels: WheelSpeeds::STOP,
            indicators: if aid_timer % 4 < 2 {
                Indicators::ON
            } else {
                Indicators::OFF
            },
        },
        RobotState::AvoidingObstacle => ActuatorCommand {
            wheels: TurnDirection::away_from_nearer(frame.left, frame.right)
                .wheels(config.turn_speed),
            indicators: Indicators::OFF,
        },
        RobotState::Searching => ActuatorCommand {
            wheels: WheelSpeeds::new(config.forward_speed, config.forward_speed),
            indicators: Indicators::OFF,
        },
    }
}
