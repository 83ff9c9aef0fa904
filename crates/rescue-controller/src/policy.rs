//! 状态转移策略
//!
//! 每个 tick 只有一个 [`RobotState`] 有效。救援计时器非零时强制保持
//! `DeployingAid`，其余情况按优先级求值：倾倒 > 幸存者 > 前方障碍 > 搜索。

use crate::config::ControllerConfig;
use crate::sensing::SensorFrame;

/// 机器人行为状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RobotState {
    /// 直行搜索（默认）
    #[default]
    Searching,
    /// 原地转向避障
    AvoidingObstacle,
    /// 发现幸存者，原地停留
    DeployingAid,
    /// 倾倒，停车
    Tilted,
}

impl RobotState {
    /// 遥测使用的数字编码
    pub const fn code(self) -> u8 {
        match self {
            Self::Searching => 0,
            Self::AvoidingObstacle => 1,
            Self::DeployingAid => 2,
            Self::Tilted => 3,
        }
    }
}

/// 跨 tick 保留的控制状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlState {
    pub state: RobotState,
    /// 救援倒计时（tick），非零时作为锁存
    pub aid_timer: u32,
}

/// 一次转移的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: ControlState,
    /// 本 tick 是否新确认了幸存者（需要广播）
    pub notify: bool,
    /// 计时器是否在本 tick 归零
    pub deploy_finished: bool,
}

impl Transition {
    pub fn changed(&self, prev: &ControlState) -> bool {
        self.next.state != prev.state
    }
}

/// 计算下一个控制状态
///
/// 计时器在本 tick 递减到零时不强制任何状态，随后在同一 tick 内正常求值。
/// 上一个状态已是 `DeployingAid` 时再次检测到幸存者不会重新计时、也不会
/// 重复广播，状态保持 `DeployingAid`。
pub fn transition(prev: ControlState, frame: &SensorFrame, config: &ControllerConfig) -> Transition {
    let mut next = prev;
    let mut deploy_finished = false;

    if next.aid_timer > 0 {
        next.aid_timer -= 1;
        if next.aid_timer > 0 {
            next.state = RobotState::DeployingAid;
            return Transition {
                next,
                notify: false,
                deploy_finished,
            };
        }
        deploy_finished = true;
    }

    let mut notify = false;
    if frame.tilted {
        next.state = RobotState::Tilted;
    } else if frame.survivor_detected {
        if prev.state != RobotState::DeployingAid {
            next.aid_timer = config.aid_deploy_duration;
            next.state = RobotState::DeployingAid;
            notify = true;
        }
    } else if frame.front < config.obstacle_distance_threshold {
        next.state = RobotState::AvoidingObstacle;
    } else {
        next.state = RobotState::Searching;
    }

    Transition {
        next,
        notify,
        deploy_finished,
    }
}
