//! 监视端（Supervisor）
//!
//! 在仿真器一侧接收机器人的广播，并根据位置历史粗略推断机器人状态。
//! 每个仿真步调用一次 [`SurvivorMonitor::observe`]。

use std::collections::VecDeque;

use crossbeam_channel::Receiver;
use tracing::{info, warn};

use crate::world::Packet;

/// 位置历史长度
pub const POSITION_HISTORY_LENGTH: usize = 5;
/// 低于此速度（m/s）视为停止
pub const VELOCITY_STOPPED_THRESHOLD: f64 = 0.01;
/// 高于此速度（m/s）视为行进
pub const VELOCITY_MOVING_THRESHOLD: f64 = 0.1;

/// 推断出的机器人状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InferredStatus {
    /// 收到了幸存者广播
    DeployingAid,
    Stopped,
    Moving,
    /// 低速或原地转向
    Turning,
}

/// 根据速度与广播推断状态；收到广播优先
pub fn infer_status(velocity: f64, survivor_signal: bool) -> InferredStatus {
    if survivor_signal {
        InferredStatus::DeployingAid
    } else if velocity < VELOCITY_STOPPED_THRESHOLD {
        InferredStatus::Stopped
    } else if velocity > VELOCITY_MOVING_THRESHOLD {
        InferredStatus::Moving
    } else {
        InferredStatus::Turning
    }
}

/// 单步观测结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub time: f64,
    pub position: [f64; 3],
    pub velocity: f64,
    pub survivor_signal: bool,
    pub status: InferredStatus,
}

/// 幸存者广播监视器
pub struct SurvivorMonitor {
    channel: i32,
    message: String,
    rx: Receiver<Packet>,
    history: VecDeque<[f64; 3]>,
    last_time: Option<f64>,
    signals_received: u64,
    last: Option<Observation>,
}

impl SurvivorMonitor {
    pub fn new(rx: Receiver<Packet>, channel: i32, message: impl Into<String>) -> Self {
        Self {
            channel,
            message: message.into(),
            rx,
            history: VecDeque::with_capacity(POSITION_HISTORY_LENGTH),
            last_time: None,
            signals_received: 0,
            last: None,
        }
    }

    pub fn signals_received(&self) -> u64 {
        self.signals_received
    }

    pub fn last_observation(&self) -> Option<Observation> {
        self.last
    }

    /// 处理本步收到的全部广播并更新观测
    pub fn observe(&mut self, time: f64, position: [f64; 3]) -> Observation {
        let survivor_signal = self.drain_packets();

        let velocity = self.estimate_velocity(time, position);
        self.history.push_back(position);
        if self.history.len() > POSITION_HISTORY_LENGTH {
            self.history.pop_front();
        }
        self.last_time = Some(time);

        let observation = Observation {
            time,
            position,
            velocity,
            survivor_signal,
            status: infer_status(velocity, survivor_signal),
        };
        self.last = Some(observation);
        observation
    }

    /// 相对上一次观测的平均速度
    pub fn estimate_velocity(&self, time: f64, position: [f64; 3]) -> f64 {
        let (Some(prev), Some(last_time)) = (self.history.back(), self.last_time) else {
            return 0.0;
        };
        let dt = time - last_time;
        if dt <= 0.0 {
            return 0.0;
        }
        let distance = prev
            .iter()
            .zip(position.iter())
            .map(|(p, c)| (c - p).powi(2))
            .sum::<f64>()
            .sqrt();
        distance / dt
    }

    fn drain_packets(&mut self) -> bool {
        let mut signal = false;
        while let Ok(packet) = self.rx.try_recv() {
            if packet.channel != self.channel {
                continue;
            }
            let text = match std::str::from_utf8(&packet.payload) {
                Ok(text) => text.trim_end_matches('\0'),
                Err(e) => {
                    warn!("Supervisor receiver: cannot decode packet: {}", e);
                    continue;
                },
            };
            info!("Supervisor receiver: received '{}'", text);
            if text == self.message {
                signal = true;
                self.signals_received += 1;
            }
        }
        signal
    }
}
