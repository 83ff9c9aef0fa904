//! 控制器错误类型定义

use thiserror::Error;

/// 设备层错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// 宿主中不存在该设备
    #[error("Device not found: {0}")]
    NotFound(String),

    /// 距离传感器不支持目标识别
    #[error("Recognition not supported by '{0}'")]
    RecognitionUnsupported(String),

    /// 广播信道已关闭（接收端全部退出）
    #[error("Broadcast channel {0} closed")]
    ChannelClosed(i32),

    /// 发送失败
    #[error("Send failed: {0}")]
    Send(String),
}

/// 控制器错误类型
#[derive(Error, Debug)]
pub enum ControllerError {
    /// 缺少必需的驱动轮电机，无法进入控制循环
    #[error("Missing mandatory actuator '{name}'")]
    MissingActuator { name: String },

    /// 配置非法
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// 设备错误
    #[error("Device error: {0}")]
    Device(#[from] DeviceError),
}

impl ControllerError {
    /// 进程退出码：启动期致命错误均为 1
    pub fn exit_code(&self) -> i32 {
        1
    }
}
