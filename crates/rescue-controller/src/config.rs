//! 控制器常量与配置
//!
//! 所有参数在编译期固定。[`ControllerConfig`] 只是把这些常量打包成一个值，
//! 便于在测试中注入；进程本身始终使用 [`ControllerConfig::default()`]。

use crate::error::ControllerError;

/// 仿真步长（ms）
pub const TIME_STEP_MS: u32 = 64;

/// 直行速度（rad/s）
pub const FORWARD_SPEED: f64 = 5.0;
/// 原地转向速度（rad/s）
pub const TURN_SPEED: f64 = 4.0;
/// 倒车速度（rad/s），目前没有状态使用
pub const BACKUP_SPEED: f64 = 3.0;

/// 发现幸存者后原地停留的 tick 数
pub const AID_DEPLOY_DURATION: u32 = 50;

/// 前方距离小于此值（m）时进入避障
pub const OBSTACLE_DISTANCE_THRESHOLD: f64 = 0.3;
/// 加速度计 X/Y 轴绝对值超过此值判定为倾倒
pub const TILT_THRESHOLD: f64 = 3.5;
/// 识别到幸存者且距离小于此值（m）才算检测成功
pub const SURVIVOR_DETECTION_RANGE: f64 = 0.4;
/// 传感器缺失时的距离占位值，必须大于上面两个阈值
pub const NO_OBJECT_DISTANCE: f64 = 999.0;

/// 幸存者对象在仿真器中的 `name` 字段
pub const SURVIVOR_OBJECT_NAME: &str = "SurvivorObstacle";
/// 广播发射器设备名
pub const EMITTER_NAME: &str = "status_emitter";
/// 广播信道（必须与监视端接收器一致）
pub const EMITTER_CHANNEL: i32 = 1;
/// 发现幸存者时广播的消息
pub const SURVIVOR_MESSAGE: &str = "SURVIVOR_FOUND";

/// 每隔多少个 tick 输出一次遥测日志
pub const TELEMETRY_INTERVAL: u64 = 8;

pub const LEFT_MOTOR_NAME: &str = "left wheel motor";
pub const RIGHT_MOTOR_NAME: &str = "right wheel motor";
pub const FRONT_SENSOR_NAME: &str = "ds_front";
pub const LEFT_SENSOR_NAME: &str = "ds_left";
pub const RIGHT_SENSOR_NAME: &str = "ds_right";
pub const ACCELEROMETER_NAME: &str = "accelerometer";
pub const LEFT_LED_NAME: &str = "left_led";
pub const RIGHT_LED_NAME: &str = "right_led";

/// 设备逻辑名
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceNames {
    pub left_motor: String,
    pub right_motor: String,
    pub front_sensor: String,
    pub left_sensor: String,
    pub right_sensor: String,
    pub accelerometer: String,
    pub emitter: String,
    pub left_led: String,
    pub right_led: String,
}

impl Default for DeviceNames {
    fn default() -> Self {
        Self {
            left_motor: LEFT_MOTOR_NAME.to_string(),
            right_motor: RIGHT_MOTOR_NAME.to_string(),
            front_sensor: FRONT_SENSOR_NAME.to_string(),
            left_sensor: LEFT_SENSOR_NAME.to_string(),
            right_sensor: RIGHT_SENSOR_NAME.to_string(),
            accelerometer: ACCELEROMETER_NAME.to_string(),
            emitter: EMITTER_NAME.to_string(),
            left_led: LEFT_LED_NAME.to_string(),
            right_led: RIGHT_LED_NAME.to_string(),
        }
    }
}

/// 控制器配置
///
/// 字段与模块顶层常量一一对应，`Default` 即编译期常量集合。
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// 仿真步长（ms）
    pub time_step_ms: u32,
    pub forward_speed: f64,
    pub turn_speed: f64,
    pub backup_speed: f64,
    /// 救援停留时长（tick）
    pub aid_deploy_duration: u32,
    pub obstacle_distance_threshold: f64,
    pub tilt_threshold: f64,
    pub survivor_detection_range: f64,
    /// 传感器缺失时的距离占位值
    pub no_object_distance: f64,
    pub survivor_object_name: String,
    pub emitter_channel: i32,
    pub survivor_message: String,
    pub telemetry_interval: u64,
    pub devices: DeviceNames,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            time_step_ms: TIME_STEP_MS,
            forward_speed: FORWARD_SPEED,
            turn_speed: TURN_SPEED,
            backup_speed: BACKUP_SPEED,
            aid_deploy_duration: AID_DEPLOY_DURATION,
            obstacle_distance_threshold: OBSTACLE_DISTANCE_THRESHOLD,
            tilt_threshold: TILT_THRESHOLD,
            survivor_detection_range: SURVIVOR_DETECTION_RANGE,
            no_object_distance: NO_OBJECT_DISTANCE,
            survivor_object_name: SURVIVOR_OBJECT_NAME.to_string(),
            emitter_channel: EMITTER_CHANNEL,
            survivor_message: SURVIVOR_MESSAGE.to_string(),
            telemetry_interval: TELEMETRY_INTERVAL,
            devices: DeviceNames::default(),
        }
    }
}

impl ControllerConfig {
    /// 校验配置
    ///
    /// 占位距离必须同时大于避障阈值和幸存者检测距离，否则缺失的传感器会触发
    /// 避障或检测逻辑。
    pub fn validate(&self) -> Result<(), ControllerError> {
        if self.time_step_ms == 0 {
            return Err(ControllerError::Config(
                "time_step_ms must be > 0".to_string(),
            ));
        }
        if self.no_object_distance <= self.obstacle_distance_threshold
            || self.no_object_distance <= self.survivor_detection_range
        {
            return Err(ControllerError::Config(format!(
                "no_object_distance {} must exceed obstacle threshold {} and survivor range {}",
                self.no_object_distance,
                self.obstacle_distance_threshold,
                self.survivor_detection_range
            )));
        }
        if self.aid_deploy_duration == 0 {
            return Err(ControllerError::Config(
                "aid_deploy_duration must be > 0".to_string(),
            ));
        }
        if self.telemetry_interval == 0 {
            return Err(ControllerError::Config(
                "telemetry_interval must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// 广播载荷：消息字节加结尾 NUL
    pub fn survivor_payload(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.survivor_message.len() + 1);
        payload.extend_from_slice(self.survivor_message.as_bytes());
        payload.push(0);
        payload
    }
}
