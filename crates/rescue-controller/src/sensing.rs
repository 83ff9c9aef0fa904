//! 传感器读取与环境分类
//!
//! 纯函数：输入原始读数，输出本 tick 的 [`SensorFrame`]，不修改任何状态。

use crate::config::{ControllerConfig, DeviceNames};
use crate::device::RecognizedObject;

/// 距离传感器安装位置，顺序即扫描顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorPosition {
    Front,
    Left,
    Right,
}

impl SensorPosition {
    pub const ALL: [SensorPosition; 3] = [Self::Front, Self::Left, Self::Right];

    pub const fn index(self) -> usize {
        match self {
            Self::Front => 0,
            Self::Left => 1,
            Self::Right => 2,
        }
    }

    pub fn device_name(self, names: &DeviceNames) -> &str {
        match self {
            Self::Front => &names.front_sensor,
            Self::Left => &names.left_sensor,
            Self::Right => &names.right_sensor,
        }
    }
}

/// 单个距离传感器的原始读数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorReading {
    pub distance: f64,
    pub objects: Vec<RecognizedObject>,
}

/// 本 tick 的原始输入，缺失的设备为 `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReadings {
    /// 按 [`SensorPosition`] 顺序：前、左、右
    pub sensors: [Option<SensorReading>; 3],
    pub acceleration: Option<[f64; 3]>,
}

/// 分类结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorFrame {
    pub front: f64,
    pub left: f64,
    pub right: f64,
    pub tilted: bool,
    pub survivor_detected: bool,
    /// 检测到幸存者的传感器
    pub survivor_sensor: Option<SensorPosition>,
}

impl SensorFrame {
    /// 所有方向空旷、无倾倒、无幸存者
    pub fn clear(config: &ControllerConfig) -> Self {
        Self {
            front: config.no_object_distance,
            left: config.no_object_distance,
            right: config.no_object_distance,
            tilted: false,
            survivor_detected: false,
            survivor_sensor: None,
        }
    }

    pub fn distance(&self, position: SensorPosition) -> f64 {
        match position {
            SensorPosition::Front => self.front,
            SensorPosition::Left => self.left,
            SensorPosition::Right => self.right,
        }
    }
}

/// 名称与目标完全一致才算幸存者
pub fn is_survivor(object: &RecognizedObject, target: &str) -> bool {
    object.name.as_deref() == Some(target)
}

/// X 或 Y 轴绝对值严格大于阈值即为倾倒，Z 轴不参与
pub fn is_tilted(acceleration: [f64; 3], threshold: f64) -> bool {
    acceleration[0].abs() > threshold || acceleration[1].abs() > threshold
}

/// 把原始读数分类成 [`SensorFrame`]
///
/// 按前、左、右的顺序扫描，第一个满足“名称匹配且该传感器距离严格小于检测
/// 距离”的对象即终止扫描；其后的传感器本 tick 不再读取，保持占位距离。
pub fn classify(readings: &RawReadings, config: &ControllerConfig) -> SensorFrame {
    let mut distances = [config.no_object_distance; 3];
    let mut survivor_sensor = None;

    for position in SensorPosition::ALL {
        let Some(reading) = &readings.sensors[position.index()] else {
            continue;
        };
        distances[position.index()] = reading.distance;

        if reading.distance < config.survivor_detection_range
            && reading
                .objects
                .iter()
                .any(|obj| is_survivor(obj, &config.survivor_object_name))
        {
            survivor_sensor = Some(position);
            break;
        }
    }

    let tilted = readings
        .acceleration
        .is_some_and(|a| is_tilted(a, config.tilt_threshold));

    SensorFrame {
        front: distances[SensorPosition::Front.index()],
        left: distances[SensorPosition::Left.index()],
        right: distances[SensorPosition::Right.index()],
        tilted,
        survivor_detected: survivor_sensor.is_some(),
        survivor_sensor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(distance: f64, names: &[&str]) -> Option<SensorReading> {
        Some(SensorReading {
            distance,
            objects: names.iter().map(|n| RecognizedObject::named(*n)).collect(),
        })
    }

    #[test]
    fn test_missing_sensors_read_as_sentinel() {
        let config = ControllerConfig::default();
        let frame = classify(&RawReadings::default(), &config);
        assert_eq!(frame, SensorFrame::clear(&config));
        assert!(frame.front > config.obstacle_distance_threshold);
        assert!(frame.front > config.survivor_detection_range);
    }

    #[test]
    fn test_survivor_range_is_strict() {
        let config = ControllerConfig::default();
        let range = config.survivor_detection_range;

        let at_range = RawReadings {
            sensors: [reading(range, &["SurvivorObstacle"]), None, None],
            acceleration: None,
        };
        assert!(!classify(&at_range, &config).survivor_detected);

        let inside = RawReadings {
            sensors: [reading(range - 0.01, &["SurvivorObstacle"]), None, None],
            acceleration: None,
        };
        let frame = classify(&inside, &config);
        assert!(frame.survivor_detected);
        assert_eq!(frame.survivor_sensor, Some(SensorPosition::Front));
    }

    #[test]
    fn test_identity_must_match_exactly() {
        let config = ControllerConfig::default();
        let readings = RawReadings {
            sensors: [
                reading(0.1, &["survivorobstacle", "SurvivorObstacle2", "Wall"]),
                Some(SensorReading {
                    distance: 0.1,
                    objects: vec![RecognizedObject::default()],
                }),
                None,
            ],
            acceleration: None,
        };
        assert!(!classify(&readings, &config).survivor_detected);
    }

    #[test]
    fn test_scan_order_front_left_right() {
        let config = ControllerConfig::default();
        let readings = RawReadings {
            sensors: [
                reading(0.9, &["SurvivorObstacle"]),
                reading(0.2, &["SurvivorObstacle"]),
                reading(0.1, &["SurvivorObstacle"]),
            ],
            acceleration: None,
        };
        let frame = classify(&readings, &config);
        assert_eq!(frame.survivor_sensor, Some(SensorPosition::Left));
        assert_eq!(frame.front, 0.9);
        assert_eq!(frame.left, 0.2);
        // 短路后右侧不再读取
        assert_eq!(frame.right, config.no_object_distance);
    }

    #[test]
    fn test_tilt_threshold_is_strict() {
        assert!(!is_tilted([3.5, 0.0, 9.81], 3.5));
        assert!(!is_tilted([0.0, -3.5, 9.81], 3.5));
        assert!(is_tilted([3.51, 0.0, 9.81], 3.5));
        assert!(is_tilted([0.0, -3.6, 0.0], 3.5));
        // Z 轴不参与
        assert!(!is_tilted([0.0, 0.0, 100.0], 3.5));
    }

    #[test]
    fn test_missing_accelerometer_never_tilts() {
        let config = ControllerConfig::default();
        let frame = classify(&RawReadings::default(), &config);
        assert!(!frame.tilted);
    }
}
