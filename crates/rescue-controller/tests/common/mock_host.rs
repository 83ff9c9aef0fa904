//! Mock 宿主
//!
//! 用于测试的脚本化宿主：每次 `step()` 取出一帧输入，脚本耗尽后返回 `Stop`。

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rescue_controller::{
    Accelerometer, DeviceError, DistanceSensor, Emitter, Led, Motor, RecognizedObject, RobotHost,
    StepOutcome,
};

/// 单个 tick 的模拟输入
#[derive(Debug, Clone)]
pub struct MockInputs {
    pub front: f64,
    pub left: f64,
    pub right: f64,
    pub front_objects: Vec<&'static str>,
    pub left_objects: Vec<&'static str>,
    pub right_objects: Vec<&'static str>,
    pub accel: [f64; 3],
}

impl Default for MockInputs {
    fn default() -> Self {
        Self {
            front: 2.0,
            left: 2.0,
            right: 2.0,
            front_objects: Vec::new(),
            left_objects: Vec::new(),
            right_objects: Vec::new(),
            accel: [0.0, 0.0, 9.81],
        }
    }
}

/// 模拟硬件状态
#[derive(Debug, Default)]
pub struct MockHardwareState {
    pub inputs: MockInputs,
    pub left_velocity: Vec<f64>,
    pub right_velocity: Vec<f64>,
    pub velocity_mode: bool,
    pub left_led: bool,
    pub right_led: bool,
    pub led_history: Vec<(bool, bool)>,
    pub emitter_channel: Option<i32>,
    pub sent: Vec<Vec<u8>>,
    pub cleaned_up: bool,
}

/// 哪些设备存在
#[derive(Debug, Clone, Copy)]
pub struct Presence {
    pub left_motor: bool,
    pub right_motor: bool,
    pub sensors: [bool; 3],
    pub accelerometer: bool,
    pub emitter: bool,
    pub leds: bool,
}

impl Default for Presence {
    fn default() -> Self {
        Self {
            left_motor: true,
            right_motor: true,
            sensors: [true; 3],
            accelerometer: true,
            emitter: true,
            leds: true,
        }
    }
}

pub struct MockHost {
    state: Rc<RefCell<MockHardwareState>>,
    presence: Presence,
    script: VecDeque<MockInputs>,
}

impl MockHost {
    pub fn new(script: impl IntoIterator<Item = MockInputs>) -> Self {
        Self::with_presence(script, Presence::default())
    }

    pub fn with_presence(script: impl IntoIterator<Item = MockInputs>, presence: Presence) -> Self {
        Self {
            state: Rc::new(RefCell::new(MockHardwareState::default())),
            presence,
            script: script.into_iter().collect(),
        }
    }

    pub fn state(&self) -> Rc<RefCell<MockHardwareState>> {
        Rc::clone(&self.state)
    }
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

struct MockMotor {
    side: Side,
    state: Rc<RefCell<MockHardwareState>>,
}

impl Motor for MockMotor {
    fn set_position(&mut self, position: f64) {
        self.state.borrow_mut().velocity_mode = position.is_infinite();
    }

    fn set_velocity(&mut self, velocity: f64) {
        let mut state = self.state.borrow_mut();
        match self.side {
            Side::Left => state.left_velocity.push(velocity),
            Side::Right => state.right_velocity.push(velocity),
        }
    }
}

struct MockSensor {
    index: usize,
    state: Rc<RefCell<MockHardwareState>>,
}

impl DistanceSensor for MockSensor {
    fn enable(&mut self, _sampling_period_ms: u32) {}

    fn enable_recognition(&mut self, _sampling_period_ms: u32) -> Result<(), DeviceError> {
        Ok(())
    }

    fn value(&self) -> f64 {
        let state = self.state.borrow();
        match self.index {
            0 => state.inputs.front,
            1 => state.inputs.left,
            _ => state.inputs.right,
        }
    }

    fn recognized_objects(&self) -> Vec<RecognizedObject> {
        let state = self.state.borrow();
        let names = match self.index {
            0 => &state.inputs.front_objects,
            1 => &state.inputs.left_objects,
            _ => &state.inputs.right_objects,
        };
        names.iter().map(|n| RecognizedObject::named(*n)).collect()
    }
}

struct MockAccelerometer {
    state: Rc<RefCell<MockHardwareState>>,
}

impl Accelerometer for MockAccelerometer {
    fn enable(&mut self, _sampling_period_ms: u32) {}

    fn values(&self) -> [f64; 3] {
        self.state.borrow().inputs.accel
    }
}

struct MockEmitter {
    state: Rc<RefCell<MockHardwareState>>,
}

impl Emitter for MockEmitter {
    fn set_channel(&mut self, channel: i32) {
        self.state.borrow_mut().emitter_channel = Some(channel);
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), DeviceError> {
        self.state.borrow_mut().sent.push(payload.to_vec());
        Ok(())
    }
}

struct MockLed {
    side: Side,
    state: Rc<RefCell<MockHardwareState>>,
}

impl Led for MockLed {
    fn set(&mut self, on: bool) {
        let mut state = self.state.borrow_mut();
        match self.side {
            Side::Left => state.left_led = on,
            Side::Right => state.right_led = on,
        }
    }
}

impl RobotHost for MockHost {
    fn motor(&mut self, name: &str) -> Option<Box<dyn Motor>> {
        let side = match name {
            "left wheel motor" if self.presence.left_motor => Side::Left,
            "right wheel motor" if self.presence.right_motor => Side::Right,
            _ => return None,
        };
        Some(Box::new(MockMotor {
            side,
            state: self.state(),
        }))
    }

    fn distance_sensor(&mut self, name: &str) -> Option<Box<dyn DistanceSensor>> {
        let index = match name {
            "ds_front" => 0,
            "ds_left" => 1,
            "ds_right" => 2,
            _ => return None,
        };
        if !self.presence.sensors[index] {
            return None;
        }
        Some(Box::new(MockSensor {
            index,
            state: self.state(),
        }))
    }

    fn accelerometer(&mut self, name: &str) -> Option<Box<dyn Accelerometer>> {
        (name == "accelerometer" && self.presence.accelerometer).then(|| {
            Box::new(MockAccelerometer {
                state: self.state(),
            }) as Box<dyn Accelerometer>
        })
    }

    fn emitter(&mut self, name: &str) -> Option<Box<dyn Emitter>> {
        (name == "status_emitter" && self.presence.emitter).then(|| {
            Box::new(MockEmitter {
                state: self.state(),
            }) as Box<dyn Emitter>
        })
    }

    fn led(&mut self, name: &str) -> Option<Box<dyn Led>> {
        if !self.presence.leds {
            return None;
        }
        let side = match name {
            "left_led" => Side::Left,
            "right_led" => Side::Right,
            _ => return None,
        };
        Some(Box::new(MockLed {
            side,
            state: self.state(),
        }))
    }

    fn step(&mut self, _time_step_ms: u32) -> StepOutcome {
        let mut state = self.state.borrow_mut();
        // 记录上一个 tick 结束时的指示灯
        let leds = (state.left_led, state.right_led);
        state.led_history.push(leds);
        match self.script.pop_front() {
            Some(inputs) => {
                state.inputs = inputs;
                StepOutcome::Continue
            },
            None => StepOutcome::Stop,
        }
    }

    fn cleanup(&mut self) {
        self.state.borrow_mut().cleaned_up = true;
    }
}
