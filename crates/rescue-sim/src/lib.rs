//! # Rescue Sim
//!
//! 搜救控制器的进程内仿真宿主，替代第三方机器人仿真器：
//!
//! - `scenario` - TOML 场景（设备、世界参数、分阶段传感器输入）
//! - `world` - 实现 `RobotHost` 的脚本化世界，含差速位姿积分与广播总线
//! - `monitor` - 监视端：接收幸存者广播，根据位置历史推断机器人状态
//!
//! ```rust,no_run
//! use rescue_controller::{ControllerConfig, run};
//! use rescue_sim::{Scenario, SimWorld};
//!
//! let mut world = SimWorld::with_monitor(Scenario::demo());
//! let summary = run(&mut world, ControllerConfig::default(), None)?;
//! # Ok::<(), rescue_controller::ControllerError>(())
//! ```

pub mod monitor;
pub mod scenario;
pub mod world;

pub use monitor::{InferredStatus, Observation, SurvivorMonitor, infer_status};
pub use scenario::{DeviceFlags, Phase, Scenario, SimError, WorldSettings};
pub use world::{Packet, Pose, SimWorld, TickRecord};
