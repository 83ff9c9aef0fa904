//! Loop Runner - 宿主驱动的控制循环
//!
//! 控制器自身不做调度：每次宿主 `step()` 返回 [`StepOutcome::Continue`] 就执行一个
//! tick，返回 [`StepOutcome::Stop`]（或外部停止标志被置位）时停车、释放设备并退出。
//!
//! ```rust,ignore
//! use rescue_controller::{ControllerConfig, run};
//!
//! let summary = run(&mut host, ControllerConfig::default(), None)?;
//! println!("ran {} ticks", summary.ticks);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::config::ControllerConfig;
use crate::controller::RescueController;
use crate::device::{Devices, RobotHost, StepOutcome};
use crate::error::ControllerError;
use crate::policy::RobotState;

/// 一次运行的汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub notifications_sent: u64,
    pub final_state: RobotState,
}

/// 运行控制循环直到宿主要求退出
///
/// 驱动轮缺失时在第一个 tick 之前返回 [`ControllerError::MissingActuator`]。
pub fn run<H>(
    host: &mut H,
    config: ControllerConfig,
    stop: Option<&AtomicBool>,
) -> Result<RunSummary, ControllerError>
where
    H: RobotHost + ?Sized,
{
    config.validate()?;
    let time_step = config.time_step_ms;
    let devices = Devices::acquire(host, &config)?;
    let mut controller = RescueController::new(devices, config)?;

    info!("Survivor search controller initialized");

    let mut ticks = 0u64;
    while host.step(time_step) == StepOutcome::Continue {
        if stop.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            info!("Stop requested");
            break;
        }
        controller.step();
        ticks += 1;
    }

    controller.halt();
    let summary = RunSummary {
        ticks,
        notifications_sent: controller.notifications_sent(),
        final_state: controller.state(),
    };
    drop(controller);
    host.cleanup();

    info!(
        ticks = summary.ticks,
        notifications = summary.notifications_sent,
        final_state = ?summary.final_state,
        "Controller stopped"
    );
    Ok(summary)
}
