//! # Rescue Bot
//!
//! 搜救机器人控制器进程。没有命令行参数：
//!
//! ```bash
//! # 内置演示场景（实时节拍）
//! rescue-bot
//!
//! # 指定仿真场景
//! RESCUE_BOT_SCENARIO=arena.toml rescue-bot
//!
//! # 调整日志级别
//! RUST_LOG=rescue_controller=debug rescue-bot
//! ```
//!
//! 正常结束退出码为 0；驱动轮缺失等启动期错误退出码为 1。

use std::env;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use rescue_controller::{ControllerConfig, ControllerError, run};
use rescue_sim::{Scenario, SimWorld};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// 仿真场景文件路径的环境变量
const SCENARIO_ENV: &str = "RESCUE_BOT_SCENARIO";
/// 未设置 `RUST_LOG` 时的日志过滤
const DEFAULT_LOG_FILTER: &str = "rescue_bot=info,rescue_controller=info,rescue_sim=info";

fn main() -> ExitCode {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    match run_bot() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            let code = e
                .downcast_ref::<ControllerError>()
                .map_or(1, ControllerError::exit_code);
            ExitCode::from(code as u8)
        },
    }
}

fn run_bot() -> Result<()> {
    let scenario = match env::var_os(SCENARIO_ENV) {
        Some(path) => Scenario::load(&path)
            .with_context(|| format!("failed to load scenario from {}", SCENARIO_ENV))?,
        None => Scenario::demo(),
    };
    info!(
        ticks = scenario.total_ticks(),
        realtime = scenario.world.realtime,
        "Scenario loaded"
    );

    let mut world = SimWorld::with_monitor(scenario);
    let stop = world.stop_handle();
    ctrlc::set_handler(move || {
        stop.store(true, Ordering::Relaxed);
    })
    .context("failed to install Ctrl-C handler")?;

    let summary = run(&mut world, ControllerConfig::default(), None)?;

    let pose = world.pose();
    let signals = world.monitor().map_or(0, |m| m.signals_received());
    info!(
        ticks = summary.ticks,
        notifications = summary.notifications_sent,
        signals_received = signals,
        final_state = ?summary.final_state,
        x = pose.x,
        y = pose.y,
        "Run complete"
    );
    Ok(())
}
