//! Woodcutting session against a simulated host.
//!
//! A dedicated "game" thread owns the world and calls `on_tick` every
//! `TICK` (a scaled-down 600ms game tick). Task logic runs on tokio and only
//! touches the world through the tick bridge.
//!
//! Plan:
//! ```text
//! 0 init   ─► check login and skill level
//! 1 walk   ─► step toward the trees, re-run until close
//! 2 chop   ─► tick-resident; a log every other tick
//!              ├─ inventory full  ─► 3 bank
//!              └─ target reached  ─► 4 finish
//! 3 bank   ─► walk to the bank, deposit, back to 1
//! 4 finish ─► report and stop
//! ```
//!
//! Run with: `cargo run --example woodcutting --features logging`

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use tickvisor::logger::{LoggerConfig, init_logger};
use tickvisor::subscribers::LogWriter;
use tickvisor::{
    Config, Host, Orchestrator, Runner, RunnerState, Subscribe, Task, TaskContext, TaskError,
    TaskFn, TaskOutcome, TickContext, TickLogic, TickResident,
};
use tokio::runtime::Handle;
use tracing::{info, warn};

const TICK: Duration = Duration::from_millis(30);
const MAX_TICKS: u64 = 2_000;

const VARP_LOGGED_IN: u32 = 1;
const VARBIT_WOODCUTTING_XP: u32 = 1173;
const BANK_WIDGET: (u32, u32) = (12, 1);

const TREE_AT: i32 = 12;
const BANK_AT: i32 = 0;
const INVENTORY_SIZE: u32 = 6;
const XP_PER_LOG: i32 = 25;
const TARGET_LEVEL: i32 = 5;

/// Simulated game state; lives on the game thread.
#[derive(Debug, Default)]
struct World {
    player: i32,
    logs: u32,
    banked: u32,
    xp: i32,
}

impl World {
    fn level(&self) -> i32 {
        1 + self.xp / 100
    }

    fn walk_toward(&mut self, target: i32, stride: i32) {
        let step = (target - self.player).clamp(-stride, stride);
        self.player += step;
    }
}

impl Host for World {
    type Widget = u32;

    fn varbit(&self, id: u32) -> i32 {
        match id {
            VARBIT_WOODCUTTING_XP => self.xp,
            _ => 0,
        }
    }

    fn varp(&self, id: u32) -> i32 {
        i32::from(id == VARP_LOGGED_IN)
    }

    fn widget(&self, group: u32, child: u32) -> Option<u32> {
        ((group, child) == BANK_WIDGET && self.player == BANK_AT).then_some((group << 16) | child)
    }
}

fn init() -> impl Task<World> {
    TaskFn::new("init", |ctx: TaskContext<World>| async move {
        if ctx.read_varp(VARP_LOGGED_IN).await? != 1 {
            return Err(TaskError::fatal("not logged in"));
        }
        let xp = ctx.read_varbit(VARBIT_WOODCUTTING_XP).await?;
        info!(xp, "session initialized");
        Ok(TaskOutcome::Next(ctx.current_index() + 1))
    })
}

struct WalkToTrees {
    attempts: u32,
}

#[async_trait]
impl Task<World> for WalkToTrees {
    fn name(&self) -> &str {
        "walk-to-trees"
    }

    async fn execute(&mut self, ctx: &TaskContext<World>) -> Result<TaskOutcome, TaskError> {
        let player = ctx.run_on_tick(|w: &mut World| w.player).await?;
        if (TREE_AT - player).abs() <= 1 {
            self.attempts = 0;
            info!(player, "reached the trees");
            return Ok(TaskOutcome::Next(2));
        }

        self.attempts += 1;
        if self.attempts > 5 {
            return Err(TaskError::fail("could not reach the trees"));
        }
        ctx.run_on_tick(|w: &mut World| w.walk_toward(TREE_AT, 4)).await?;
        ctx.delay(TICK * 2).await;
        Ok(TaskOutcome::Next(ctx.current_index()))
    }
}

struct Chop {
    session_logs: u32,
}

#[async_trait]
impl TickLogic<World> for Chop {
    fn name(&self) -> &str {
        "chop"
    }

    async fn on_start(&mut self, ctx: &TaskContext<World>) -> Result<(), TaskError> {
        let logs = ctx.run_on_tick(|w: &mut World| w.logs).await?;
        info!(logs, "starting woodcutting");
        Ok(())
    }

    fn on_tick(&mut self, world: &mut World, tick: &TickContext) -> Result<bool, TaskError> {
        if world.level() >= TARGET_LEVEL {
            info!(level = world.level(), "target level reached");
            tick.signal_transition(Some(4));
            return Ok(false);
        }
        if world.logs >= INVENTORY_SIZE {
            info!("inventory full, moving to banking");
            tick.signal_transition(Some(3));
            return Ok(false);
        }
        if tick.task_tick() % 2 == 0 {
            world.logs += 1;
            world.xp += XP_PER_LOG;
            self.session_logs += 1;
            info!(session = self.session_logs, "chopped a log");
        }
        Ok(true)
    }
}

struct Bank {
    attempts: u32,
}

#[async_trait]
impl Task<World> for Bank {
    fn name(&self) -> &str {
        "bank"
    }

    async fn execute(&mut self, ctx: &TaskContext<World>) -> Result<TaskOutcome, TaskError> {
        self.attempts += 1;
        info!(attempt = self.attempts, "banking");

        if ctx.read_widget(BANK_WIDGET.0, BANK_WIDGET.1).await?.is_none() {
            ctx.run_on_tick(|w: &mut World| w.walk_toward(BANK_AT, 6)).await?;
            ctx.delay(TICK * 2).await;
            return Ok(TaskOutcome::Next(ctx.current_index()));
        }

        let deposited = ctx
            .run_on_tick(|w: &mut World| {
                let logs = std::mem::take(&mut w.logs);
                w.banked += logs;
                logs
            })
            .await?;
        info!(deposited, "banking complete, returning to trees");
        self.attempts = 0;
        Ok(TaskOutcome::Next(1))
    }
}

fn finish() -> impl Task<World> {
    TaskFn::new("finish", |ctx: TaskContext<World>| async move {
        let (level, banked, logs) = ctx
            .run_on_tick(|w: &mut World| (w.level(), w.banked, w.logs))
            .await?;
        info!(level, banked, logs, "session complete");
        ctx.stop();
        Ok(TaskOutcome::Next(ctx.current_index()))
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logger(&LoggerConfig::default())?;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let runner = Runner::builder(Config::default())
        .with_task(init())
        .with_task(WalkToTrees { attempts: 0 })
        .with_task(TickResident::new(Chop { session_logs: 0 }))
        .with_task(Bank { attempts: 0 })
        .with_task(finish())
        .with_subscribers(subs)
        .build();

    let orch = Arc::new(Orchestrator::start(runner, &Handle::current()));

    let game = thread::spawn({
        let orch = Arc::clone(&orch);
        move || {
            let mut world = World::default();
            for _ in 0..MAX_TICKS {
                if orch.handle().state() == RunnerState::Stopped {
                    break;
                }
                orch.on_tick(&mut world);
                thread::sleep(TICK);
            }
            if orch.handle().state() != RunnerState::Stopped {
                warn!("tick budget exhausted, shutting down");
                orch.shutdown();
            }
            world
        }
    });

    let summary = orch.join().await;
    let world = game.join().map_err(|_| "game thread panicked")?;
    info!(?summary, banked = world.banked, level = world.level(), "done");
    Ok(())
}
