use clap::Subcommand;
use studyflow_core::{Config, Event, Technique, TimerRuntime};

use super::{open_tracker, print_json, CmdResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Mark the timer as running (use `run` to drive it)
    Start,
    /// Start the timer and drive it in the foreground until it stops
    Run,
    /// Pause the timer
    Pause,
    /// Reset to an idle focus phase
    Reset,
    /// Jump to a break (only while stopped)
    SkipBreak,
    /// Print current timer state as JSON
    Status,
    /// Set the focus duration in minutes (1-60)
    Focus { minutes: u32 },
    /// Set the break duration in minutes (1-30)
    Break { minutes: u32 },
    /// Set the number of sessions per cycle (1-10)
    Target { sessions: u32 },
    /// Select a technique: pomodoro, 52-17 or custom
    Technique { technique: Technique },
}

pub fn run(action: TimerAction) -> CmdResult {
    let config = Config::load_or_default();
    let mut tracker = open_tracker(&config)?;

    match action {
        TimerAction::Start => {
            tracker.start_timer();
        }
        TimerAction::Run => return run_foreground(tracker, &config),
        TimerAction::Pause => {
            tracker.pause_timer();
        }
        TimerAction::Reset => {
            tracker.reset_timer();
        }
        TimerAction::SkipBreak => {
            tracker.skip_to_break();
        }
        TimerAction::Status => {}
        TimerAction::Focus { minutes } => tracker.update_focus_time(minutes),
        TimerAction::Break { minutes } => tracker.update_break_time(minutes),
        TimerAction::Target { sessions } => tracker.update_target_sessions(sessions),
        TimerAction::Technique { technique } => tracker.set_timer_technique(technique),
    }

    print_json(&tracker.timer_snapshot())
}

/// Tick until the timer returns to idle, printing each event as a JSON line.
fn run_foreground(mut tracker: studyflow_core::StudyTracker, config: &Config) -> CmdResult {
    tracker.subscribe(|event: &Event| {
        println!("{}", serde_json::to_string(event)?);
        Ok(())
    });

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    rt.block_on(async {
        let runtime = TimerRuntime::new(tracker, config);
        let poll = runtime.spawn_rollover_poll();
        runtime.start().await;
        runtime.wait_idle().await;
        runtime.shutdown().await;
        poll.abort();

        let tracker = runtime.tracker();
        let snapshot = tracker.lock().await.timer_snapshot();
        print_json(&snapshot)
    })
}
