use std::str::FromStr;

use anyhow::{Context, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};

use crate::{
    tasks::commands as task_commands,
    timer::{commands as timer_commands, SessionType, TaskRef, TimerEvent, TimerSnapshot},
    AppState,
};

const DEFAULT_SESSION_LIMIT: usize = 10;

const HELP: &str = "\
commands:
  start [work|break|long] [minutes]   start a session
  pause | resume | toggle             pause or resume the running session
  reset                               abandon the current session
  mode <work|break|long>              choose the idle session type
  select <task-id|none>               attach a task to the next session
  status                              show the timer
  pending                             list tasks that are not done
  tasks                               list every task
  add <title>                         create a task
  done <id> | undo <id>               mark a task completed or pending
  rename <id> <title>                 retitle a task
  rm <id>                             delete a task
  sessions [n]                        recent sessions, newest first
  stats                               task and session totals
  set <work|break|long> <minutes>     change a default duration
  sound [on|off]                      switch the completion sound, toggles without argument
  help                                this text
  quit                                leave";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Start {
        session_type: Option<SessionType>,
        minutes: Option<u64>,
    },
    Pause,
    Resume,
    Toggle,
    Reset,
    Mode(SessionType),
    Select(Option<TaskRef>),
    Status,
    Pending,
    Tasks,
    Add(String),
    Done(i64),
    Undo(i64),
    Rename(i64, String),
    Remove(i64),
    Sessions(usize),
    Stats,
    Set(SessionType, u64),
    Sound(Option<bool>),
    Help,
    Quit,
}

fn parse_id(value: Option<&str>) -> Result<i64, String> {
    let value = value.ok_or_else(|| "missing task id".to_string())?;
    value
        .trim_start_matches('#')
        .parse()
        .map_err(|_| format!("'{value}' is not a task id"))
}

fn parse_minutes(value: &str) -> Result<u64, String> {
    match value.parse::<u64>() {
        Ok(0) => Err("minutes must be greater than zero".to_string()),
        Ok(minutes) => Ok(minutes),
        Err(_) => Err(format!("'{value}' is not a number of minutes")),
    }
}

fn rest_of_line(words: &[&str]) -> Option<String> {
    let text = words.join(" ");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&head, args)) = words.split_first() else {
            return Err("empty command".to_string());
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "start" => {
                let mut session_type = None;
                let mut minutes = None;
                for arg in args {
                    if let Ok(kind) = arg.parse::<SessionType>() {
                        session_type = Some(kind);
                    } else {
                        minutes = Some(parse_minutes(arg)?);
                    }
                }
                ShellCommand::Start {
                    session_type,
                    minutes,
                }
            }
            "pause" => ShellCommand::Pause,
            "resume" => ShellCommand::Resume,
            "toggle" | "space" => ShellCommand::Toggle,
            "reset" | "stop" => ShellCommand::Reset,
            "mode" => {
                let kind = args.first().ok_or("missing session type")?;
                ShellCommand::Mode(kind.parse()?)
            }
            "select" => match args.first() {
                None | Some(&"none") | Some(&"-") => ShellCommand::Select(None),
                Some(&id) => ShellCommand::Select(Some(parse_id(Some(id))?)),
            },
            "status" | "s" => ShellCommand::Status,
            "pending" => ShellCommand::Pending,
            "tasks" | "ls" => ShellCommand::Tasks,
            "add" => ShellCommand::Add(rest_of_line(args).ok_or("missing task title")?),
            "done" => ShellCommand::Done(parse_id(args.first().copied())?),
            "undo" => ShellCommand::Undo(parse_id(args.first().copied())?),
            "rename" => {
                let id = parse_id(args.first().copied())?;
                let title = rest_of_line(args.get(1..).unwrap_or_default())
                    .ok_or("missing task title")?;
                ShellCommand::Rename(id, title)
            }
            "rm" | "delete" => ShellCommand::Remove(parse_id(args.first().copied())?),
            "sessions" | "history" => match args.first() {
                Some(limit) => ShellCommand::Sessions(
                    limit
                        .parse()
                        .map_err(|_| format!("'{limit}' is not a count"))?,
                ),
                None => ShellCommand::Sessions(DEFAULT_SESSION_LIMIT),
            },
            "stats" => ShellCommand::Stats,
            "set" => {
                let kind = args.first().ok_or("missing session type")?.parse()?;
                let minutes = parse_minutes(args.get(1).ok_or("missing minutes")?)?;
                ShellCommand::Set(kind, minutes)
            }
            "sound" => match args.first().copied() {
                None => ShellCommand::Sound(None),
                Some("on") => ShellCommand::Sound(Some(true)),
                Some("off") => ShellCommand::Sound(Some(false)),
                Some(other) => return Err(format!("expected on or off, got '{other}'")),
            },
            "mute" => ShellCommand::Sound(Some(false)),
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => return Err(format!("unknown command '{other}', try `help`")),
        };
        Ok(command)
    }
}

pub fn format_snapshot(snapshot: &TimerSnapshot) -> String {
    let mut line = format!(
        "{} {} {}",
        snapshot.status, snapshot.session_type, snapshot.remaining
    );
    let task = snapshot
        .session
        .as_ref()
        .and_then(|session| session.task_ref)
        .or(snapshot.selected_task);
    if let Some(task_id) = task {
        line.push_str(&format!(" (task #{task_id})"));
    }
    line
}

async fn dispatch(state: &AppState, command: ShellCommand) -> Result<String, String> {
    let output = match command {
        ShellCommand::Start {
            session_type,
            minutes,
        } => format_snapshot(&timer_commands::start_timer(state, session_type, minutes).await?),
        ShellCommand::Pause => format_snapshot(&timer_commands::pause_timer(state).await?),
        ShellCommand::Resume => format_snapshot(&timer_commands::resume_timer(state).await?),
        ShellCommand::Toggle => format_snapshot(&timer_commands::toggle_timer(state).await?),
        ShellCommand::Reset => format_snapshot(&timer_commands::reset_timer(state).await),
        ShellCommand::Mode(kind) => {
            format_snapshot(&timer_commands::switch_session_type(state, kind).await?)
        }
        ShellCommand::Select(task) => {
            format_snapshot(&timer_commands::select_task(state, task).await?)
        }
        ShellCommand::Status => format_snapshot(&timer_commands::get_timer_state(state).await),
        ShellCommand::Pending => {
            let tasks = timer_commands::list_pending_tasks(state).await?;
            if tasks.is_empty() {
                "nothing pending".to_string()
            } else {
                tasks
                    .iter()
                    .map(|task| format!("#{:<4} {}", task.id, task.title))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        ShellCommand::Tasks => {
            let tasks = task_commands::list_tasks(state).await?;
            if tasks.is_empty() {
                "no tasks yet".to_string()
            } else {
                tasks
                    .iter()
                    .map(|task| {
                        let mark = if task.completed { "x" } else { " " };
                        format!("[{mark}] #{:<4} {}", task.id, task.title)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        ShellCommand::Add(title) => {
            let task = task_commands::create_task(state, &title).await?;
            format!("added #{} {}", task.id, task.title)
        }
        ShellCommand::Done(id) => {
            let task = task_commands::set_task_completed(state, id, true).await?;
            format!("done #{} {}", task.id, task.title)
        }
        ShellCommand::Undo(id) => {
            let task = task_commands::set_task_completed(state, id, false).await?;
            format!("reopened #{} {}", task.id, task.title)
        }
        ShellCommand::Rename(id, title) => {
            let task = task_commands::rename_task(state, id, title).await?;
            format!("renamed #{} {}", task.id, task.title)
        }
        ShellCommand::Remove(id) => {
            task_commands::delete_task(state, id).await?;
            format!("deleted #{id}")
        }
        ShellCommand::Sessions(limit) => {
            let sessions = timer_commands::list_sessions(state, limit).await?;
            if sessions.is_empty() {
                "no sessions recorded".to_string()
            } else {
                sessions
                    .iter()
                    .map(|record| {
                        format!(
                            "{} {:<10} {:>3}m {:<9} {}",
                            record.started_at.format("%Y-%m-%d %H:%M"),
                            record.session_type.as_str(),
                            record.duration_secs / 60,
                            record.status.as_str(),
                            record.task_title.as_deref().unwrap_or("-"),
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        ShellCommand::Stats => {
            let stats = task_commands::get_stats(state).await?;
            format!(
                "tasks: {} total, {} done, {} pending ({}%)\n\
                 sessions: {} total, {} completed, {} focus minutes",
                stats.tasks.total,
                stats.tasks.completed,
                stats.tasks.pending,
                stats.tasks.completion_rate,
                stats.sessions.total_sessions,
                stats.sessions.completed_sessions,
                stats.sessions.focus_minutes,
            )
        }
        ShellCommand::Set(kind, minutes) => {
            timer_commands::set_default_duration(state, kind, minutes).await?;
            format!("{kind} sessions now last {minutes} minutes")
        }
        ShellCommand::Sound(enabled) => {
            let enabled = enabled.unwrap_or_else(|| !state.timer.sound_enabled());
            timer_commands::set_sound_enabled(state, enabled).await?;
            format!("sound {}", if enabled { "on" } else { "off" })
        }
        ShellCommand::Help => HELP.to_string(),
        ShellCommand::Quit => String::new(),
    };
    Ok(output)
}

/// Reads commands from stdin until `quit`, EOF or ctrl-c.
pub async fn run_shell(state: &AppState) -> Result<()> {
    let mut events = state.timer.subscribe();
    let show_heartbeats = state.debug_mode;
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(TimerEvent::SessionCompleted { next_type, .. }) => {
                    println!("next up: {next_type}");
                }
                Ok(TimerEvent::CollaboratorUnavailable { operation, message }) => {
                    eprintln!("warning: {operation} failed: {message}");
                }
                Ok(TimerEvent::Heartbeat(snapshot)) => {
                    if show_heartbeats {
                        eprintln!("[{}]", format_snapshot(&snapshot));
                    } else {
                        log::debug!("heartbeat: {}", format_snapshot(&snapshot));
                    }
                }
                Ok(TimerEvent::StateChanged(snapshot)) => {
                    log::debug!("timer now {}", format_snapshot(&snapshot));
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("pomodo ready. Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line.parse::<ShellCommand>() {
                    Ok(ShellCommand::Quit) => break,
                    Ok(command) => match dispatch(state, command).await {
                        Ok(output) => println!("{output}"),
                        Err(err) => println!("error: {err}"),
                    },
                    Err(err) => println!("{err}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    printer.abort();
    Ok(())
}
