//! Line-oriented driver for the assignment screen.
//!
//! Gifts and events are referenced by their 1-based position in the last
//! printed list.

use std::fmt::Write as _;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use wishlane_shared::{EventId, GiftId};
use wishlane_store::{GiftSource, NewEvent, NewGift};

use crate::controller::{AssignmentController, Selection, TapOutcome};
use crate::notices::{Notice, NoticeKind};

pub const HELP: &str = "\
commands:
  list                     show gifts and events
  add-sample               create a random gift and event
  gift <name>              create a gift
  event <name>             create an event
  tap-gift <n>             select / deselect gift n
  tap-event <n>            assign the selected gift to event n
  drag <gift> <event>      drag gift onto event (drag mode only)
  unassign <n>             clear gift n's event
  rm-gift <n>              delete gift n
  rm-event <n>             delete event n
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    AddSample,
    Gift(String),
    Event(String),
    TapGift(usize),
    TapEvent(usize),
    Drag { gift: usize, event: usize },
    Unassign(usize),
    RemoveGift(usize),
    RemoveEvent(usize),
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let cmd = match verb {
            "" => return Ok(None),
            "list" | "ls" => Command::List,
            "add-sample" => Command::AddSample,
            "gift" => Command::Gift(required_text(rest, "gift")?),
            "event" => Command::Event(required_text(rest, "event")?),
            "tap-gift" => Command::TapGift(position(rest)?),
            "tap-event" => Command::TapEvent(position(rest)?),
            "drag" => {
                let mut parts = rest.split_whitespace();
                let (Some(gift), Some(event), None) = (parts.next(), parts.next(), parts.next())
                else {
                    return Err("usage: drag <gift> <event>".to_string());
                };
                Command::Drag {
                    gift: position(gift)?,
                    event: position(event)?,
                }
            }
            "unassign" => Command::Unassign(position(rest)?),
            "rm-gift" => Command::RemoveGift(position(rest)?),
            "rm-event" => Command::RemoveEvent(position(rest)?),
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command: {other}")),
        };
        Ok(Some(cmd))
    }
}

fn required_text(rest: &str, what: &str) -> std::result::Result<String, String> {
    if rest.is_empty() {
        Err(format!("usage: {what} <name>"))
    } else {
        Ok(rest.to_string())
    }
}

fn position(arg: &str) -> std::result::Result<usize, String> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("expected a list position, got {arg:?}")),
    }
}

/// Render both lists with positions, the armed gift and assignments.
pub fn render(controller: &AssignmentController) -> String {
    let mut out = String::new();
    let armed = controller.selection();

    let _ = writeln!(out, "gifts:");
    for (i, gift) in controller.gifts().iter().enumerate() {
        let marker = if armed == Selection::Armed(gift.id) { '*' } else { ' ' };
        let assigned = controller
            .gift_event(gift.id)
            .map(|e| format!(" -> {}", e.name))
            .unwrap_or_default();
        let _ = writeln!(out, " {marker}{:>3}. {}{assigned}", i + 1, gift.name);
        if let Some(source) = gift.source.as_ref().and_then(GiftSource::summary) {
            let _ = writeln!(out, "        {source}");
        }
    }

    let _ = writeln!(out, "events:");
    for (i, event) in controller.events().iter().enumerate() {
        let _ = writeln!(out, "  {:>3}. {}", i + 1, event.name);
    }
    out
}

fn format_notice(notice: &Notice) -> String {
    match notice.kind {
        NoticeKind::Error => format!("! {}: {}", notice.title, notice.message),
        NoticeKind::Prompt => format!("? {}: {}", notice.title, notice.message),
        NoticeKind::Info => format!("  {}: {}", notice.title, notice.message),
    }
}

fn gift_at(controller: &AssignmentController, n: usize) -> Option<GiftId> {
    controller.gifts().get(n - 1).map(|g| g.id)
}

fn event_at(controller: &AssignmentController, n: usize) -> Option<EventId> {
    controller.events().get(n - 1).map(|e| e.id)
}

/// Read commands from `input` until EOF or `quit`.
pub async fn run<R>(
    controller: &mut AssignmentController,
    input: R,
    mut notices: mpsc::UnboundedReceiver<Notice>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    println!("{HELP}");

    while let Some(line) = lines.next_line().await? {
        let cmd = match Command::parse(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };

        if cmd == Command::Quit {
            break;
        }
        execute(controller, cmd).await;

        while let Ok(notice) = notices.try_recv() {
            println!("{}", format_notice(&notice));
        }
    }
    Ok(())
}

async fn execute(controller: &mut AssignmentController, cmd: Command) {
    // failures are already reported through the notice sink
    match cmd {
        Command::List => print!("{}", render(controller)),
        Command::Help => println!("{HELP}"),
        Command::AddSample => {
            if let Ok((gift, event)) = controller.add_sample().await {
                println!("added {} and {}", gift.name, event.name);
            }
        }
        Command::Gift(name) => {
            let _ = controller.create_gift(NewGift::named(name)).await;
        }
        Command::Event(name) => {
            let _ = controller.create_event(NewEvent::named(name)).await;
        }
        Command::TapGift(n) => match gift_at(controller, n) {
            Some(id) => match controller.tap_gift(id) {
                Selection::Armed(_) => println!("gift {n} selected"),
                Selection::Idle => println!("selection cleared"),
            },
            None => println!("no gift {n}"),
        },
        Command::TapEvent(n) => match event_at(controller, n) {
            Some(id) => {
                if let Ok(TapOutcome::Assigned { .. }) = controller.tap_event(id).await {
                    println!("assigned");
                }
            }
            None => println!("no event {n}"),
        },
        Command::Drag { gift, event } => {
            let (Some(gift_id), Some(event_id)) =
                (gift_at(controller, gift), event_at(controller, event))
            else {
                println!("no such gift or event");
                return;
            };
            match controller.start_drag(gift_id) {
                Some(payload) => {
                    if controller.drop_on_event(payload, event_id).await.is_ok() {
                        println!("assigned");
                    }
                }
                None => println!("drag is not available, use tap-gift / tap-event"),
            }
        }
        Command::Unassign(n) => match gift_at(controller, n) {
            Some(id) => {
                let _ = controller.unassign(id).await;
            }
            None => println!("no gift {n}"),
        },
        Command::RemoveGift(n) => match gift_at(controller, n) {
            Some(id) => {
                let _ = controller.delete_gift(id).await;
            }
            None => println!("no gift {n}"),
        },
        Command::RemoveEvent(n) => match event_at(controller, n) {
            Some(id) => {
                if let Ok(outcome) = controller.delete_event(id).await {
                    if outcome.cleared_gifts > 0 {
                        println!("unassigned {} gift(s)", outcome.cleared_gifts);
                    }
                }
            }
            None => println!("no event {n}"),
        },
        Command::Quit => {}
    }
}
