//! Command parsing for the subscriber control room.
//!
//! The grammar is a fixed set of whole-line, case-insensitive commands,
//! matched most-specific first. This table is the single source of
//! truth; the help text in [`crate::formatting`] mirrors it.
//!
//! | pattern           | meaning                                   |
//! |-------------------|-------------------------------------------|
//! | `help`            | show command list                         |
//! | `rooms`           | list active watched rooms with aliases    |
//! | `summary all`     | summarize every active watched room       |
//! | `summary <alias>` | summarize one room by alias               |
//! | `todo all`        | list pending tasks across all rooms       |
//! | `todo <alias>`    | list pending tasks for one room           |

/// A parsed control-room command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Rooms,
    SummaryAll,
    SummaryRoom(String),
    TodoAll,
    TodoRoom(String),
}

/// First tokens that mark a message as an attempted command. Unmatched
/// input starting with one of these earns a guidance reply; anything
/// else is ordinary conversation and is ignored.
const COMMAND_KEYWORDS: &[&str] = &["help", "rooms", "room", "summary", "todo", "task", "tasks"];

/// Parse a whole message into a command.
///
/// Returns `None` for anything outside the grammar, including bare
/// `summary`/`todo` and commands with trailing tokens.
pub fn parse(input: &str) -> Option<Command> {
    let tokens: Vec<&str> = input.split_whitespace().collect();

    match tokens.as_slice() {
        [word] if word.eq_ignore_ascii_case("help") => Some(Command::Help),
        [word] if word.eq_ignore_ascii_case("rooms") => Some(Command::Rooms),
        [first, target] if first.eq_ignore_ascii_case("summary") => {
            if target.eq_ignore_ascii_case("all") {
                Some(Command::SummaryAll)
            } else {
                Some(Command::SummaryRoom((*target).to_string()))
            }
        }
        [first, target] if first.eq_ignore_ascii_case("todo") => {
            if target.eq_ignore_ascii_case("all") {
                Some(Command::TodoAll)
            } else {
                Some(Command::TodoRoom((*target).to_string()))
            }
        }
        _ => None,
    }
}

/// Whether an unparsed message looks like a command attempt.
pub fn looks_like_command(input: &str) -> bool {
    input
        .split_whitespace()
        .next()
        .map(|first| {
            COMMAND_KEYWORDS
                .iter()
                .any(|keyword| first.eq_ignore_ascii_case(keyword))
        })
        .unwrap_or(false)
}
