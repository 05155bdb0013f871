//! Command parsing and dispatch
//!
//! A line whose first token starts with `.` is a command; anything else is
//! an implicit `.msg` carrying the whole line. Command names are matched
//! case-insensitively against a fixed table.

use tracing::debug;

use crate::error::CommandError;
use crate::message::{self, COMMAND_PREFIX};
use crate::session::SessionContext;
use crate::tokenizer::tokenize;

/// Name of the implicit command for plain chat lines
pub const MESSAGE_COMMAND: &str = ".msg";

/// A line split into command name and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub name: String,
    pub args: Vec<String>,
}

/// Split a line into command name and arguments
pub fn parse(line: &str) -> Result<ParsedLine, CommandError> {
    let mut tokens = tokenize(line);
    let Some(first) = tokens.next() else {
        return Err(CommandError::NoInput);
    };

    if !first.starts_with(COMMAND_PREFIX) {
        return Ok(ParsedLine {
            name: MESSAGE_COMMAND.to_string(),
            args: vec![line.to_string()],
        });
    }

    Ok(ParsedLine {
        name: first.to_string(),
        args: tokens.map(str::to_string).collect(),
    })
}

/// Actions a line can invoke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Broadcast a message tagged with the sender's name
    Message,
    /// Leave the room
    Quit,
    /// Remove every session with one of the given names
    Kick,
    /// Private message to the named sessions
    DirectMessage,
}

const COMMAND_TABLE: [(&str, Command); 4] = [
    (MESSAGE_COMMAND, Command::Message),
    (".quit", Command::Quit),
    (".kick", Command::Kick),
    (".dm", Command::DirectMessage),
];

impl Command {
    /// Look up a command name, ignoring case
    pub fn resolve(name: &str) -> Result<Self, CommandError> {
        let lowered = name.to_lowercase();
        COMMAND_TABLE
            .iter()
            .find(|(known, _)| *known == lowered)
            .map(|(_, command)| *command)
            .ok_or_else(|| CommandError::UnknownCommand(name.to_string()))
    }

    /// Run the action on behalf of `session`
    pub async fn invoke(
        self,
        session: &SessionContext,
        args: Vec<String>,
    ) -> Result<(), CommandError> {
        match self {
            Command::Message => say(session, args),
            Command::Quit => quit(session).await,
            Command::Kick => kick(session, args).await,
            Command::DirectMessage => direct_message(session, args).await,
        }
    }
}

/// Parse, resolve and run one input line
pub async fn execute(session: &SessionContext, line: &str) -> Result<(), CommandError> {
    let parsed = parse(line)?;
    let command = Command::resolve(&parsed.name)?;
    debug!(
        "{} invoked {:?} with {} args",
        session.id(),
        command,
        parsed.args.len()
    );
    command.invoke(session, parsed.args).await
}

fn say(session: &SessionContext, args: Vec<String>) -> Result<(), CommandError> {
    session.send_inbound(message::label(session.name()))?;
    for arg in args {
        session.send_inbound(arg)?;
    }
    session.send_inbound(message::TERMINATOR)?;
    Ok(())
}

async fn quit(session: &SessionContext) -> Result<(), CommandError> {
    session.room().leave(session.id()).await?;
    Ok(())
}

async fn kick(session: &SessionContext, targets: Vec<String>) -> Result<(), CommandError> {
    if targets.is_empty() {
        return Ok(());
    }
    session.room().kick(targets).await?;
    Ok(())
}

/// Last argument is the body, everything before it names a target
async fn direct_message(
    session: &SessionContext,
    mut args: Vec<String>,
) -> Result<(), CommandError> {
    let body = match args.pop() {
        Some(body) if !args.is_empty() => body,
        _ => return Ok(()),
    };
    session
        .room()
        .direct_message(session.name().to_string(), args, body)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::{RoomEvent, RoomHandle};
    use crate::types::SessionId;
    use tokio::sync::mpsc;

    fn parsed(name: &str, args: &[&str]) -> ParsedLine {
        ParsedLine {
            name: name.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn context() -> (
        SessionContext,
        mpsc::UnboundedReceiver<String>,
        mpsc::Receiver<RoomEvent>,
    ) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::channel(16);
        let context = SessionContext::new(
            SessionId::new(),
            "alice".to_string(),
            inbound_tx,
            RoomHandle::new(events_tx),
        );
        (context, inbound_rx, events_rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<String> {
        let mut fragments = Vec::new();
        while let Ok(fragment) = rx.try_recv() {
            fragments.push(fragment);
        }
        fragments
    }

    #[test]
    fn test_parse_command_without_args() {
        assert_eq!(parse(".quit").unwrap(), parsed(".quit", &[]));
    }

    #[test]
    fn test_parse_plain_line_is_message() {
        assert_eq!(parse("hello world").unwrap(), parsed(".msg", &["hello world"]));
        // The whole input line is kept verbatim, quotes and spacing included
        assert_eq!(
            parse("  \"hi\"  there ").unwrap(),
            parsed(".msg", &["  \"hi\"  there "])
        );
    }

    #[test]
    fn test_parse_command_with_args() {
        assert_eq!(
            parse(".dm bob \"see you\"").unwrap(),
            parsed(".dm", &["bob", "see you"])
        );
    }

    #[test]
    fn test_parse_empty_line() {
        assert!(matches!(parse(""), Err(CommandError::NoInput)));
        assert!(matches!(parse(" \t "), Err(CommandError::NoInput)));
    }

    #[test]
    fn test_resolve_ignores_case() {
        assert_eq!(Command::resolve(".QUIT").unwrap(), Command::Quit);
        assert_eq!(Command::resolve(".Dm").unwrap(), Command::DirectMessage);
        assert_eq!(Command::resolve(".msg").unwrap(), Command::Message);
        assert_eq!(Command::resolve(".kick").unwrap(), Command::Kick);
    }

    #[test]
    fn test_resolve_unknown() {
        let parsed = parse(".bogus x").unwrap();
        match Command::resolve(&parsed.name) {
            Err(CommandError::UnknownCommand(name)) => assert_eq!(name, ".bogus"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_plain_line() {
        let (context, mut inbound, _events) = context();
        execute(&context, "hi there").await.unwrap();
        assert_eq!(drain(&mut inbound), vec!["alice: ", "hi there", "\n"]);
    }

    #[tokio::test]
    async fn test_execute_msg_concatenates_args() {
        let (context, mut inbound, _events) = context();
        execute(&context, ".MSG one \"two three\"").await.unwrap();
        assert_eq!(
            drain(&mut inbound),
            vec!["alice: ", "one", "two three", "\n"]
        );
    }

    #[tokio::test]
    async fn test_execute_direct_message() {
        let (context, _inbound, mut events) = context();
        execute(&context, ".dm bob carol hey").await.unwrap();
        match events.try_recv() {
            Ok(RoomEvent::DirectMessage { from, targets, body }) => {
                assert_eq!(from, "alice");
                assert_eq!(targets, vec!["bob", "carol"]);
                assert_eq!(body, "hey");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_direct_message_needs_two_args() {
        let (context, mut inbound, mut events) = context();
        execute(&context, ".dm bob").await.unwrap();
        execute(&context, ".dm").await.unwrap();
        assert!(events.try_recv().is_err());
        assert!(drain(&mut inbound).is_empty());
    }

    #[tokio::test]
    async fn test_execute_quit_and_kick() {
        let (context, _inbound, mut events) = context();
        execute(&context, ".quit").await.unwrap();
        execute(&context, ".kick bob \"mr smith\"").await.unwrap();
        execute(&context, ".kick").await.unwrap();

        match events.try_recv() {
            Ok(RoomEvent::Leave { session_id }) => assert_eq!(session_id, context.id()),
            other => panic!("unexpected: {:?}", other),
        }
        match events.try_recv() {
            Ok(RoomEvent::Kick { targets }) => assert_eq!(targets, vec!["bob", "mr smith"]),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_execute_rejects_bad_lines() {
        let (context, mut inbound, mut events) = context();
        assert!(matches!(
            execute(&context, ".bogus x").await,
            Err(CommandError::UnknownCommand(_))
        ));
        assert!(matches!(execute(&context, "").await, Err(CommandError::NoInput)));
        assert!(drain(&mut inbound).is_empty());
        assert!(events.try_recv().is_err());
    }
}
