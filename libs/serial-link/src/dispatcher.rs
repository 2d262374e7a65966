//! Header to handler table
//!
//! Each known header maps to a decoder that validates the arguments and builds a
//! [`Command`]. Headers match exactly and case-sensitively. New headers are new
//! entries in this table; a countdown speed header is expected to be the next one.

use std::collections::HashMap;

use tracing::{debug, error, info};

use crate::command::{Command, ProtocolError, RiverActuator, RiverState};
use crate::protocol::Message;

/// Validates a message's arguments and builds its command
pub type Decoder = fn(&Message) -> Result<Command, ProtocolError>;

pub const RIVER_HEADER: &str = "river";

fn expect_arity(msg: &Message, expected: usize) -> Result<(), ProtocolError> {
    if msg.arguments.len() != expected {
        return Err(ProtocolError::ArgumentCount {
            header: msg.header.clone(),
            expected,
            got: msg.arguments.len(),
        });
    }
    Ok(())
}

/// `river <0|1>`. The argument is matched as text, so `01` or ` 1` are rejected.
fn decode_river(msg: &Message) -> Result<Command, ProtocolError> {
    expect_arity(msg, 1)?;

    match msg.arguments[0].as_str() {
        "0" => Ok(Command::River(RiverState::Dry)),
        "1" => Ok(Command::River(RiverState::Wet)),
        other => Err(ProtocolError::UnknownArgument {
            header: msg.header.clone(),
            value: other.to_string(),
        }),
    }
}

/// Maps message headers to decoders and applies the resulting commands
#[derive(Debug, Clone)]
pub struct Dispatcher {
    handlers: HashMap<&'static str, Decoder>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        let mut dispatcher = Self::empty();
        dispatcher.register(RIVER_HEADER, decode_river);
        dispatcher
    }
}

impl Dispatcher {
    /// Dispatcher with no known header
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Add or replace the decoder for `header`
    pub fn register(&mut self, header: &'static str, decoder: Decoder) {
        self.handlers.insert(header, decoder);
    }

    /// Decode without side effects
    pub fn decode(&self, msg: &Message) -> Result<Command, ProtocolError> {
        match self.handlers.get(msg.header.as_str()) {
            Some(decoder) => decoder(msg),
            None => Err(ProtocolError::UnknownHeader(msg.line())),
        }
    }

    /// Decode `msg` and apply it. A rejected message is logged and leaves the
    /// actuator untouched.
    pub fn dispatch(
        &self,
        msg: &Message,
        river: &mut dyn RiverActuator,
    ) -> Result<Command, ProtocolError> {
        match self.decode(msg) {
            Ok(command) => {
                debug!("Dispatch: {:?}", command);
                command.apply(river);
                Ok(command)
            },
            Err(e @ ProtocolError::UnknownHeader(_)) => {
                info!("{}", e);
                Err(e)
            },
            Err(e) => {
                error!("{}", e);
                Err(e)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Color;
    use tracing_test::traced_test;

    #[derive(Debug, Default)]
    struct RecordingRiver {
        simulated: Option<bool>,
        color: Option<Color>,
    }

    impl RiverActuator for RecordingRiver {
        fn set_simulated(&mut self, simulated: bool) {
            self.simulated = Some(simulated);
        }

        fn set_color(&mut self, color: Color) {
            self.color = Some(color);
        }
    }

    fn dispatch(line: &str) -> (Result<Command, ProtocolError>, RecordingRiver) {
        let mut river = RecordingRiver::default();
        let result = Dispatcher::default().dispatch(&Message::parse(line), &mut river);
        (result, river)
    }

    #[test]
    fn test_river_wet() {
        let (result, river) = dispatch("river 1");
        assert_eq!(result, Ok(Command::River(RiverState::Wet)));
        assert_eq!(river.simulated, Some(true));
        assert_eq!(river.color, Some(Color::RIVER_WET));
    }

    #[test]
    fn test_river_dry() {
        let (result, river) = dispatch("river 0");
        assert_eq!(result, Ok(Command::River(RiverState::Dry)));
        assert_eq!(river.simulated, Some(false));
        assert_eq!(river.color, Some(Color::RIVER_DRY));
    }

    #[traced_test]
    #[test]
    fn test_river_argument_count() {
        for line in ["river", "river 1 0", "river  1"] {
            let (result, river) = dispatch(line);
            assert!(matches!(
                result,
                Err(ProtocolError::ArgumentCount { expected: 1, .. })
            ));
            assert!(river.simulated.is_none());
            assert!(river.color.is_none());
        }
        assert!(logs_contain("Expected 1 argument for \"river\", got 0"));
        assert!(logs_contain("Expected 1 argument for \"river\", got 2"));
    }

    #[traced_test]
    #[test]
    fn test_river_unknown_argument() {
        for line in ["river x", "river 2", "river 01", "river true"] {
            let (result, river) = dispatch(line);
            assert!(matches!(result, Err(ProtocolError::UnknownArgument { .. })));
            assert!(river.simulated.is_none());
        }
        assert!(logs_contain("Unknown argument for \"river\" : x"));
    }

    #[traced_test]
    #[test]
    fn test_unknown_header_logged_with_line() {
        let (result, river) = dispatch("foo bar baz");
        assert_eq!(
            result,
            Err(ProtocolError::UnknownHeader("foo bar baz".to_string()))
        );
        assert!(river.simulated.is_none());
        assert!(logs_contain("Unknown message: foo bar baz"));
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let (result, _) = dispatch("River 1");
        assert!(matches!(result, Err(ProtocolError::UnknownHeader(_))));
    }

    #[test]
    fn test_register_extends_table() {
        fn decode_flood(_: &Message) -> Result<Command, ProtocolError> {
            Ok(Command::River(RiverState::Wet))
        }

        let mut dispatcher = Dispatcher::empty();
        dispatcher.register("flood", decode_flood);

        let mut river = RecordingRiver::default();
        let result = dispatcher.dispatch(&Message::parse("flood"), &mut river);
        assert_eq!(result, Ok(Command::River(RiverState::Wet)));
        assert!(dispatcher
            .decode(&Message::parse("river 1"))
            .is_err());
    }
}
