//! Top-level operator commands read by the controller.

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    New,
    Status,
    Help,
    Quit,
    /// Select a unit (1-based); the directive may follow on the same line.
    Select {
        unit: usize,
        directive: Option<String>,
    },
    Unrecognized(String),
}

impl Command {
    /// Split one input line into commands, one per token.
    ///
    /// A unit number takes the rest of the line as its inline directive.
    pub fn parse_line(line: &str) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut rest = line.trim();
        while !rest.is_empty() {
            let (head, tail) = match rest.split_once(char::is_whitespace) {
                Some((head, tail)) => (head, tail.trim_start()),
                None => (rest, ""),
            };
            let command = match head {
                "n" => Command::New,
                "s" => Command::Status,
                "h" => Command::Help,
                "q" => Command::Quit,
                _ => match head.parse::<usize>() {
                    Ok(unit) => {
                        commands.push(Command::Select {
                            unit,
                            directive: (!tail.is_empty()).then(|| tail.to_string()),
                        });
                        break;
                    }
                    Err(_) => Command::Unrecognized(head.to_string()),
                },
            };
            commands.push(command);
            rest = tail;
        }
        commands
    }
}

pub const HELP_TEXT: &str = "\
INFO: Common commands:
1) n -- add new unit
2) s -- number of active units
3) N (ex. \"1\") -- enter a command for unit N
4) q -- quit the program
Unit directives:
1) u -- unit starts going up on N steps
2) d -- unit starts going down on N steps
3) l -- unit starts going left on N steps
4) r -- unit starts going right on N steps
5) p -- get unit's position
6) k -- destroy a unit";
