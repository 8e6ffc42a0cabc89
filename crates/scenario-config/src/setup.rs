//! The setup DSL: a tiny whitespace-separated command language used to seed
//! a fresh `GameState` (initial agent positions, blocks, dispensers, starter
//! tasks, and pre-made attachments).
//!
//! Grammar, one command per line:
//!
//! ```text
//! move <x> <y> <agent>
//! add <x> <y> block|dispenser <type>
//! create task <name> <duration> <x,y,type>[;<x,y,type>]*
//! attach <x1> <y1> <x2> <y2>
//! # a comment line
//! ```
//!
//! A malformed line is logged and skipped -- it never aborts the rest of the
//! setup sequence, matching the "config errors are logged and skipped, not
//! fatal" policy for the rest of configuration handling.

use tracing::warn;

// ---------------------------------------------------------------------------
// SetupCommand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThingKind {
    Block,
    Dispenser,
}

/// A single `(offset_or_absolute_x, y, block_type)` triple as used by both
/// `add` and `create task`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionedType {
    pub x: i32,
    pub y: i32,
    pub block_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupCommand {
    Move { x: i32, y: i32, agent: String },
    Add { x: i32, y: i32, kind: ThingKind, block_type: String },
    CreateTask { name: String, duration: u32, requirements: Vec<PositionedType> },
    Attach { a: (i32, i32), b: (i32, i32) },
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse every line of `setup`, logging and skipping any line that does not
/// match the grammar. Blank lines and `#`-prefixed comments are skipped
/// silently. Returns only the commands that parsed successfully, in order.
pub fn parse_setup(lines: &[String]) -> Vec<SetupCommand> {
    let mut commands = Vec::new();
    for (index, raw_line) in lines.iter().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line) {
            Ok(command) => commands.push(command),
            Err(reason) => warn!(line_number, line, reason, "skipping malformed setup command"),
        }
    }
    commands
}

fn parse_line(line: &str) -> Result<SetupCommand, &'static str> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        ["move", x, y, agent] => Ok(SetupCommand::Move {
            x: parse_int(x)?,
            y: parse_int(y)?,
            agent: (*agent).to_owned(),
        }),
        ["add", x, y, kind, block_type] => Ok(SetupCommand::Add {
            x: parse_int(x)?,
            y: parse_int(y)?,
            kind: parse_kind(kind)?,
            block_type: (*block_type).to_owned(),
        }),
        ["create", "task", name, duration, rest @ ..] if !rest.is_empty() => {
            let requirements = parse_requirements(rest.join(" ").as_str())?;
            if requirements.is_empty() {
                return Err("task requires at least one requirement");
            }
            Ok(SetupCommand::CreateTask {
                name: (*name).to_owned(),
                duration: parse_uint(duration)?,
                requirements,
            })
        }
        ["attach", x1, y1, x2, y2] => Ok(SetupCommand::Attach {
            a: (parse_int(x1)?, parse_int(y1)?),
            b: (parse_int(x2)?, parse_int(y2)?),
        }),
        _ => Err("unrecognized command"),
    }
}

fn parse_kind(token: &str) -> Result<ThingKind, &'static str> {
    match token {
        "block" => Ok(ThingKind::Block),
        "dispenser" => Ok(ThingKind::Dispenser),
        _ => Err("expected 'block' or 'dispenser'"),
    }
}

fn parse_int(token: &str) -> Result<i32, &'static str> {
    token.parse().map_err(|_| "expected an integer")
}

fn parse_uint(token: &str) -> Result<u32, &'static str> {
    token.parse().map_err(|_| "expected a non-negative integer")
}

/// `<x,y,type>[;<x,y,type>]*` -- the requirements list is joined back into
/// one token by the caller since `split_whitespace` would otherwise split on
/// the spaces between requirement triples, if the source line had any.
fn parse_requirements(joined: &str) -> Result<Vec<PositionedType>, &'static str> {
    joined
        .split(';')
        .map(|triple| {
            let parts: Vec<&str> = triple.split(',').collect();
            match parts.as_slice() {
                [x, y, block_type] => Ok(PositionedType {
                    x: parse_int(x)?,
                    y: parse_int(y)?,
                    block_type: (*block_type).to_owned(),
                }),
                _ => Err("expected <x,y,type> triples separated by ';'"),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_move_add_attach() {
        let lines = vec![
            "move 1 2 agentA0".to_owned(),
            "add 3 3 dispenser b0".to_owned(),
            "attach 1 1 1 2".to_owned(),
        ];
        let commands = parse_setup(&lines);
        assert_eq!(
            commands,
            vec![
                SetupCommand::Move { x: 1, y: 2, agent: "agentA0".to_owned() },
                SetupCommand::Add { x: 3, y: 3, kind: ThingKind::Dispenser, block_type: "b0".to_owned() },
                SetupCommand::Attach { a: (1, 1), b: (1, 2) },
            ]
        );
    }

    #[test]
    fn parses_create_task_with_multiple_requirements() {
        let lines = vec!["create task t0 20 0,1,b0;1,1,b1".to_owned()];
        let commands = parse_setup(&lines);
        assert_eq!(
            commands,
            vec![SetupCommand::CreateTask {
                name: "t0".to_owned(),
                duration: 20,
                requirements: vec![
                    PositionedType { x: 0, y: 1, block_type: "b0".to_owned() },
                    PositionedType { x: 1, y: 1, block_type: "b1".to_owned() },
                ],
            }]
        );
    }

    #[test]
    fn comments_and_blank_lines_are_skipped_silently() {
        let lines = vec!["# a comment".to_owned(), "".to_owned(), "   ".to_owned()];
        assert!(parse_setup(&lines).is_empty());
    }

    #[test]
    fn malformed_line_is_skipped_not_fatal() {
        let lines = vec![
            "move not_a_number 2 agentA0".to_owned(),
            "move 1 2 agentA0".to_owned(),
        ];
        let commands = parse_setup(&lines);
        assert_eq!(commands, vec![SetupCommand::Move { x: 1, y: 2, agent: "agentA0".to_owned() }]);
    }

    #[test]
    fn create_task_requires_at_least_one_requirement() {
        let lines = vec!["create task t0 20".to_owned()];
        assert!(parse_setup(&lines).is_empty());
    }

    #[test]
    fn unknown_add_kind_is_skipped() {
        let lines = vec!["add 1 1 blob b0".to_owned()];
        assert!(parse_setup(&lines).is_empty());
    }
}
