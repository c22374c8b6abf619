//! Operator console on stdin/stdout.

use rankdelivery_core::CommandSender;

/// Labels accepted in front of a console command.
const COMMAND_LABELS: &[&str] = &["rd", "/rd", "rankdelivery", "/rankdelivery"];

/// The local operator. Whoever can type into the agent's stdin is trusted.
pub struct ConsoleSender;

impl CommandSender for ConsoleSender {
    fn has_permission(&self, _permission: &str) -> bool {
        true
    }

    fn send_message(&self, message: &str) {
        println!("{}", message);
    }
}

/// Split a console line into subcommand arguments, dropping an optional
/// leading command label. Returns `None` for blank lines.
pub fn parse_line(line: &str) -> Option<Vec<&str>> {
    let mut args: Vec<&str> = line.split_whitespace().collect();
    if args.is_empty() {
        return None;
    }
    if COMMAND_LABELS
        .iter()
        .any(|label| label.eq_ignore_ascii_case(args[0]))
    {
        args.remove(0);
    }
    Some(args)
}
