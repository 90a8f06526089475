//! Relay-local chat commands: parsing, registry, and built-in commands.

use std::collections::HashMap;

/// Context passed to a command handler.
pub struct CommandContext {
    /// Name of the player executing the command.
    pub sender_name: String,
    /// Arguments after the command name.
    pub args: Vec<String>,
}

/// Something the session must do after a command returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    /// Switch the upstream target and connect.
    Connect { host: String, port: u16 },
    /// Retry the current upstream target.
    Reconnect,
    EnableExtension(String),
    DisableExtension(String),
}

/// Result returned by a command handler.
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command executed successfully.
    pub success: bool,
    /// Messages to send back to the command sender.
    pub messages: Vec<String>,
    pub action: Option<CommandAction>,
}

impl CommandResult {
    /// Create a successful result with a single message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: vec![message.into()],
            action: None,
        }
    }

    /// Create a failed result with a single message.
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
            action: None,
        }
    }

    pub fn with_action(mut self, action: CommandAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Function pointer type for command handlers.
pub type CommandFn = fn(&CommandContext) -> CommandResult;

/// A registered command.
pub struct CommandEntry {
    pub name: String,
    pub description: String,
    pub handler: CommandFn,
}

/// Split a chat line into command name and arguments.
///
/// Returns `None` unless the line starts with `prefix` followed by a name.
pub fn parse_command_line(line: &str, prefix: &str) -> Option<(String, Vec<String>)> {
    let rest = line.strip_prefix(prefix)?;
    let mut words = rest.split_whitespace();
    let name = words.next()?.to_ascii_lowercase();
    Some((name, words.map(String::from).collect()))
}

/// Parse `host:port`, defaulting the port to 25565.
pub fn parse_target(target: &str) -> Option<(String, u16)> {
    match target.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => Some((host.to_string(), port.parse().ok()?)),
        Some(_) => None,
        None if !target.is_empty() => Some((target.to_string(), DEFAULT_PORT)),
        None => None,
    }
}

pub const DEFAULT_PORT: u16 = 25565;

/// Registry of relay commands.
pub struct CommandRegistry {
    commands: HashMap<String, CommandEntry>,
}

impl CommandRegistry {
    /// Create a new registry with the built-in commands.
    pub fn new() -> Self {
        let mut registry = Self {
            commands: HashMap::new(),
        };
        registry.register("help", "List relay commands", cmd_help);
        registry.register("relay", "Show relay session status", cmd_relay);
        registry.register("ext", "List, enable or disable extensions", cmd_ext);
        registry.register("connect", "Connect to another server: connect <host:port>", cmd_connect);
        registry.register("reconnect", "Reconnect to the current server", cmd_reconnect);
        registry
    }

    /// Register a command.
    pub fn register(&mut self, name: &str, description: &str, handler: CommandFn) {
        self.commands.insert(
            name.to_string(),
            CommandEntry {
                name: name.to_string(),
                description: description.to_string(),
                handler,
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Execute a command by name.
    pub fn execute(&self, name: &str, ctx: &CommandContext) -> CommandResult {
        match self.commands.get(name) {
            Some(entry) => (entry.handler)(ctx),
            None => CommandResult::err(format!(
                "Unknown relay command: {name}. Type help for a list of commands."
            )),
        }
    }

    /// Get a reference to all registered commands.
    pub fn get_commands(&self) -> &HashMap<String, CommandEntry> {
        &self.commands
    }

    /// `name:description` pairs, sorted, as injected into `help`.
    pub fn help_args(&self) -> Vec<String> {
        let mut args: Vec<String> = self
            .commands
            .values()
            .map(|c| format!("{}:{}", c.name, c.description))
            .collect();
        args.sort();
        args
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Built-in commands
// ---------------------------------------------------------------------------

fn cmd_help(ctx: &CommandContext) -> CommandResult {
    // Receives the command list as "name:description" pairs injected by the session.
    let mut lines = vec!["Relay commands:".to_string()];
    for arg in &ctx.args {
        if let Some((name, desc)) = arg.split_once(':') {
            lines.push(format!("  {name} - {desc}"));
        }
    }
    CommandResult {
        success: true,
        messages: lines,
        action: None,
    }
}

fn cmd_relay(ctx: &CommandContext) -> CommandResult {
    // args are "key=value" status lines injected by the session.
    let mut lines = vec![format!("Relay session for {}:", ctx.sender_name)];
    for arg in &ctx.args {
        match arg.split_once('=') {
            Some((key, value)) => lines.push(format!("  {key}: {value}")),
            None => lines.push(format!("  {arg}")),
        }
    }
    CommandResult {
        success: true,
        messages: lines,
        action: None,
    }
}

fn cmd_ext(ctx: &CommandContext) -> CommandResult {
    match ctx.args.first().map(String::as_str) {
        Some("enable") | Some("disable") if ctx.args.len() < 2 => {
            CommandResult::err("Usage: ext <enable|disable> <name>")
        }
        Some("enable") => {
            let name = ctx.args[1].clone();
            CommandResult::ok(format!("Enabling {name}..."))
                .with_action(CommandAction::EnableExtension(name))
        }
        Some("disable") => {
            let name = ctx.args[1].clone();
            CommandResult::ok(format!("Disabling {name}..."))
                .with_action(CommandAction::DisableExtension(name))
        }
        Some("list") | None => {
            // Remaining args are "name:state" pairs injected by the session.
            let entries: Vec<&String> = ctx.args.iter().skip(1).collect();
            if entries.is_empty() {
                return CommandResult::ok("No extensions loaded");
            }
            let mut lines = vec![format!("{} extension(s):", entries.len())];
            for entry in entries {
                match entry.split_once(':') {
                    Some((name, state)) => lines.push(format!("  {name} ({state})")),
                    None => lines.push(format!("  {entry}")),
                }
            }
            CommandResult {
                success: true,
                messages: lines,
                action: None,
            }
        }
        Some(other) => CommandResult::err(format!("Unknown ext subcommand: {other}")),
    }
}

fn cmd_connect(ctx: &CommandContext) -> CommandResult {
    let Some(target) = ctx.args.first() else {
        return CommandResult::err("Usage: connect <host:port>");
    };
    match parse_target(target) {
        Some((host, port)) => CommandResult::ok(format!("Connecting to {host}:{port}..."))
            .with_action(CommandAction::Connect { host, port }),
        None => CommandResult::err(format!("Invalid target: {target}")),
    }
}

fn cmd_reconnect(_ctx: &CommandContext) -> CommandResult {
    CommandResult::ok("Reconnecting...").with_action(CommandAction::Reconnect)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_ctx(sender: &str, args: Vec<&str>) -> CommandContext {
        CommandContext {
            sender_name: sender.to_string(),
            args: args.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn registry_has_builtins() {
        let reg = CommandRegistry::new();
        assert_eq!(reg.get_commands().len(), 5);
        for name in ["help", "relay", "ext", "connect", "reconnect"] {
            assert!(reg.contains(name), "missing {name}");
        }
    }

    #[test]
    fn unknown_command() {
        let reg = CommandRegistry::new();
        let result = reg.execute("teleport", &make_ctx("Steve", vec![]));
        assert!(!result.success);
        assert!(result.messages[0].contains("Unknown relay command"));
    }

    #[test]
    fn parse_lines() {
        assert_eq!(
            parse_command_line("/connect  play.example.net:25565", "/"),
            Some(("connect".into(), vec!["play.example.net:25565".into()]))
        );
        assert_eq!(parse_command_line("/Relay", "/"), Some(("relay".into(), vec![])));
        assert_eq!(parse_command_line("hello", "/"), None);
        assert_eq!(parse_command_line("/", "/"), None);
        assert_eq!(parse_command_line(".ext list", "."), Some(("ext".into(), vec!["list".into()])));
    }

    #[test]
    fn parse_targets() {
        assert_eq!(parse_target("localhost:25566"), Some(("localhost".into(), 25566)));
        assert_eq!(parse_target("example.net"), Some(("example.net".into(), DEFAULT_PORT)));
        assert_eq!(parse_target("example.net:notaport"), None);
        assert_eq!(parse_target(":25565"), None);
        assert_eq!(parse_target(""), None);
    }

    #[test]
    fn help_lists_commands() {
        let reg = CommandRegistry::new();
        let args = reg.help_args();
        let result = reg.execute(
            "help",
            &make_ctx("Steve", args.iter().map(String::as_str).collect()),
        );
        assert!(result.success);
        assert_eq!(result.messages.len(), 6);
        assert!(result.messages[0].contains("Relay commands"));
    }

    #[test]
    fn connect_yields_action() {
        let reg = CommandRegistry::new();
        let result = reg.execute("connect", &make_ctx("Steve", vec!["mc.example.net:25570"]));
        assert!(result.success);
        assert_eq!(
            result.action,
            Some(CommandAction::Connect {
                host: "mc.example.net".into(),
                port: 25570
            })
        );

        let result = reg.execute("connect", &make_ctx("Steve", vec![]));
        assert!(!result.success);
        assert!(result.action.is_none());
    }

    #[test]
    fn reconnect_yields_action() {
        let reg = CommandRegistry::new();
        let result = reg.execute("reconnect", &make_ctx("Steve", vec![]));
        assert_eq!(result.action, Some(CommandAction::Reconnect));
    }

    #[test]
    fn ext_subcommands() {
        let reg = CommandRegistry::new();
        let result = reg.execute("ext", &make_ctx("Steve", vec!["enable", "Censor"]));
        assert_eq!(result.action, Some(CommandAction::EnableExtension("Censor".into())));
        let result = reg.execute("ext", &make_ctx("Steve", vec!["disable", "Censor"]));
        assert_eq!(result.action, Some(CommandAction::DisableExtension("Censor".into())));
        let result = reg.execute("ext", &make_ctx("Steve", vec!["disable"]));
        assert!(!result.success);

        let result = reg.execute("ext", &make_ctx("Steve", vec!["list", "Censor:enabled", "Radar:disabled"]));
        assert!(result.success);
        assert_eq!(result.messages.len(), 3);
        assert!(result.messages[2].contains("Radar (disabled)"));

        let result = reg.execute("ext", &make_ctx("Steve", vec!["list"]));
        assert_eq!(result.messages[0], "No extensions loaded");
    }

    #[test]
    fn relay_status_lines() {
        let reg = CommandRegistry::new();
        let result = reg.execute("relay", &make_ctx("Steve", vec!["state=relaying", "upstream=localhost:25565"]));
        assert!(result.success);
        assert_eq!(result.messages[1], "  state: relaying");
    }

    #[test]
    fn result_helpers() {
        let ok = CommandResult::ok("success");
        assert!(ok.success);
        assert_eq!(ok.messages[0], "success");

        let err = CommandResult::err("failed");
        assert!(!err.success);
        assert_eq!(err.messages[0], "failed");
    }
}
