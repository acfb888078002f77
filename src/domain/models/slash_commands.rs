#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

/// A `/command arg...` line typed into the shell.
pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

const COMMANDS: &[&[&str]] = &[
    &["/l", "/listen"],
    &["/s", "/stop"],
    &["/send"],
    &["/mode"],
    &["/lang", "/language"],
    &["/say"],
    &["/mute"],
    &["/history"],
    &["/load"],
    &["/new"],
    &["/online"],
    &["/offline"],
    &["/h", "/help"],
    &["/q", "/quit", "/exit"],
];

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut words = text.split_whitespace().map(|e| return e.to_string());
        let command = words.next()?.to_lowercase();

        if !COMMANDS.iter().any(|aliases| return aliases.contains(&command.as_str())) {
            return None;
        }

        return Some(SlashCommand {
            command,
            args: words.collect(),
        });
    }

    fn is(&self, aliases: &[&str]) -> bool {
        return aliases.contains(&self.command.as_str());
    }

    /// Everything after the command, as typed.
    pub fn rest(&self) -> String {
        return self.args.join(" ");
    }

    pub fn is_listen(&self) -> bool {
        return self.is(&["/l", "/listen"]);
    }

    pub fn is_stop(&self) -> bool {
        return self.is(&["/s", "/stop"]);
    }

    pub fn is_send(&self) -> bool {
        return self.is(&["/send"]);
    }

    pub fn is_mode(&self) -> bool {
        return self.is(&["/mode"]);
    }

    pub fn is_language(&self) -> bool {
        return self.is(&["/lang", "/language"]);
    }

    pub fn is_say(&self) -> bool {
        return self.is(&["/say"]) && !self.args.is_empty();
    }

    pub fn is_mute(&self) -> bool {
        return self.is(&["/mute"]);
    }

    pub fn is_history(&self) -> bool {
        return self.is(&["/history"]);
    }

    pub fn is_load(&self) -> bool {
        return self.is(&["/load"]) && !self.args.is_empty();
    }

    pub fn is_new(&self) -> bool {
        return self.is(&["/new"]);
    }

    pub fn is_online(&self) -> bool {
        return self.is(&["/online"]);
    }

    pub fn is_offline(&self) -> bool {
        return self.is(&["/offline"]);
    }

    pub fn is_help(&self) -> bool {
        return self.is(&["/h", "/help"]);
    }

    pub fn is_quit(&self) -> bool {
        return self.is(&["/q", "/quit", "/exit"]);
    }
}
