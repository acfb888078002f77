#[cfg(test)]
#[path = "command_test.rs"]
mod tests;

use std::process::Stdio;

use tokio::process::Command;

/// A configured external program with `{name}` placeholders in its
/// arguments, e.g. `espeak-ng -v {lang} -s {rate} {text}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

fn split_words(line: &str) -> Vec<String> {
    let mut words = vec![];
    let mut word = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => word.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            None => {
                word.push(c);
                in_word = true;
            }
        }
    }

    if in_word {
        words.push(word);
    }

    return words;
}

impl CommandTemplate {
    /// Returns `None` for an empty command line, which marks the primitive as
    /// unavailable.
    pub fn parse(line: &str) -> Option<CommandTemplate> {
        let mut words = split_words(line).into_iter();
        let program = words.next()?;

        return Some(CommandTemplate {
            program,
            args: words.collect(),
        });
    }

    pub fn program(&self) -> &str {
        return &self.program;
    }

    pub fn uses(&self, name: &str) -> bool {
        let placeholder = format!("{{{name}}}");
        return self.args.iter().any(|e| return e.contains(&placeholder));
    }

    pub fn render_args(&self, vars: &[(&str, String)]) -> Vec<String> {
        return self
            .args
            .iter()
            .map(|arg| {
                let mut res = arg.to_string();
                for (name, value) in vars {
                    res = res.replace(&format!("{{{name}}}"), value);
                }
                return res;
            })
            .collect();
    }

    /// Builds the process with output silenced. The child is killed when its
    /// handle is dropped.
    pub fn command(&self, vars: &[(&str, String)]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.render_args(vars))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        return cmd;
    }
}
