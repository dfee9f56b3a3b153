//! Operator interaction seam.
//!
//! All interactive input goes through the `Prompter` trait so the step
//! sequence can run under tests with scripted answers instead of a terminal.
//! The CLI has no flags; these prompts are the whole user interface.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

/// Capability for asking the operator questions.
pub trait Prompter {
    /// Free-form answer. Re-prompts on empty input are the caller's job.
    fn ask(&mut self, prompt: &str) -> io::Result<String>;

    /// Free-form answer with a default used when the operator just hits
    /// return.
    fn ask_default(&mut self, prompt: &str, default: &str) -> io::Result<String> {
        let answer = self.ask(&format!("{} [{}]", prompt, default))?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }

    /// Answer that must not be echoed or logged (passwords).
    fn ask_secret(&mut self, prompt: &str) -> io::Result<String>;

    /// Yes/no question. `default` is returned on empty input.
    fn confirm(&mut self, prompt: &str, default: bool) -> io::Result<bool>;

    /// Pick one of `options`; returns the chosen index. Invalid input
    /// re-prompts rather than failing.
    fn select(&mut self, prompt: &str, options: &[String]) -> io::Result<usize>;
}

/// Interactive prompter reading from stdin.
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        TerminalPrompter
    }

    fn read_line(&self) -> io::Result<String> {
        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn ask(&mut self, prompt: &str) -> io::Result<String> {
        print!("{}: ", prompt);
        io::stdout().flush()?;
        self.read_line()
    }

    fn ask_secret(&mut self, prompt: &str) -> io::Result<String> {
        print!("{}: ", prompt);
        io::stdout().flush()?;
        let answer = read_without_echo();
        println!();
        answer
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> io::Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            print!("{} {}: ", prompt, hint);
            io::stdout().flush()?;
            match self.read_line()?.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                other => println!("please answer y or n (got '{}')", other),
            }
        }
    }

    fn select(&mut self, prompt: &str, options: &[String]) -> io::Result<usize> {
        loop {
            println!("{}:", prompt);
            for (i, option) in options.iter().enumerate() {
                println!("  {}) {}", i + 1, option);
            }
            print!("choice [1-{}]: ", options.len());
            io::stdout().flush()?;
            let answer = self.read_line()?;
            match answer.parse::<usize>() {
                Ok(n) if n >= 1 && n <= options.len() => return Ok(n - 1),
                _ => println!("invalid choice '{}'", answer),
            }
        }
    }
}

/// Read one line from stdin with terminal echo disabled.
///
/// Falls back to a plain read when stdin is not a tty (piped input).
fn read_without_echo() -> io::Result<String> {
    use nix::sys::termios::{self, LocalFlags, SetArg};

    let stdin = io::stdin();
    let saved = match termios::tcgetattr(&stdin) {
        Ok(t) => t,
        Err(_) => {
            // Not a terminal; read normally.
            let mut input = String::new();
            io::stdin().lock().read_line(&mut input)?;
            return Ok(input.trim().to_string());
        }
    };

    let mut silent = saved.clone();
    silent.local_flags.remove(LocalFlags::ECHO);
    termios::tcsetattr(&stdin, SetArg::TCSANOW, &silent)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let mut input = String::new();
    let result = io::stdin().lock().read_line(&mut input);

    // Restore echo before surfacing any read error.
    let _ = termios::tcsetattr(&stdin, SetArg::TCSANOW, &saved);
    result?;
    Ok(input.trim().to_string())
}

/// Prompter fed from a fixed answer script, for tests.
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedPrompter {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    fn next(&mut self) -> io::Result<String> {
        self.answers.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "answer script exhausted")
        })
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&mut self, _prompt: &str) -> io::Result<String> {
        self.next()
    }

    fn ask_secret(&mut self, _prompt: &str) -> io::Result<String> {
        self.next()
    }

    fn confirm(&mut self, _prompt: &str, default: bool) -> io::Result<bool> {
        match self.next()?.to_lowercase().as_str() {
            "" => Ok(default),
            "y" | "yes" => Ok(true),
            _ => Ok(false),
        }
    }

    fn select(&mut self, _prompt: &str, options: &[String]) -> io::Result<usize> {
        let answer = self.next()?;
        match answer.parse::<usize>() {
            Ok(n) if n >= 1 && n <= options.len() => Ok(n - 1),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("scripted choice '{}' out of range", answer),
            )),
        }
    }
}
