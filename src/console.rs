// Console abstraction used by the menus and the application flows.
//
// `StdConsole` talks to the real terminal (dialoguer prompts, crossterm
// colors). `ScriptedConsole` replays canned input and records output so
// menus can be driven from tests.

use crossterm::style::Stylize;
use dialoguer::{Input, Password};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, BufRead, IsTerminal, Write};

/// How a message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Failure,
}

/// Line-oriented input and output. All methods take `&self` so a console
/// can be shared by several menus that run nested inside each other.
pub trait Console {
    /// Reads one line of input. `None` means there is no more input.
    fn read_line(&self, prompt: &str) -> Option<String>;

    /// Reads a line without echoing it back.
    fn read_secret(&self, prompt: &str) -> Option<String> {
        self.read_line(prompt)
    }

    fn print(&self, line: &str);

    fn print_styled(&self, line: &str, _tone: Tone) {
        self.print(line)
    }
}

/// dialoguer's theme adds its own `": "` after the prompt, so the
/// separator written for plain reads is dropped.
fn themed_prompt(prompt: &str) -> &str {
    prompt.trim().trim_end_matches(':').trim_end()
}

/// Console bound to the process stdin/stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl StdConsole {
    fn read_plain(prompt: &str) -> Option<String> {
        print!("{}", prompt);
        io::stdout().flush().ok()?;
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read from stdin");
                None
            }
        }
    }
}

impl Console for StdConsole {
    fn read_line(&self, prompt: &str) -> Option<String> {
        // dialoguer needs a real terminal; piped input falls back to plain reads.
        if !io::stdin().is_terminal() {
            return Self::read_plain(prompt);
        }
        Input::<String>::new()
            .with_prompt(themed_prompt(prompt))
            .allow_empty(true)
            .interact_text()
            .map_err(|e| tracing::warn!(error = %e, "prompt failed"))
            .ok()
    }

    fn read_secret(&self, prompt: &str) -> Option<String> {
        if !io::stdin().is_terminal() {
            return Self::read_plain(prompt);
        }
        Password::new()
            .with_prompt(themed_prompt(prompt))
            .allow_empty_password(true)
            .interact()
            .map_err(|e| tracing::warn!(error = %e, "password prompt failed"))
            .ok()
    }

    fn print(&self, line: &str) {
        println!("{}", line);
    }

    fn print_styled(&self, line: &str, tone: Tone) {
        match tone {
            Tone::Success => println!("{}", line.green()),
            Tone::Failure => println!("{}", line.red()),
        }
    }
}

/// Test helper: an in-memory console that hands out the given input
/// lines one by one and keeps every printed line (prompts included) for
/// inspection. Integration tests use it to drive menus and the app
/// without a terminal; the binary always uses [`StdConsole`].
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    input: RefCell<VecDeque<String>>,
    output: RefCell<Vec<String>>,
}

impl ScriptedConsole {
    pub fn new<I, S>(input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScriptedConsole {
            input: RefCell::new(input.into_iter().map(Into::into).collect()),
            output: RefCell::new(Vec::new()),
        }
    }

    /// Lines printed so far.
    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    pub fn printed(&self, line: &str) -> bool {
        self.output.borrow().iter().any(|l| l == line)
    }

    pub fn count_printed(&self, line: &str) -> usize {
        self.output.borrow().iter().filter(|l| *l == line).count()
    }

    pub fn remaining_input(&self) -> usize {
        self.input.borrow().len()
    }
}

impl Console for ScriptedConsole {
    fn read_line(&self, prompt: &str) -> Option<String> {
        self.output.borrow_mut().push(prompt.to_string());
        self.input.borrow_mut().pop_front()
    }

    fn print(&self, line: &str) {
        self.output.borrow_mut().push(line.to_string());
    }
}
