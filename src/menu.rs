// Text menu engine.
//
// A `Menu` is a titled list of keyed entries driven by a blocking input
// loop. Menus are assembled with `MenuBuilder` and are immutable once
// built, apart from the running flag that `run`/`stop` toggle. Menus can
// be stacked by having an entry's action stop one menu and run another.

use crate::console::{Console, StdConsole};
use crate::error::{MenuError, ValidationError};
use regex::Regex;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;

pub const MAX_KEY_LEN: usize = 10;
pub const MAX_DESCRIPTION_LEN: usize = 900;

pub const SELECTION_PROMPT: &str = " ? ";
pub const INVALID_KEY_SELECTION: &str = "Invalid selection. Please, try again...";

const KEY_HELP: &str = "A menu key must be 1 to 10 letters, digits, '_' or '-'";
const DESCRIPTION_HELP: &str =
    "A description must be 1 to 900 letters, digits, spaces or simple punctuation";

static KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("key pattern is valid"));
static DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9 .,;:!?'()/_-]+$").expect("description pattern is valid")
});

/// Text the user types to pick an entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(String);

impl Key {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let len = value.chars().count();
        if len == 0 || len > MAX_KEY_LEN || !KEY_RE.is_match(&value) {
            return Err(ValidationError::new(KEY_HELP));
        }
        Ok(Key(value))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Label of a menu or of one of its entries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Description(String);

impl Description {
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let len = value.chars().count();
        if len == 0 || len > MAX_DESCRIPTION_LEN || !DESCRIPTION_RE.is_match(&value) {
            return Err(ValidationError::new(DESCRIPTION_HELP));
        }
        Ok(Description(value))
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One selectable line of a menu.
pub struct Entry {
    key: Key,
    description: Description,
    on_selected: Box<dyn Fn()>,
    is_exit: bool,
}

impl Entry {
    pub fn new(
        key: Key,
        description: Description,
        on_selected: impl Fn() + 'static,
        is_exit: bool,
    ) -> Self {
        Entry {
            key,
            description,
            on_selected: Box::new(on_selected),
            is_exit,
        }
    }

    /// Validates the raw key and description, then builds the entry.
    /// Pass `|| {}` for an entry that only needs its exit behavior.
    pub fn create(
        key: &str,
        description: &str,
        on_selected: impl Fn() + 'static,
        is_exit: bool,
    ) -> Result<Self, ValidationError> {
        Ok(Entry::new(
            Key::new(key)?,
            Description::new(description)?,
            on_selected,
            is_exit,
        ))
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn is_exit(&self) -> bool {
        self.is_exit
    }

    /// Runs the entry's action.
    pub fn select(&self) {
        (self.on_selected)()
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("description", &self.description)
            .field("is_exit", &self.is_exit)
            .finish_non_exhaustive()
    }
}

/// A built menu. See [`Menu::run`] for the loop semantics.
pub struct Menu {
    description: Description,
    entries: Vec<Entry>,
    key_to_entry: HashMap<Key, usize>,
    running: Cell<bool>,
    auto_select: Box<dyn Fn()>,
    console: Rc<dyn Console>,
}

impl Menu {
    pub fn description(&self) -> &Description {
        &self.description
    }

    /// Entries in display order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Shows the menu and dispatches selections until an exit entry is
    /// picked or `stop` is called. The running flag is only checked
    /// between selections, so a `stop` issued from inside an action takes
    /// effect once that action returns. Running out of input also stops
    /// the menu.
    pub fn run(&self) {
        self.running.set(true);
        while self.running.get() {
            (self.auto_select)();
            self.render();
            match self.select_from_input() {
                Some(false) => {}
                Some(true) | None => self.stop(),
            }
        }
    }

    pub fn stop(&self) {
        self.running.set(false);
    }

    fn render(&self) {
        let title = self.description.value();
        let stars = "*".repeat(title.chars().count());
        let border = format!("****{}****", stars);
        self.console.print(&border);
        self.console.print(&format!("*** {} ***", title));
        self.console.print(&border);
        for entry in &self.entries {
            self.console
                .print(&format!("{}:\t{}", entry.key, entry.description));
        }
    }

    /// Prompts until a known key is typed and runs its action. Returns
    /// whether the chosen entry is an exit entry, or `None` when input
    /// ran out.
    fn select_from_input(&self) -> Option<bool> {
        loop {
            let line = self.console.read_line(SELECTION_PROMPT)?;
            match self.lookup(line.trim()) {
                Some(entry) => {
                    entry.select();
                    return Some(entry.is_exit);
                }
                None => self.console.print(INVALID_KEY_SELECTION),
            }
        }
    }

    fn lookup(&self, text: &str) -> Option<&Entry> {
        let key = Key::new(text).ok()?;
        self.key_to_entry.get(&key).map(|&i| &self.entries[i])
    }

    fn has_exit(&self) -> bool {
        self.entries.iter().any(|e| e.is_exit)
    }
}

impl fmt::Debug for Menu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Menu")
            .field("description", &self.description)
            .field("entries", &self.entries)
            .field("running", &self.running.get())
            .finish_non_exhaustive()
    }
}

/// Assembles a [`Menu`]. A builder is single use: once `build` succeeds
/// every further call fails with [`MenuError::BuilderConsumed`].
///
/// ```ignore
/// let menu = MenuBuilder::new(Description::new("Main")?)
///     .with_entry(Entry::create("1", "Say hi", || println!("hi"), false)?)?
///     .with_entry(Entry::create("0", "Exit", || {}, true)?)?
///     .build()?;
/// ```
#[derive(Debug)]
pub struct MenuBuilder {
    menu: Option<Menu>,
}

impl MenuBuilder {
    pub fn new(description: Description) -> Self {
        MenuBuilder {
            menu: Some(Menu {
                description,
                entries: Vec::new(),
                key_to_entry: HashMap::new(),
                running: Cell::new(false),
                auto_select: Box::new(|| {}),
                console: Rc::new(StdConsole),
            }),
        }
    }

    fn menu_mut(&mut self) -> Result<&mut Menu, MenuError> {
        self.menu.as_mut().ok_or(MenuError::BuilderConsumed)
    }

    /// Action run at the start of every display cycle, before the
    /// entries are shown.
    pub fn with_auto_select(
        &mut self,
        auto_select: impl Fn() + 'static,
    ) -> Result<&mut Self, MenuError> {
        self.menu_mut()?.auto_select = Box::new(auto_select);
        Ok(self)
    }

    pub fn with_console(&mut self, console: Rc<dyn Console>) -> Result<&mut Self, MenuError> {
        self.menu_mut()?.console = console;
        Ok(self)
    }

    pub fn with_entry(&mut self, entry: Entry) -> Result<&mut Self, MenuError> {
        let menu = self.menu_mut()?;
        if menu.key_to_entry.contains_key(&entry.key) {
            return Err(MenuError::DuplicateKey(entry.key.0));
        }
        menu.key_to_entry.insert(entry.key.clone(), menu.entries.len());
        menu.entries.push(entry);
        Ok(self)
    }

    pub fn build(&mut self) -> Result<Menu, MenuError> {
        match self.menu.take() {
            None => Err(MenuError::BuilderConsumed),
            Some(menu) if menu.has_exit() => Ok(menu),
            Some(menu) => {
                self.menu = Some(menu);
                Err(MenuError::MissingExit)
            }
        }
    }
}
