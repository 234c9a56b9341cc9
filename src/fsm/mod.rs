//! Table-driven menu state machine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  MenuTable                                           │
//! │  ┌──────────┬────────────┬─────────────────────────┐ │
//! │  │ Level    │ name       │ items                   │ │
//! │  ├──────────┼────────────┼─────────────────────────┤ │
//! │  │ Root     │ "Root"     │ &[MenuItem; 11]         │ │
//! │  │ Settings │ "Settings" │ &[MenuItem; 6]          │ │
//! │  │ Adjust   │ "Adjust"   │ &[MenuItem; 13]         │ │
//! │  │ TestLeds │ "Test LEDs"│ &[MenuItem; 11]         │ │
//! │  └──────────┴────────────┴─────────────────────────┘ │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The display shows a four-row window onto the current level's items.
//! [`Menu`] tracks the window's first line and the cursor row inside it;
//! `up`/`down` move the cursor and scroll the window, wrapping at both
//! ends.  The invariant `first_line + cursor < items.len()` holds after
//! every operation.

pub mod actions;
pub mod context;
pub mod menus;

use log::{debug, info};

use actions::MenuAction;
use menus::{MenuItem, build_menu_table};

/// Rows in the visible menu window.
pub const WINDOW_ROWS: usize = 4;

// ---------------------------------------------------------------------------
// Level identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MenuLevel {
    Root = 0,
    Settings = 1,
    Adjust = 2,
    TestLeds = 3,
}

impl MenuLevel {
    pub const COUNT: usize = 4;

    /// Returns `Root` for out-of-range indices.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            1 => Self::Settings,
            2 => Self::Adjust,
            3 => Self::TestLeds,
            _ => Self::Root,
        }
    }
}

/// One row of the menu table.
pub struct MenuDescriptor {
    pub level: MenuLevel,
    pub name: &'static str,
    pub items: &'static [MenuItem],
}

// ---------------------------------------------------------------------------
// Menu engine
// ---------------------------------------------------------------------------

/// What a press of Exit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Returned to Root; the menu stays open.
    ToRoot,
    /// Already at Root; the caller closes the menu.
    Closed,
}

pub struct Menu {
    table: [MenuDescriptor; MenuLevel::COUNT],
    level: MenuLevel,
    cursor: usize,
    first_line: usize,
    editing: bool,
}

impl Menu {
    pub fn new() -> Self {
        Self {
            table: build_menu_table(),
            level: MenuLevel::Root,
            cursor: 0,
            first_line: 0,
            editing: false,
        }
    }

    pub fn level(&self) -> MenuLevel {
        self.level
    }

    /// Cursor row inside the window (0..=3).
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Index of the item shown on the window's top row.
    pub fn first_line(&self) -> usize {
        self.first_line
    }

    /// Value-edit mode on a focused setting.
    pub fn editing(&self) -> bool {
        self.editing
    }

    pub fn items(&self) -> &'static [MenuItem] {
        self.table[self.level as usize].items
    }

    /// Index of the focused item within the current level.
    pub fn selected_index(&self) -> usize {
        self.first_line + self.cursor
    }

    pub fn selected(&self) -> MenuItem {
        let items = self.items();
        items[self.selected_index().min(items.len() - 1)]
    }

    /// Items in the window with a flag marking the cursor row.
    pub fn visible(&self) -> impl Iterator<Item = (&'static MenuItem, bool)> + '_ {
        self.items()
            .iter()
            .skip(self.first_line)
            .take(WINDOW_ROWS)
            .enumerate()
            .map(|(row, item)| (item, row == self.cursor))
    }

    fn rows(&self) -> usize {
        self.items().len().min(WINDOW_ROWS)
    }

    /// Move the cursor up one item, scrolling and wrapping to the bottom.
    pub fn up(&mut self) {
        let last_first = self.items().len() - self.rows();
        if self.cursor > 0 {
            self.cursor -= 1;
        } else if self.first_line > 0 {
            self.first_line -= 1;
        } else {
            self.first_line = last_first;
            self.cursor = self.rows() - 1;
        }
    }

    /// Move the cursor down one item, scrolling and wrapping to the top.
    pub fn down(&mut self) {
        let last_first = self.items().len() - self.rows();
        if self.cursor + 1 < self.rows() {
            self.cursor += 1;
        } else if self.first_line < last_first {
            self.first_line += 1;
        } else {
            self.first_line = 0;
            self.cursor = 0;
        }
    }

    /// Return to the top of the current level.
    pub fn home(&mut self) {
        self.cursor = 0;
        self.first_line = 0;
        self.editing = false;
    }

    /// Descend into `level` with the cursor on its first item.
    pub fn enter(&mut self, level: MenuLevel) {
        info!("menu: {} -> {}", self.table[self.level as usize].name, self.table[level as usize].name);
        self.level = level;
        self.home();
    }

    /// Pop back to Root, or report that the menu should close.
    pub fn exit(&mut self) -> ExitOutcome {
        let outcome = if self.level == MenuLevel::Root {
            ExitOutcome::Closed
        } else {
            ExitOutcome::ToRoot
        };
        self.enter(MenuLevel::Root);
        outcome
    }

    /// Flip value-edit mode if the focused item is a setting.
    /// Returns the new mode.
    pub fn toggle_editing(&mut self) -> bool {
        self.editing = !self.editing && self.selected().action.is_editable();
        debug!("menu: editing={}", self.editing);
        self.editing
    }

    /// Action of the focused item.
    pub fn selected_action(&self) -> MenuAction {
        self.selected().action
    }
}

impl Default for Menu {
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Up,
        Down,
        Enter(usize),
        Exit,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Up),
            Just(Op::Down),
            (0..MenuLevel::COUNT).prop_map(Op::Enter),
            Just(Op::Exit),
        ]
    }

    proptest! {
        #[test]
        fn window_invariant_holds(ops in proptest::collection::vec(arb_op(), 1..200)) {
            let mut m = Menu::new();
            for op in ops {
                match op {
                    Op::Up => m.up(),
                    Op::Down => m.down(),
                    Op::Enter(i) => m.enter(MenuLevel::from_index(i)),
                    Op::Exit => { m.exit(); }
                }
                prop_assert!(m.cursor() < WINDOW_ROWS);
                prop_assert!(m.first_line() + m.cursor() < m.items().len());
            }
        }

        #[test]
        fn full_cycle_returns_home(level in 0..MenuLevel::COUNT) {
            let mut m = Menu::new();
            m.enter(MenuLevel::from_index(level));
            let len = m.items().len();
            for _ in 0..len {
                m.down();
            }
            prop_assert_eq!(m.selected_index(), 0);
            for _ in 0..len {
                m.up();
            }
            prop_assert_eq!(m.selected_index(), 0);
        }
    }
}
