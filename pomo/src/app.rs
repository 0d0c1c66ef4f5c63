use crate::timer::{CountdownTimer, Tick};
use pomo_ipc::{TimerState, TimerStatus, TodoItem};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::warn;

#[derive(Serialize, Deserialize)]
pub struct App {
    pub todos: Vec<TodoItem>,
    pub next_todo_id: u32,
    pub selected_todo: usize,
    pub notes: String,
    pub timer: CountdownTimer,
    #[serde(skip)]
    pub mode: AppMode,
    #[serde(skip)]
    pub input_buffer: String,
    #[serde(skip)]
    pub should_quit: bool,
}

#[derive(Default, Clone, PartialEq, Debug)]
pub enum AppMode {
    #[default]
    Normal,
    AddingTodo,
    EditingNotes,
    EditingFocus,
    EditingBreak,
    UpdatePrompt,
}

impl App {
    pub fn new() -> Self {
        Self {
            todos: vec![],
            next_todo_id: 1,
            selected_todo: 0,
            notes: String::new(),
            timer: CountdownTimer::new(),
            mode: AppMode::Normal,
            input_buffer: String::new(),
            should_quit: false,
        }
    }

    /// Fix up state freshly loaded from disk: the countdown always restarts
    /// idle at the focus duration, and indices must point at real todos.
    pub fn normalize(&mut self) {
        self.timer.reset(true);
        if self.todos.is_empty() {
            self.selected_todo = 0;
        } else if self.selected_todo >= self.todos.len() {
            self.selected_todo = self.todos.len() - 1;
        }
        let min_free_id = self.todos.iter().map(|t| t.id + 1).max().unwrap_or(1);
        self.next_todo_id = self.next_todo_id.max(min_free_id);
    }

    pub fn add_todo(&mut self, title: String) {
        if title.is_empty() {
            return;
        }
        self.todos.push(TodoItem {
            id: self.next_todo_id,
            title,
            done: false,
        });
        self.next_todo_id += 1;
    }

    pub fn toggle_todo(&mut self, id: u32) -> bool {
        match self.todos.iter_mut().find(|t| t.id == id) {
            Some(todo) => {
                todo.done = !todo.done;
                true
            }
            None => false,
        }
    }

    pub fn remove_todo(&mut self, id: u32) -> bool {
        let before = self.todos.len();
        self.todos.retain(|t| t.id != id);
        if self.todos.is_empty() {
            self.selected_todo = 0;
        } else if self.selected_todo >= self.todos.len() {
            self.selected_todo = self.todos.len() - 1;
        }
        self.todos.len() != before
    }

    pub fn toggle_selected_todo(&mut self) {
        if let Some(todo) = self.todos.get(self.selected_todo) {
            let id = todo.id;
            self.toggle_todo(id);
        }
    }

    pub fn remove_selected_todo(&mut self) {
        if let Some(todo) = self.todos.get(self.selected_todo) {
            let id = todo.id;
            self.remove_todo(id);
        }
    }

    pub fn move_selection_up(&mut self) {
        self.selected_todo = self.selected_todo.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        if !self.todos.is_empty() {
            self.selected_todo = (self.selected_todo + 1).min(self.todos.len() - 1);
        }
    }

    pub fn handle_char(&mut self, c: char) {
        match self.mode {
            AppMode::AddingTodo => {
                if c == '\n' {
                    if !self.input_buffer.is_empty() {
                        self.add_todo(self.input_buffer.clone());
                    }
                    self.input_buffer.clear();
                    self.mode = AppMode::Normal;
                } else {
                    self.input_buffer.push(c);
                }
            }
            // Notes keep their newlines; the editor commits on Esc instead.
            AppMode::EditingNotes => self.input_buffer.push(c),
            AppMode::EditingFocus => {
                if c == '\n' {
                    if let Ok(minutes) = self.input_buffer.parse() {
                        self.timer.set_focus_minutes(minutes);
                    }
                    self.input_buffer.clear();
                    self.mode = AppMode::Normal;
                } else if c.is_numeric() {
                    self.input_buffer.push(c);
                }
            }
            AppMode::EditingBreak => {
                if c == '\n' {
                    if let Ok(minutes) = self.input_buffer.parse() {
                        self.timer.set_break_minutes(minutes);
                    }
                    self.input_buffer.clear();
                    self.mode = AppMode::Normal;
                } else if c.is_numeric() {
                    self.input_buffer.push(c);
                }
            }
            _ => {}
        }
    }

    pub fn handle_backspace(&mut self) {
        if matches!(
            self.mode,
            AppMode::AddingTodo
                | AppMode::EditingNotes
                | AppMode::EditingFocus
                | AppMode::EditingBreak
        ) {
            self.input_buffer.pop();
        }
    }

    pub fn open_notes_editor(&mut self) {
        self.input_buffer = self.notes.clone();
        self.mode = AppMode::EditingNotes;
    }

    pub fn commit_notes(&mut self) {
        self.notes = self.input_buffer.clone();
        self.input_buffer.clear();
        self.mode = AppMode::Normal;
    }

    /// Advance the countdown by one logical second. Returns true when this
    /// tick completed the countdown.
    pub fn tick_timer(&mut self) -> bool {
        self.timer.tick() == Tick::Completed
    }

    pub fn timer_status(&self) -> TimerStatus {
        TimerStatus {
            state: if self.timer.is_running() {
                TimerState::Running
            } else {
                TimerState::Idle
            },
            remaining: self.timer.remaining(),
            total: self.timer.target(),
        }
    }

    pub fn notify_timer_finished(&self) {
        ring_bell();
        if let Err(e) = notify_rust::Notification::new()
            .summary("Pomodoro Finished")
            .body("Time for a break!")
            .appname("pomo")
            .show()
        {
            warn!("Failed to send notification: {}", e);
        }
    }
}

fn ring_bell() {
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(b"\x07");
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_titles_are_ignored() {
        let mut app = App::new();
        app.add_todo(String::new());
        assert!(app.todos.is_empty());
        app.add_todo("real".to_string());
        assert_eq!(app.todos.len(), 1);
    }

    #[test]
    fn todo_ids_are_unique_and_stable() {
        let mut app = App::new();
        app.add_todo("a".to_string());
        app.add_todo("b".to_string());
        let first = app.todos[0].id;
        app.remove_todo(first);
        app.add_todo("c".to_string());
        assert_eq!(app.todos.len(), 2);
        assert_ne!(app.todos[0].id, app.todos[1].id);
    }

    #[test]
    fn toggle_flips_done_in_place() {
        let mut app = App::new();
        app.add_todo("a".to_string());
        let id = app.todos[0].id;
        assert!(app.toggle_todo(id));
        assert!(app.todos[0].done);
        assert!(app.toggle_todo(id));
        assert!(!app.todos[0].done);
        assert!(!app.toggle_todo(999));
    }

    #[test]
    fn removal_clamps_the_selection() {
        let mut app = App::new();
        app.add_todo("a".to_string());
        app.add_todo("b".to_string());
        app.selected_todo = 1;
        app.remove_selected_todo();
        assert_eq!(app.selected_todo, 0);
        app.remove_selected_todo();
        assert!(app.todos.is_empty());
        assert_eq!(app.selected_todo, 0);
    }

    #[test]
    fn adding_todo_commits_on_enter() {
        let mut app = App::new();
        app.mode = AppMode::AddingTodo;
        for c in "read rfc".chars() {
            app.handle_char(c);
        }
        app.handle_char('\n');
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.todos.len(), 1);
        assert_eq!(app.todos[0].title, "read rfc");
        assert!(app.input_buffer.is_empty());
    }

    #[test]
    fn notes_editor_keeps_newlines_until_committed() {
        let mut app = App::new();
        app.notes = "old".to_string();
        app.open_notes_editor();
        assert_eq!(app.input_buffer, "old");

        app.handle_char('\n');
        app.handle_char('x');
        assert_eq!(app.notes, "old");

        app.commit_notes();
        assert_eq!(app.notes, "old\nx");
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn duration_input_accepts_digits_only() {
        let mut app = App::new();
        app.mode = AppMode::EditingFocus;
        for c in "4x5".chars() {
            app.handle_char(c);
        }
        assert_eq!(app.input_buffer, "45");
        app.handle_char('\n');
        assert_eq!(app.timer.focus_secs(), 45 * 60);
        // Current countdown untouched until the next reset.
        assert_eq!(app.timer.remaining(), crate::timer::DEFAULT_FOCUS_SECS);
    }

    #[test]
    fn status_reflects_timer_state() {
        let mut app = App::new();
        let status = app.timer_status();
        assert_eq!(status.state, TimerState::Idle);
        assert_eq!(status.remaining, status.total);

        app.timer.start();
        app.tick_timer();
        let status = app.timer_status();
        assert_eq!(status.state, TimerState::Running);
        assert_eq!(status.remaining, status.total - 1);
    }
}
