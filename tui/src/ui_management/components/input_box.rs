use circular_queue::CircularQueue;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::state_store::command;

const MAX_HISTORY_LINES: usize = 100;

/// What the prompt has to do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    Unchanged,
    /// The text or the cursor moved, the prompt line must be drawn again
    Redraw,
    /// Enter was pressed, carries the submitted line
    Submit(String),
    /// Tab matched several commands, they should be listed above the prompt
    Candidates(Vec<&'static str>),
    /// Ctrl+C
    Interrupt,
    /// Ctrl+D on an empty line
    EndOfInput,
}

/// Single line editor behind the `$` prompt
pub struct InputBox {
    /// Current value of the input box
    text: String,
    /// Position of cursor in the editor area, counted in chars
    cursor_position: usize,
    /// Submitted lines, the most recent first
    history: CircularQueue<String>,
    /// Position in `history` while browsing it with Up and Down
    history_index: Option<usize>,
}

impl Default for InputBox {
    fn default() -> Self {
        Self {
            text: String::new(),
            cursor_position: 0,
            history: CircularQueue::with_capacity(MAX_HISTORY_LINES),
            history_index: None,
        }
    }
}

impl InputBox {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    pub fn set_text(&mut self, new_text: &str) {
        self.text = String::from(new_text);
        self.cursor_position = self.text.chars().count();
    }

    pub fn reset(&mut self) {
        self.cursor_position = 0;
        self.text.clear();
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> InputOutcome {
        if key.kind != KeyEventKind::Press {
            return InputOutcome::Unchanged;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => InputOutcome::Interrupt,
                KeyCode::Char('d') if self.text.is_empty() => InputOutcome::EndOfInput,
                KeyCode::Char('a') => self.move_cursor_to(0),
                KeyCode::Char('e') => self.move_cursor_to(usize::MAX),
                KeyCode::Char('u') => {
                    self.reset();
                    InputOutcome::Redraw
                }
                _ => InputOutcome::Unchanged,
            };
        }

        match key.code {
            KeyCode::Enter => InputOutcome::Submit(self.submit()),
            KeyCode::Char(to_insert) => {
                self.enter_char(to_insert);
                InputOutcome::Redraw
            }
            KeyCode::Backspace => {
                if self.cursor_position == 0 {
                    return InputOutcome::Unchanged;
                }
                self.cursor_position -= 1;
                self.delete_char_at_cursor();
                InputOutcome::Redraw
            }
            KeyCode::Delete => self.delete_char_at_cursor(),
            KeyCode::Left => self.move_cursor_to(self.cursor_position.saturating_sub(1)),
            KeyCode::Right => self.move_cursor_to(self.cursor_position.saturating_add(1)),
            KeyCode::Home => self.move_cursor_to(0),
            KeyCode::End => self.move_cursor_to(usize::MAX),
            KeyCode::Up => self.history_previous(),
            KeyCode::Down => self.history_next(),
            KeyCode::Tab => self.complete(),
            _ => InputOutcome::Unchanged,
        }
    }

    fn move_cursor_to(&mut self, new_cursor_pos: usize) -> InputOutcome {
        let clamped = self.clamp_cursor(new_cursor_pos);
        if clamped == self.cursor_position {
            return InputOutcome::Unchanged;
        }

        self.cursor_position = clamped;
        InputOutcome::Redraw
    }

    fn enter_char(&mut self, new_char: char) {
        let byte_index = self
            .text
            .char_indices()
            .nth(self.cursor_position)
            .map(|(index, _)| index)
            .unwrap_or(self.text.len());
        self.text.insert(byte_index, new_char);

        self.cursor_position += 1;
    }

    fn delete_char_at_cursor(&mut self) -> InputOutcome {
        if self.cursor_position >= self.text.chars().count() {
            return InputOutcome::Unchanged;
        }

        // String::remove works on bytes, rebuild from chars to stay on char boundaries
        let before = self.text.chars().take(self.cursor_position);
        let after = self.text.chars().skip(self.cursor_position + 1);
        self.text = before.chain(after).collect();

        InputOutcome::Redraw
    }

    fn clamp_cursor(&self, new_cursor_pos: usize) -> usize {
        new_cursor_pos.clamp(0, self.text.chars().count())
    }

    fn submit(&mut self) -> String {
        let line = std::mem::take(&mut self.text);
        self.cursor_position = 0;
        self.history_index = None;

        let repeated = self.history.iter().next() == Some(&line);
        if !line.trim().is_empty() && !repeated {
            self.history.push(line.clone());
        }

        line
    }

    fn history_previous(&mut self) -> InputOutcome {
        let index = self.history_index.map_or(0, |index| index + 1);

        match self.history.iter().nth(index).cloned() {
            Some(line) => {
                self.set_text(&line);
                self.history_index = Some(index);
                InputOutcome::Redraw
            }
            None => InputOutcome::Unchanged,
        }
    }

    fn history_next(&mut self) -> InputOutcome {
        match self.history_index {
            None => InputOutcome::Unchanged,
            Some(0) => {
                self.history_index = None;
                self.reset();
                InputOutcome::Redraw
            }
            Some(index) => {
                if let Some(line) = self.history.iter().nth(index - 1).cloned() {
                    self.set_text(&line);
                }
                self.history_index = Some(index - 1);
                InputOutcome::Redraw
            }
        }
    }

    fn complete(&mut self) -> InputOutcome {
        let candidates = command::complete(&self.text);

        if let [single] = candidates.as_slice() {
            self.set_text(single);
            return InputOutcome::Redraw;
        }

        let prefix = common_prefix(&candidates);
        if prefix.len() > self.text.len() && prefix.starts_with(self.text.as_str()) {
            self.set_text(prefix);
        }

        InputOutcome::Candidates(candidates)
    }
}

fn common_prefix<'a>(candidates: &[&'a str]) -> &'a str {
    let Some((first, rest)) = candidates.split_first() else {
        return "";
    };

    let mut length = first.len();
    for candidate in rest {
        length = first
            .char_indices()
            .zip(candidate.chars())
            .take_while(|((_, a), b)| a == b)
            .map(|((index, a), _)| index + a.len_utf8())
            .last()
            .unwrap_or(0)
            .min(length);
    }

    &first[..length]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(input_box: &mut InputBox, text: &str) {
        for c in text.chars() {
            input_box.handle_key_event(press(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_typing_and_submitting() {
        let mut input_box = InputBox::default();
        type_text(&mut input_box, "hello");

        assert_eq!(input_box.text(), "hello");
        assert_eq!(
            input_box.handle_key_event(press(KeyCode::Enter)),
            InputOutcome::Submit("hello".into())
        );
        assert_eq!(input_box.text(), "");
        assert_eq!(input_box.cursor_position(), 0);
    }

    #[test]
    fn test_editing_multibyte_text() {
        let mut input_box = InputBox::default();
        type_text(&mut input_box, "héllo");
        input_box.handle_key_event(press(KeyCode::Left));
        input_box.handle_key_event(press(KeyCode::Left));
        input_box.handle_key_event(press(KeyCode::Left));
        input_box.handle_key_event(press(KeyCode::Backspace));
        type_text(&mut input_box, "e");

        assert_eq!(input_box.text(), "hello");
        assert_eq!(input_box.cursor_position(), 2);

        input_box.handle_key_event(press(KeyCode::Home));
        input_box.handle_key_event(press(KeyCode::Delete));
        assert_eq!(input_box.text(), "ello");
    }

    #[test]
    fn test_history_navigation() {
        let mut input_box = InputBox::default();
        for line in ["first", "second"] {
            type_text(&mut input_box, line);
            input_box.handle_key_event(press(KeyCode::Enter));
        }

        input_box.handle_key_event(press(KeyCode::Up));
        assert_eq!(input_box.text(), "second");
        input_box.handle_key_event(press(KeyCode::Up));
        assert_eq!(input_box.text(), "first");
        assert_eq!(
            input_box.handle_key_event(press(KeyCode::Up)),
            InputOutcome::Unchanged
        );
        input_box.handle_key_event(press(KeyCode::Down));
        assert_eq!(input_box.text(), "second");
        input_box.handle_key_event(press(KeyCode::Down));
        assert_eq!(input_box.text(), "");
    }

    #[test]
    fn test_tab_completes_single_match() {
        let mut input_box = InputBox::default();
        type_text(&mut input_box, "/j");

        assert_eq!(
            input_box.handle_key_event(press(KeyCode::Tab)),
            InputOutcome::Redraw
        );
        assert_eq!(input_box.text(), "/join ");
        assert_eq!(input_box.cursor_position(), 6);
    }

    #[test]
    fn test_tab_lists_several_matches() {
        let mut input_box = InputBox::default();
        type_text(&mut input_box, "/m");

        assert_eq!(
            input_box.handle_key_event(press(KeyCode::Tab)),
            InputOutcome::Candidates(vec!["/members", "/more "])
        );
        assert_eq!(input_box.text(), "/m");

        input_box.reset();
        type_text(&mut input_box, "/mo");
        input_box.handle_key_event(press(KeyCode::Tab));
        assert_eq!(input_box.text(), "/more ");
    }

    #[test]
    fn test_tab_without_match_lists_everything() {
        let mut input_box = InputBox::default();
        type_text(&mut input_box, "hi");

        assert_eq!(
            input_box.handle_key_event(press(KeyCode::Tab)),
            InputOutcome::Candidates(command::COMPLETIONS.to_vec())
        );
        assert_eq!(input_box.text(), "hi");
    }

    #[test]
    fn test_control_keys() {
        let mut input_box = InputBox::default();
        assert_eq!(input_box.handle_key_event(ctrl('d')), InputOutcome::EndOfInput);

        type_text(&mut input_box, "abc");
        assert_eq!(input_box.handle_key_event(ctrl('d')), InputOutcome::Unchanged);
        assert_eq!(input_box.handle_key_event(ctrl('c')), InputOutcome::Interrupt);
        input_box.handle_key_event(ctrl('u'));
        assert_eq!(input_box.text(), "");
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix(&["/members", "/more "]), "/m");
        assert_eq!(common_prefix(&["/help", "/join "]), "/");
        assert_eq!(common_prefix(&[]), "");
    }
}
