use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Single-line edit buffer. The cursor counts characters, not bytes.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    content: String,
    cursor_position: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an editing key. Returns whether the buffer or cursor changed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('a') => self.move_to_start(),
                KeyCode::Char('e') => self.move_to_end(),
                KeyCode::Char('b') => self.move_cursor_left(),
                KeyCode::Char('f') => self.move_cursor_right(),
                KeyCode::Char('h') => self.delete_char(),
                KeyCode::Char('u') => self.clear_before_cursor(),
                _ => false,
            };
        }

        match key.code {
            KeyCode::Char(c) => {
                self.insert_char(c);
                true
            }
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Delete => self.delete_char_forward(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Home => self.move_to_start(),
            KeyCode::End => self.move_to_end(),
            _ => false,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    /// Replace the whole line and put the cursor at its end.
    pub fn set(&mut self, content: &str) {
        self.content = content.to_string();
        self.cursor_position = self.char_count();
    }

    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| !c.is_control()) {
            self.insert_char(c);
        }
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor_position = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn len(&self) -> usize {
        self.char_count()
    }

    fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.content.len())
    }

    fn insert_char(&mut self, c: char) {
        let offset = self.byte_offset(self.cursor_position);
        self.content.insert(offset, c);
        self.cursor_position += 1;
    }

    fn delete_char(&mut self) -> bool {
        if self.cursor_position == 0 {
            return false;
        }
        self.cursor_position -= 1;
        let offset = self.byte_offset(self.cursor_position);
        self.content.remove(offset);
        true
    }

    fn delete_char_forward(&mut self) -> bool {
        if self.cursor_position >= self.char_count() {
            return false;
        }
        let offset = self.byte_offset(self.cursor_position);
        self.content.remove(offset);
        true
    }

    fn clear_before_cursor(&mut self) -> bool {
        if self.cursor_position == 0 {
            return false;
        }
        let offset = self.byte_offset(self.cursor_position);
        self.content.drain(..offset);
        self.cursor_position = 0;
        true
    }

    fn move_cursor_left(&mut self) -> bool {
        if self.cursor_position == 0 {
            return false;
        }
        self.cursor_position -= 1;
        true
    }

    fn move_cursor_right(&mut self) -> bool {
        if self.cursor_position >= self.char_count() {
            return false;
        }
        self.cursor_position += 1;
        true
    }

    fn move_to_start(&mut self) -> bool {
        let moved = self.cursor_position != 0;
        self.cursor_position = 0;
        moved
    }

    fn move_to_end(&mut self) -> bool {
        let end = self.char_count();
        let moved = self.cursor_position != end;
        self.cursor_position = end;
        moved
    }
}

impl std::fmt::Display for InputBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_str(buffer: &mut InputBuffer, text: &str) {
        for c in text.chars() {
            buffer.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_insert_and_backspace_multibyte() {
        let mut buffer = InputBuffer::new();
        type_str(&mut buffer, "héllo");
        assert_eq!(buffer.cursor_position(), 5);

        buffer.handle_key(key(KeyCode::Left));
        buffer.handle_key(key(KeyCode::Left));
        buffer.handle_key(key(KeyCode::Left));
        buffer.handle_key(key(KeyCode::Backspace));
        assert_eq!(buffer.content(), "hllo");
        assert_eq!(buffer.cursor_position(), 1);

        buffer.handle_key(key(KeyCode::Char('ü')));
        assert_eq!(buffer.content(), "hüllo");
    }

    #[test]
    fn test_delete_forward_and_bounds() {
        let mut buffer = InputBuffer::new();
        type_str(&mut buffer, "ab");
        assert!(!buffer.handle_key(key(KeyCode::Delete)));
        assert!(!buffer.handle_key(key(KeyCode::Right)));

        buffer.handle_key(key(KeyCode::Home));
        assert!(buffer.handle_key(key(KeyCode::Delete)));
        assert_eq!(buffer.content(), "b");
        assert!(!buffer.handle_key(key(KeyCode::Backspace)));
    }

    #[test]
    fn test_ctrl_u_clears_before_cursor() {
        let mut buffer = InputBuffer::new();
        type_str(&mut buffer, "reset now");
        for _ in 0..3 {
            buffer.handle_key(key(KeyCode::Left));
        }
        assert!(buffer.handle_key(ctrl('u')));
        assert_eq!(buffer.content(), "now");
        assert_eq!(buffer.cursor_position(), 0);
    }

    #[test]
    fn test_control_chords_do_not_insert() {
        let mut buffer = InputBuffer::new();
        assert!(!buffer.handle_key(ctrl('x')));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_set_and_insert_str() {
        let mut buffer = InputBuffer::new();
        buffer.set("status");
        assert_eq!(buffer.cursor_position(), 6);
        buffer.insert_str(" all\n");
        assert_eq!(buffer.content(), "status all");
        assert_eq!(buffer.len(), 10);
    }
}
