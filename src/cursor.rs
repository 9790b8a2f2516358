use crate::diagnostic::Span;

/// Anything whose state can be saved and later restored while backtracking.
///
/// Checkpoints are rollback-only: restoring a checkpoint taken after the
/// current state is a logic error.
pub trait Backtrack {
    type Checkpoint: Copy;

    fn checkpoint(&self) -> Self::Checkpoint;
    fn rollback(&mut self, checkpoint: Self::Checkpoint);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorState {
    pub position: usize,
    pub line: usize,
    pub column: usize,
}

impl CursorState {
    pub fn start() -> Self {
        Self { position: 0, line: 1, column: 1 }
    }
}

/// Positional view over source text with line/column tracking.
///
/// Positions are byte offsets into the source; `advance` always moves by a
/// whole character.
#[derive(Debug, Clone)]
pub struct Cursor<'src> {
    source: &'src str,
    state: CursorState,
    furthest: CursorState,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            state: CursorState::start(),
            furthest: CursorState::start(),
        }
    }

    pub fn at_end(&self) -> bool {
        self.state.position >= self.source.len()
    }

    pub fn position(&self) -> usize {
        self.state.position
    }

    pub fn line(&self) -> usize {
        self.state.line
    }

    pub fn column(&self) -> usize {
        self.state.column
    }

    /// The furthest point the cursor ever reached. Rolling back does not
    /// lower it, which makes it a good guess for where lexing got stuck.
    pub fn furthest(&self) -> CursorState {
        self.furthest
    }

    fn rest(&self) -> &'src str {
        &self.source[self.state.position..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.rest().chars().nth(offset)
    }

    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.state.position += c.len_utf8();
        if c == '\n' {
            self.state.line += 1;
            self.state.column = 1;
        } else {
            self.state.column += 1;
        }
        if self.state.position > self.furthest.position {
            self.furthest = self.state;
        }
        Some(c)
    }

    pub fn matches(&self, literal: &str) -> bool {
        self.rest().starts_with(literal)
    }

    /// Advance past `literal` if the input continues with it.
    pub fn eat(&mut self, literal: &str) -> bool {
        if !self.matches(literal) {
            return false;
        }
        for _ in literal.chars() {
            self.advance();
        }
        true
    }

    /// Advance one character if it satisfies `predicate`.
    pub fn eat_if(&mut self, predicate: impl Fn(char) -> bool) -> bool {
        match self.peek() {
            Some(c) if predicate(c) => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    /// Source text between `start` and the current position.
    pub fn slice_from(&self, start: usize) -> &'src str {
        &self.source[start.min(self.state.position)..self.state.position]
    }

    pub fn span_from(&self, start: usize) -> Span {
        Span::new(start, self.state.position)
    }
}

impl Backtrack for Cursor<'_> {
    type Checkpoint = CursorState;

    fn checkpoint(&self) -> CursorState {
        self.state
    }

    fn rollback(&mut self, checkpoint: CursorState) {
        debug_assert!(checkpoint.position <= self.state.position);
        self.state = checkpoint;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_tracks_lines_and_columns() {
        let mut cursor = Cursor::new("ab\ncd");
        assert_eq!(cursor.advance(), Some('a'));
        assert_eq!(cursor.advance(), Some('b'));
        assert_eq!((cursor.line(), cursor.column()), (1, 3));
        assert_eq!(cursor.advance(), Some('\n'));
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
        assert_eq!(cursor.advance(), Some('c'));
        assert_eq!((cursor.line(), cursor.column()), (2, 2));
    }

    #[test]
    fn test_peek_never_leaves_the_input() {
        let mut cursor = Cursor::new("x");
        assert_eq!(cursor.peek_at(1), None);
        cursor.advance();
        assert!(cursor.at_end());
        assert_eq!(cursor.peek(), None);
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn test_rollback_restores_position_but_not_furthest() {
        let mut cursor = Cursor::new("hello\nworld");
        let saved = cursor.checkpoint();
        assert!(cursor.eat("hello\nwo"));
        assert_eq!(cursor.line(), 2);
        cursor.rollback(saved);
        assert_eq!(cursor.checkpoint(), CursorState::start());
        assert_eq!(cursor.furthest().position, 8);
        assert_eq!(cursor.furthest().line, 2);
    }

    #[test]
    fn test_eat_leaves_cursor_alone_on_mismatch() {
        let mut cursor = Cursor::new("print");
        assert!(!cursor.eat("prints"));
        assert_eq!(cursor.position(), 0);
        assert!(cursor.eat_if(|c| c == 'p'));
        assert_eq!(cursor.slice_from(0), "p");
    }
}
