//! Fluent backtracking matcher used by the lexer's grammar resolvers.
//!
//! A [`Matcher`] records a checkpoint when it is created and then runs a
//! chain of steps. The first failing step marks the chain as failed, rewinds
//! the *cursor* to where the chain started and turns every later step into a
//! no-op. Auxiliary scanner state (tokens, nesting level) is left untouched:
//! the owner of the chain decides whether to roll it back, usually with
//! [`Matcher::rollback_on_failure`]. Keeping that decision with the owner lets
//! sibling alternatives share an already-resolved prefix.

use crate::cursor::{Backtrack, Cursor, CursorState};
use crate::diagnostic::Span;
use std::marker::PhantomData;

/// A scanner is a cursor plus whatever state travels with it.
pub trait Scanner<'src>: Backtrack {
    fn cursor(&self) -> &Cursor<'src>;
    fn cursor_mut(&mut self) -> &mut Cursor<'src>;
}

impl<'src> Scanner<'src> for Cursor<'src> {
    fn cursor(&self) -> &Cursor<'src> {
        self
    }

    fn cursor_mut(&mut self) -> &mut Cursor<'src> {
        self
    }
}

#[must_use = "a matcher does nothing until its result is inspected"]
pub struct Matcher<'m, 'src, S: Scanner<'src>> {
    scanner: &'m mut S,
    start: S::Checkpoint,
    cursor_start: CursorState,
    record_start: usize,
    ok: bool,
    _source: PhantomData<&'src str>,
}

impl<'m, 'src, S: Scanner<'src>> Matcher<'m, 'src, S> {
    pub fn new(scanner: &'m mut S) -> Self {
        let start = scanner.checkpoint();
        let cursor_start = scanner.cursor().checkpoint();
        Self {
            scanner,
            start,
            cursor_start,
            record_start: cursor_start.position,
            ok: true,
            _source: PhantomData,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn matched(self) -> bool {
        self.ok
    }

    fn settle(mut self, ok: bool) -> Self {
        self.ok = ok;
        if !ok {
            self.scanner.cursor_mut().rollback(self.cursor_start);
        }
        self
    }

    /// Match one exact piece of text.
    pub fn literal(self, literal: &str) -> Self {
        if !self.ok {
            return self;
        }
        let ok = self.scanner.cursor_mut().eat(literal);
        self.settle(ok)
    }

    /// Match the first of `literals` the input continues with.
    pub fn any_literal(self, literals: &[&str]) -> Self {
        if !self.ok {
            return self;
        }
        let ok = literals
            .iter()
            .any(|literal| self.scanner.cursor_mut().eat(literal));
        self.settle(ok)
    }

    pub fn any_char(self, predicate: impl Fn(char) -> bool) -> Self {
        if !self.ok {
            return self;
        }
        let ok = self.scanner.cursor_mut().eat_if(predicate);
        self.settle(ok)
    }

    pub fn zero_or_more_chars(self, predicate: impl Fn(char) -> bool) -> Self {
        if self.ok {
            while self.scanner.cursor_mut().eat_if(&predicate) {}
        }
        self
    }

    pub fn one_or_more_chars(self, predicate: impl Fn(char) -> bool) -> Self {
        self.any_char(&predicate).zero_or_more_chars(predicate)
    }

    /// Run a sub-rule; the chain fails if it reports `false`.
    pub fn assert(self, predicate: impl FnOnce(&mut S) -> bool) -> Self {
        if !self.ok {
            return self;
        }
        let ok = predicate(&mut *self.scanner);
        self.settle(ok)
    }

    /// Run a sub-rule until it stops matching. Never fails.
    pub fn assert_zero_or_more(self, mut predicate: impl FnMut(&mut S) -> bool) -> Self {
        if self.ok {
            while predicate(&mut *self.scanner) {}
        }
        self
    }

    pub fn assert_one_or_more(self, mut predicate: impl FnMut(&mut S) -> bool) -> Self {
        self.assert(&mut predicate).assert_zero_or_more(predicate)
    }

    pub fn perform(self, action: impl FnOnce(&mut S)) -> Self {
        if self.ok {
            action(&mut *self.scanner);
        }
        self
    }

    /// Start capturing text at the current position for a later `collect`.
    pub fn record(mut self) -> Self {
        if self.ok {
            self.record_start = self.scanner.cursor().position();
        }
        self
    }

    /// Hand the text captured since `record` (or since the chain began) to
    /// `consumer`, which may still reject it.
    pub fn collect(self, consumer: impl FnOnce(&mut S, &'src str, Span) -> bool) -> Self {
        if !self.ok {
            return self;
        }
        let cursor = self.scanner.cursor();
        let text = cursor.slice_from(self.record_start);
        let span = cursor.span_from(self.record_start);
        let ok = consumer(&mut *self.scanner, text, span);
        self.settle(ok)
    }

    pub fn on_failure(self, cleanup: impl FnOnce(&mut S, S::Checkpoint)) -> Self {
        if !self.ok {
            cleanup(&mut *self.scanner, self.start);
        }
        self
    }

    /// Restore the whole scanner (not just its cursor) if the chain failed.
    pub fn rollback_on_failure(self) -> Self {
        self.on_failure(|scanner, checkpoint| scanner.rollback(checkpoint))
    }
}

impl<'src, S: Scanner<'src>> From<Matcher<'_, 'src, S>> for bool {
    fn from(matcher: Matcher<'_, 'src, S>) -> bool {
        matcher.matched()
    }
}
