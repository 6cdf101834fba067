use crate::error::ParseError;
use crate::span::Span;

/// The range a committed checkpoint covered, and the text inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalContext<'s> {
    pub span: Span,
    pub text: &'s str,
}

/// A checkpoint on the cursor's stack.
#[derive(Debug, Clone, Copy)]
struct Mark {
    /// Position when the mark was taken; `rewind()` returns here.
    origin: usize,
    /// Consumption under this mark is not folded into the enclosing mark.
    skipping: bool,
    /// Union of everything consumed (and not skipped) since the mark.
    included: Option<Span>,
}

/// A backtracking scan position over a source string.
///
/// Positions are byte offsets that always sit on `char` boundaries; one unit
/// of input is one `char`. Speculative matching is expressed with a stack of
/// checkpoints: every [`mark`](Cursor::mark) is paired with exactly one
/// [`commit`](Cursor::commit) or [`rewind`](Cursor::rewind).
#[derive(Debug, Clone)]
pub struct Cursor<'s> {
    source: &'s str,
    position: usize,
    marks: Vec<Mark>,
}

impl<'s> Cursor<'s> {
    /// Creates a new cursor at the start of `source`.
    pub fn new(source: &'s str) -> Self {
        Self {
            source,
            position: 0,
            marks: Vec::new(),
        }
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns true if all input has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    /// The unconsumed tail of the source.
    pub fn remaining(&self) -> &'s str {
        self.source.get(self.position..).unwrap_or("")
    }

    /// Peeks at the current character without advancing.
    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Number of open checkpoints.
    pub fn depth(&self) -> usize {
        self.marks.len()
    }

    /// Pushes a checkpoint at the current position.
    ///
    /// When `skipping_range` is set, whatever is consumed before the matching
    /// `commit()` is excluded from the enclosing checkpoint's range.
    pub fn mark(&mut self, skipping_range: bool) {
        self.marks.push(Mark {
            origin: self.position,
            skipping: skipping_range,
            included: None,
        });
    }

    /// Consumes exactly one character.
    pub fn advance_one(&mut self) -> Result<char, ParseError> {
        let c = self
            .peek()
            .ok_or_else(|| ParseError::scanning(self.position, "any character"))?;
        self.advance_by(c.len_utf8());
        Ok(c)
    }

    /// Consumes `len` bytes. `len` must end on a `char` boundary and stay
    /// within the source.
    pub fn advance_by(&mut self, len: usize) {
        let end = self.position + len;
        debug_assert!(
            self.source.is_char_boundary(end),
            "advance_by({len}) from {} splits a character",
            self.position
        );
        if len > 0 {
            self.include(Span::new(self.position, end));
        }
        self.position = end;
    }

    /// Pops the top checkpoint and returns the range consumed since it was
    /// taken. The position does not move.
    ///
    /// Unless the checkpoint was skipping, its range is folded into the new
    /// top checkpoint so nested commits compose.
    ///
    /// # Panics
    ///
    /// Panics if there is no open checkpoint.
    pub fn commit(&mut self) -> LexicalContext<'s> {
        let Some(mark) = self.marks.pop() else {
            panic!("Cursor::commit() without a matching mark()");
        };
        if let (Some(included), false) = (mark.included, mark.skipping) {
            self.include(included);
        }
        let span = mark.included.unwrap_or(Span::empty(self.position));
        LexicalContext {
            span,
            text: span.slice(self.source),
        }
    }

    /// Pops the top checkpoint and restores the position it recorded,
    /// discarding everything consumed since.
    ///
    /// # Panics
    ///
    /// Panics if there is no open checkpoint.
    pub fn rewind(&mut self) {
        let Some(mark) = self.marks.pop() else {
            panic!("Cursor::rewind() without a matching mark()");
        };
        self.position = mark.origin;
    }

    fn include(&mut self, span: Span) {
        if let Some(top) = self.marks.last_mut() {
            top.included = Some(match top.included {
                Some(existing) => existing.cover(span),
                None => span,
            });
        }
    }
}
