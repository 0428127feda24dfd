/// Forward-only cursor over the lines of a diff.
///
/// `peek(n)` looks `n` lines past the current position without moving;
/// `consume(n)` moves past `n` lines. The parser never rewinds.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    /// Index of the current line in the input
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn peek(&self, n: usize) -> Option<&'a str> {
        self.lines.get(self.pos + n).copied()
    }

    /// Advance past `n` lines, clamped to the end of input
    pub fn consume(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.lines.len());
    }

    /// Return the current line and advance past it
    pub fn next_line(&mut self) -> Option<&'a str> {
        let line = self.peek(0)?;
        self.consume(1);
        Some(line)
    }

    /// Offset of the first line at or after `from` that `skip` rejects
    pub fn find_from(&self, from: usize, skip: impl Fn(&str) -> bool) -> Option<usize> {
        (from..)
            .map_while(|n| self.peek(n).map(|line| (n, line)))
            .find(|(_, line)| !skip(line))
            .map(|(n, _)| n)
    }
}
