use crate::pushdown::error::{DpdaError, Result};
use crate::pushdown::symbol::Symbol;

/// Index of a cell in the tape arena.
type CellId = usize;

#[derive(Debug, Clone)]
struct Cell {
    symbol: Symbol,
    // Neighbour closer to the top of the tape.
    above: Option<CellId>,
    // Neighbour closer to the bottom marker.
    below: Option<CellId>,
}

/// The deep-access pushdown.
///
/// Symbols live in an arena of doubly linked cells (the tape). A second,
/// vector-backed index lists the cells that still hold a pending
/// nonterminal or the bottom marker, ordered bottom-to-top, so the entry at
/// depth `d` is `pending[len - d]`. The arena owns every cell; the index only
/// stores cell ids.
#[derive(Debug, Clone)]
pub struct DepthStack {
    cells: Vec<Cell>,
    free: Vec<CellId>,
    top: Option<CellId>,
    len: usize,
    pending: Vec<CellId>,
}

impl DepthStack {
    /// Creates the initial pushdown `[start, #]` (top first).
    pub fn new(start: Symbol) -> Self {
        let mut stack = DepthStack {
            cells: Vec::new(),
            free: Vec::new(),
            top: None,
            len: 0,
            pending: Vec::new(),
        };
        stack.push(Symbol::bottom());
        stack.push(start);
        stack
    }

    /// Pushes a symbol on top of the tape. Only used while initialising.
    pub fn push(&mut self, symbol: Symbol) {
        let pending = symbol.is_pending();
        let below = self.top;
        let id = self.alloc(symbol, None, below);
        self.link(Some(id), below);
        self.top = Some(id);
        self.len += 1;
        if pending {
            self.pending.push(id);
        }
    }

    /// Returns the pending symbol at the given 1-based depth.
    pub fn pending_at(&self, depth: usize) -> Result<&Symbol> {
        let slot = self.slot(depth)?;
        Ok(&self.cells[self.pending[slot]].symbol)
    }

    /// Expands the pending symbol at `depth` into `replacement`.
    ///
    /// Returns `Ok(false)` without touching the stack when the symbol found
    /// at `depth` is not `from`. The first replacement symbol ends up closest
    /// to the top, and pending symbols of the replacement take the depth
    /// slot of the expanded symbol in left-to-right order.
    pub fn expand(&mut self, depth: usize, from: &Symbol, replacement: &[Symbol]) -> Result<bool> {
        let slot = self.slot(depth)?;
        let target = self.pending[slot];
        if self.cells[target].symbol != *from {
            return Ok(false);
        }

        let above = self.cells[target].above;
        let below = self.cells[target].below;

        let mut previous = above;
        let mut inserted = Vec::new();
        for symbol in replacement {
            let pending = symbol.is_pending();
            let id = self.alloc(symbol.clone(), previous, None);
            self.link(previous, Some(id));
            if pending {
                inserted.push(id);
            }
            previous = Some(id);
        }
        self.link(previous, below);
        self.free.push(target);
        self.len = self.len - 1 + replacement.len();

        // The index runs bottom-to-top, so the leftmost (shallowest) new
        // entry has to be inserted last.
        self.pending.splice(slot..=slot, inserted.into_iter().rev());
        Ok(true)
    }

    /// Pops the top of the tape if it is a terminal.
    ///
    /// A nonterminal or the bottom marker on top is left in place and `None`
    /// is returned, so the pending index never refers to a removed cell.
    pub fn pop_terminal(&mut self) -> Option<Symbol> {
        let top = self.top?;
        if !self.cells[top].symbol.is_terminal() {
            return None;
        }
        let below = self.cells[top].below;
        self.link(None, below);
        self.len -= 1;
        self.free.push(top);
        Some(self.cells[top].symbol.clone())
    }

    /// The top of the tape.
    pub fn peek(&self) -> Option<&Symbol> {
        self.top.map(|id| &self.cells[id].symbol)
    }

    /// True when the only pending symbol left is the bottom marker.
    pub fn expansion_complete(&self) -> bool {
        self.pending.len() == 1 && self.cells[self.pending[0]].symbol.is_bottom()
    }

    /// True when nothing but the bottom marker is left on the tape.
    pub fn tape_exhausted(&self) -> bool {
        matches!(self.peek(), Some(symbol) if symbol.is_bottom())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn tape_len(&self) -> usize {
        self.len
    }

    /// Tape symbols from the top down to the bottom marker.
    pub fn tape(&self) -> impl Iterator<Item = &Symbol> + '_ {
        std::iter::successors(self.top, move |&id| self.cells[id].below)
            .map(move |id| &self.cells[id].symbol)
    }

    /// Pending symbols ordered by depth (depth 1 first).
    pub fn pending(&self) -> impl Iterator<Item = &Symbol> + '_ {
        self.pending.iter().rev().map(move |&id| &self.cells[id].symbol)
    }

    fn slot(&self, depth: usize) -> Result<usize> {
        let pending = self.pending.len();
        if depth == 0 || depth > pending {
            return Err(DpdaError::DepthOutOfRange { depth, pending });
        }
        Ok(pending - depth)
    }

    fn alloc(&mut self, symbol: Symbol, above: Option<CellId>, below: Option<CellId>) -> CellId {
        let cell = Cell { symbol, above, below };
        match self.free.pop() {
            Some(id) => {
                self.cells[id] = cell;
                id
            }
            None => {
                self.cells.push(cell);
                self.cells.len() - 1
            }
        }
    }

    // Makes `lower` the neighbour directly below `upper`; `None` as upper
    // means `lower` becomes the top of the tape.
    fn link(&mut self, upper: Option<CellId>, lower: Option<CellId>) {
        match upper {
            Some(id) => self.cells[id].below = lower,
            None => self.top = lower,
        }
        if let Some(id) = lower {
            self.cells[id].above = upper;
        }
    }
}
