/// Where the processor stands relative to the block grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockPhase {
    /// Next sample starts a block; reconfiguration runs first.
    Boundary,
    /// Inside a block, `position` samples already dispatched.
    Streaming { position: usize },
}

/// Counts samples through a fixed-size block. Starts at the boundary so the
/// very first sample reconfigures.
#[derive(Clone, Debug)]
pub struct BlockClock {
    position: usize,
    block_size: usize,
}

impl BlockClock {
    pub fn new(block_size: usize) -> Self {
        let block_size = block_size.max(1);
        Self {
            position: block_size,
            block_size,
        }
    }

    pub fn phase(&self) -> BlockPhase {
        if self.position >= self.block_size {
            BlockPhase::Boundary
        } else {
            BlockPhase::Streaming {
                position: self.position,
            }
        }
    }

    pub fn at_boundary(&self) -> bool {
        self.phase() == BlockPhase::Boundary
    }

    pub fn start_block(&mut self) {
        self.position = 0;
    }

    pub fn advance(&mut self) {
        self.position += 1;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }
}
