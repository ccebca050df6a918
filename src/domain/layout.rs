//! Block bounds computed once per run.
//!
//! Every later stage slices matrices by these spans rather than by positional
//! convention. Three column spaces are tracked:
//!
//! - sample columns: `X1 | X2 | X3 | Y`
//! - input vectors (one Psi column each): `X1 | X2 | X3`
//! - basis columns of `A`: block-major, then vector-within-block, then degree

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::domain::types::{BlockDims, Degrees};
use crate::error::IdentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockId {
    X1,
    X2,
    X3,
    Y,
}

impl BlockId {
    pub const INPUTS: [BlockId; 3] = [BlockId::X1, BlockId::X2, BlockId::X3];

    pub fn label(self) -> &'static str {
        match self {
            BlockId::X1 => "X1",
            BlockId::X2 => "X2",
            BlockId::X3 => "X3",
            BlockId::Y => "Y",
        }
    }
}

/// A half-open column range owned by one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSpan {
    pub block: BlockId,
    pub start: usize,
    pub end: usize,
}

impl BlockSpan {
    pub fn new(block: BlockId, start: usize, end: usize) -> Self {
        Self { block, start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Fail with a configuration error when the span has no columns.
    pub fn require_nonempty(&self, what: &str) -> Result<(), IdentError> {
        if self.is_empty() {
            return Err(IdentError::Configuration(format!(
                "block {} has an empty {what} slice",
                self.block.label()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLayout {
    columns: Vec<BlockSpan>,
    vectors: Vec<BlockSpan>,
    basis: Vec<BlockSpan>,
    /// Basis functions per input vector, per input block (`degree + 1`).
    functions: [usize; 3],
}

impl BlockLayout {
    /// Fails with a configuration error when any column count overflows.
    pub fn new(dims: BlockDims, degrees: Degrees) -> Result<Self, IdentError> {
        let overflow = |what: &str| {
            IdentError::Configuration(format!("{what} column count overflows for dims/degrees"))
        };
        let inputs = dims.inputs();
        let mut functions = [0usize; 3];
        for (slot, d) in functions.iter_mut().zip(degrees.as_array()) {
            *slot = d.checked_add(1).ok_or_else(|| overflow("basis"))?;
        }

        let mut columns = Vec::with_capacity(4);
        let mut vectors = Vec::with_capacity(3);
        let mut basis = Vec::with_capacity(3);

        let mut col = 0usize;
        let mut basis_col = 0usize;
        for (idx, block) in BlockId::INPUTS.into_iter().enumerate() {
            let col_end = col.checked_add(inputs[idx]).ok_or_else(|| overflow("sample"))?;
            let width = inputs[idx]
                .checked_mul(functions[idx])
                .ok_or_else(|| overflow("basis"))?;
            let basis_end = basis_col.checked_add(width).ok_or_else(|| overflow("basis"))?;
            columns.push(BlockSpan::new(block, col, col_end));
            vectors.push(BlockSpan::new(block, col, col_end));
            basis.push(BlockSpan::new(block, basis_col, basis_end));
            col = col_end;
            basis_col = basis_end;
        }
        let y_end = col.checked_add(dims.y).ok_or_else(|| overflow("sample"))?;
        columns.push(BlockSpan::new(BlockId::Y, col, y_end));

        Ok(Self {
            columns,
            vectors,
            basis,
            functions,
        })
    }

    /// Total sample columns (inputs and outputs).
    pub fn sample_columns(&self) -> usize {
        self.columns[3].end
    }

    /// Number of input vectors across the three blocks.
    pub fn input_vectors(&self) -> usize {
        self.vectors[2].end
    }

    pub fn output_columns(&self) -> usize {
        self.columns[3].len()
    }

    pub fn basis_columns(&self) -> usize {
        self.basis[2].end
    }

    /// Spans over the raw sample columns, `X1, X2, X3, Y`.
    pub fn column_spans(&self) -> &[BlockSpan] {
        &self.columns
    }

    pub fn output_span(&self) -> BlockSpan {
        self.columns[3]
    }

    /// Spans over the flattened input-vector index (Psi columns).
    pub fn vector_spans(&self) -> &[BlockSpan] {
        &self.vectors
    }

    /// Spans over the columns of the basis matrix `A`.
    pub fn basis_spans(&self) -> &[BlockSpan] {
        &self.basis
    }

    pub fn functions_per_vector(&self, block: BlockId) -> usize {
        match block {
            BlockId::X1 => self.functions[0],
            BlockId::X2 => self.functions[1],
            BlockId::X3 => self.functions[2],
            BlockId::Y => 0,
        }
    }

    /// Basis column range of every input vector, in flattened vector order.
    pub fn vector_basis_ranges(&self) -> Vec<(BlockId, Range<usize>)> {
        let mut out = Vec::with_capacity(self.input_vectors());
        for (vectors, basis) in self.vectors.iter().zip(self.basis.iter()) {
            let width = self.functions_per_vector(vectors.block);
            for k in 0..vectors.len() {
                let start = basis.start + k * width;
                out.push((vectors.block, start..start + width));
            }
        }
        out
    }

    pub fn validate(&self) -> Result<(), IdentError> {
        for span in &self.columns {
            span.require_nonempty("sample column")?;
        }
        for span in &self.basis {
            span.require_nonempty("basis")?;
        }
        Ok(())
    }
}
