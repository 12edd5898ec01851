//! On-disk interchange format for an `n x n` travel-time matrix.
//!
//! Replaces the source's opaque pickle blob (spec.md §9,
//! `original_source/store_n_load.py`) with a small tagged, length-prefixed
//! binary format: this module only defines and (de)serializes that format —
//! building the matrix from a mapping-service API
//! (`original_source/travel_matrix.py`) remains an external collaborator,
//! out of scope (spec.md §1).
//!
//! Layout: 4-byte magic `b"CVTM"`, `u32` format version, `u32` n, then
//! `n * n` little-endian `f64`s in row-major order.

use crate::error::TravelMatrixIoError;
use std::io::{Read, Write};

const MAGIC: [u8; 4] = *b"CVTM";
const VERSION: u32 = 1;

/// Writes `matrix` (must be square) to `w` in the `CVTM` format.
pub fn write_travel_matrix<W: Write>(w: &mut W, matrix: &[Vec<f64>]) -> Result<(), TravelMatrixIoError> {
    let n = matrix.len();
    if let Some(bad) = matrix.iter().find(|row| row.len() != n) {
        return Err(TravelMatrixIoError::NotSquare {
            n: n as u32,
            actual: bad.len() as u64,
        });
    }

    w.write_all(&MAGIC)?;
    w.write_all(&VERSION.to_le_bytes())?;
    w.write_all(&(n as u32).to_le_bytes())?;
    for row in matrix {
        for &value in row {
            w.write_all(&value.to_le_bytes())?;
        }
    }
    Ok(())
}

/// Reads an `n x n` travel-time matrix previously written by
/// [`write_travel_matrix`].
pub fn read_travel_matrix<R: Read>(r: &mut R) -> Result<Vec<Vec<f64>>, TravelMatrixIoError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(TravelMatrixIoError::BadMagic(magic));
    }

    let mut buf4 = [0u8; 4];
    r.read_exact(&mut buf4)?;
    let version = u32::from_le_bytes(buf4);
    if version != VERSION {
        return Err(TravelMatrixIoError::UnsupportedVersion(version));
    }

    r.read_exact(&mut buf4)?;
    let n = u32::from_le_bytes(buf4) as usize;

    let mut buf8 = [0u8; 8];
    let mut matrix = vec![vec![0.0; n]; n];
    for row in matrix.iter_mut() {
        for cell in row.iter_mut() {
            r.read_exact(&mut buf8)?;
            *cell = f64::from_le_bytes(buf8);
        }
    }
    Ok(matrix)
}
