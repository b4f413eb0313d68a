use super::*;
use crate::algebra::*;
use crate::DssError;
use std::io::{BufRead, BufReader, Read, Write};

/// On disk layout used by [`save_matrix`](SparseMatrixView::save_matrix)
/// and [`load_matrix`](SparseMatrixView::load_matrix).
///
/// Neither format is versioned.  The binary format uses native byte
/// order and is not portable between platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixFileFormat {
    /// `u64 neq`, `u64 nnz`, `u8 orientation`, `(neq+1) x u64` offsets,
    /// `nnz x u64` indices, `nnz x f64` values
    Binary,
    /// header line `neq nnz orientation`, then one line each of offsets,
    /// indices and values
    Text,
}

impl<'a, T> SparseMatrixView<'a, T>
where
    T: FloatT,
{
    /// Writes the view to `out`.  A failed write leaves partial output.
    pub fn save_matrix<W: Write>(&self, out: &mut W, format: MatrixFileFormat) -> Result<(), DssError> {
        let neq = self.neq();
        let nnz = self.nonzeros();
        let offsets = (0..=neq).map(|i| self.adr(i) as u64);
        let indices = (0..nnz).map(|k| self.ci(k) as u64);
        let values = self.values().iter().map(|v| v.to_f64().unwrap_or(f64::NAN));

        match format {
            MatrixFileFormat::Binary => {
                out.write_all(&(neq as u64).to_ne_bytes())?;
                out.write_all(&(nnz as u64).to_ne_bytes())?;
                out.write_all(&[self.orientation().code()])?;
                for o in offsets {
                    out.write_all(&o.to_ne_bytes())?;
                }
                for i in indices {
                    out.write_all(&i.to_ne_bytes())?;
                }
                for v in values {
                    out.write_all(&v.to_ne_bytes())?;
                }
            }
            MatrixFileFormat::Text => {
                writeln!(out, "{} {} {}", neq, nnz, self.orientation().code())?;
                write_line(out, offsets)?;
                write_line(out, indices)?;
                let values: Vec<String> = values.map(|v| format!("{:e}", v)).collect();
                writeln!(out, "{}", values.join(" "))?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

impl<T> SparseMatrixView<'static, T>
where
    T: FloatT,
{
    /// Reads a view previously written by
    /// [`save_matrix`](SparseMatrixView::save_matrix) in the same format.
    pub fn load_matrix<R: Read>(input: &mut R, format: MatrixFileFormat) -> Result<Self, DssError> {
        let (neq, orientation, offsets, indices, values) = match format {
            MatrixFileFormat::Binary => read_binary(input)?,
            MatrixFileFormat::Text => read_text(input)?,
        };

        let values = values
            .into_iter()
            .map(|v| T::from_f64(v).ok_or(DssError::BadFile("value")))
            .collect::<Result<Vec<T>, _>>()?;

        Ok(Self::new(neq, orientation, offsets, indices, values)?)
    }
}

type RawMatrix = (usize, Orientation, Vec<usize>, Vec<usize>, Vec<f64>);

fn write_line<W: Write>(out: &mut W, items: impl Iterator<Item = u64>) -> std::io::Result<()> {
    let line: Vec<String> = items.map(|x| x.to_string()).collect();
    writeln!(out, "{}", line.join(" "))
}

fn read_u64<R: Read>(input: &mut R) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    input.read_exact(&mut buf)?;
    Ok(u64::from_ne_bytes(buf))
}

fn read_binary<R: Read>(input: &mut R) -> Result<RawMatrix, DssError> {
    let neq = read_u64(input)? as usize;
    let nnz = read_u64(input)? as usize;
    let mut code = [0u8; 1];
    input.read_exact(&mut code)?;
    let orientation = Orientation::from_code(code[0]).ok_or(DssError::BadFile("orientation"))?;

    let offsets = (0..=neq)
        .map(|_| read_u64(input).map(|x| x as usize))
        .collect::<Result<Vec<_>, _>>()?;
    let indices = (0..nnz)
        .map(|_| read_u64(input).map(|x| x as usize))
        .collect::<Result<Vec<_>, _>>()?;
    let values = (0..nnz)
        .map(|_| read_u64(input).map(f64::from_bits))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((neq, orientation, offsets, indices, values))
}

fn read_text<R: Read>(input: &mut R) -> Result<RawMatrix, DssError> {
    let mut lines = BufReader::new(input).lines();
    let mut next_line = |what: &'static str| -> Result<String, DssError> {
        lines.next().ok_or(DssError::BadFile(what))?.map_err(DssError::from)
    };

    let header: Vec<usize> = parse_line(&next_line("header")?, "header")?;
    let &[neq, nnz, code] = header.as_slice() else {
        return Err(DssError::BadFile("header"));
    };
    let orientation = u8::try_from(code)
        .ok()
        .and_then(Orientation::from_code)
        .ok_or(DssError::BadFile("orientation"))?;

    let offsets: Vec<usize> = parse_line(&next_line("offsets")?, "offsets")?;
    let indices: Vec<usize> = parse_line(&next_line("indices")?, "indices")?;
    let values: Vec<f64> = parse_line(&next_line("values")?, "values")?;

    let noffsets = neq.checked_add(1).ok_or(DssError::BadFile("header"))?;
    if offsets.len() != noffsets || indices.len() != nnz || values.len() != nnz {
        return Err(DssError::BadFile("array length"));
    }
    Ok((neq, orientation, offsets, indices, values))
}

fn parse_line<X: std::str::FromStr>(line: &str, what: &'static str) -> Result<Vec<X>, DssError> {
    line.split_whitespace()
        .map(|s| s.parse::<X>().map_err(|_| DssError::BadFile(what)))
        .collect()
}
