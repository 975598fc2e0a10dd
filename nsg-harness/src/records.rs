//! Reader and writer for header-prefixed binary record files.
//!
//! A file is a sequence of records. Each record is a little-endian `i32`
//! header followed by `header` elements of 4 bytes each. Vector files
//! (`.fvecs`) carry `f32` elements and the header is the dimension.
//! Groundtruth files (`.ivecs`) carry neighbor ids and the header is the
//! number of neighbors per query.
//!
//! The record count is never stored. It is inferred from the file size and
//! the stride of the first record.
use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    os::unix::fs::MetadataExt,
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{HarnessError, Result};

pub const ELEMENT_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// `f32` payload, header is the vector dimension.
    Vectors,
    /// `u32` payload, header is the neighbor count (`top_k`).
    Groundtruth,
}

impl RecordKind {
    pub fn header_name(&self) -> &'static str {
        match self {
            RecordKind::Vectors => "dim",
            RecordKind::Groundtruth => "top_k",
        }
    }
}

pub trait RecordElement: Copy + Default {
    const KIND: RecordKind;

    fn read_into<R: Read>(reader: &mut R, dst: &mut [Self]) -> io::Result<()>;
    fn write<W: Write>(self, writer: &mut W) -> io::Result<()>;
}

impl RecordElement for f32 {
    const KIND: RecordKind = RecordKind::Vectors;

    fn read_into<R: Read>(reader: &mut R, dst: &mut [Self]) -> io::Result<()> {
        reader.read_f32_into::<LittleEndian>(dst)
    }

    fn write<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_f32::<LittleEndian>(self)
    }
}

impl RecordElement for u32 {
    const KIND: RecordKind = RecordKind::Groundtruth;

    fn read_into<R: Read>(reader: &mut R, dst: &mut [Self]) -> io::Result<()> {
        reader.read_u32_into::<LittleEndian>(dst)
    }

    fn write<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self)
    }
}

/// Densely packed contents of a record file: `count` rows of `width`
/// elements each.
#[derive(Debug, Clone)]
pub struct Records<T> {
    data: Vec<T>,
    width: usize,
}

impl<T: RecordElement> Records<T> {
    pub fn new(data: Vec<T>, width: usize) -> Self {
        assert_ne!(width, 0, "records need a non-zero width");
        assert_eq!(0, data.len() % width);
        Self { data, width }
    }

    pub fn kind(&self) -> RecordKind {
        T::KIND
    }

    /// The header value shared by every record.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn count(&self) -> usize {
        self.data.len() / self.width
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn row(&self, index: usize) -> &[T] {
        let offset = index * self.width;
        &self.data[offset..offset + self.width]
    }

    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[T]> + '_ {
        self.data.chunks_exact(self.width)
    }

    /// Size in bytes of the file these records serialize to.
    pub fn file_size(&self) -> usize {
        self.count() * (self.width + 1) * ELEMENT_SIZE
    }
}

/// Number of whole records of the given width that fit in `file_size` bytes.
pub fn record_count(file_size: usize, width: usize) -> usize {
    file_size / (width + 1) / ELEMENT_SIZE
}

pub fn read_records<T: RecordElement, P: AsRef<Path>>(path: P) -> Result<Records<T>> {
    let path = path.as_ref();
    let kind = T::KIND;
    eprintln!("loading {kind:?} records from {path:?}");
    let file = File::open(path).map_err(|source| HarnessError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let file_size = file.metadata()?.size() as usize;
    if file_size < ELEMENT_SIZE {
        return Err(HarnessError::EmptyFile {
            path: path.to_path_buf(),
        });
    }

    let mut reader = BufReader::new(file);
    let header = reader.read_i32::<LittleEndian>()?;
    if header <= 0 {
        return Err(HarnessError::InvalidHeader {
            path: path.to_path_buf(),
            header,
        });
    }
    let width = header as usize;
    let count = record_count(file_size, width);

    let mut data = vec![T::default(); count * width];
    for (record, row) in data.chunks_exact_mut(width).enumerate() {
        if record != 0 {
            let found = reader.read_i32::<LittleEndian>()?;
            if found != header {
                return Err(HarnessError::MalformedRecord {
                    path: path.to_path_buf(),
                    record,
                    expected: header,
                    found,
                });
            }
        }
        T::read_into(&mut reader, row)?;
    }

    let trailing = file_size - count * (width + 1) * ELEMENT_SIZE;
    if trailing != 0 {
        eprintln!("ignoring {trailing} trailing bytes in {path:?}");
    }
    eprintln!("loaded {count} records ({}: {width})", kind.header_name());

    Ok(Records::new(data, width))
}

pub fn write_records<T: RecordElement, P: AsRef<Path>>(
    path: P,
    data: &[T],
    width: usize,
) -> Result<()> {
    assert_ne!(width, 0, "records need a non-zero width");
    assert_eq!(
        0,
        data.len() % width,
        "data does not contain an exact amount of records"
    );
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| HarnessError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    for row in data.chunks_exact(width) {
        writer.write_i32::<LittleEndian>(width as i32)?;
        for elt in row {
            elt.write(&mut writer)?;
        }
    }
    writer.flush()?;

    Ok(())
}
