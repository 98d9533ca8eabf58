//! Binary snapshot format for volume trees.
//!
//! A snapshot is a magic/version header followed by one frame per node in
//! breadth-first order. Each frame carries the node's child names, its
//! key–value entries (a one-byte type marker in front of every payload), and
//! a trailing XOR-8 checksum over the frame's name, key, and payload bytes.
//! Counts, lengths, and scalar payloads are little-endian; the checksum is a
//! local truncation/corruption tripwire, not a cryptographic digest.

mod error;

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use common::{Node, NodeData, Value, MAX_PAYLOAD_BYTES};
use tracing::debug;
use volume::VolumeNode;

pub use error::CodecError;

/// First four bytes of every snapshot.
pub const MAGIC: [u8; 4] = *b"jbkv";

/// Current snapshot format revision.
pub const FORMAT_VERSION: u8 = 1;

/// On-disk type tag preceding every serialized value payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Marker {
    Double = 0,
    String = 1,
    Blob = 2,
    Bool = 3,
    Char = 4,
    UChar = 5,
    UInt16 = 6,
    Int16 = 7,
    UInt32 = 8,
    Int32 = 9,
    UInt64 = 10,
    Int64 = 11,
    Float = 12,
}

impl Marker {
    fn of(value: &Value) -> Marker {
        match value {
            Value::Bool(_) => Marker::Bool,
            Value::Char(_) => Marker::Char,
            Value::UChar(_) => Marker::UChar,
            Value::UInt16(_) => Marker::UInt16,
            Value::Int16(_) => Marker::Int16,
            Value::UInt32(_) => Marker::UInt32,
            Value::Int32(_) => Marker::Int32,
            Value::UInt64(_) => Marker::UInt64,
            Value::Int64(_) => Marker::Int64,
            Value::Float32(_) => Marker::Float,
            Value::Float64(_) => Marker::Double,
            Value::String(_) => Marker::String,
            Value::Blob(_) => Marker::Blob,
        }
    }

    fn from_byte(marker: u8) -> Result<Marker, CodecError> {
        Ok(match marker {
            0 => Marker::Double,
            1 => Marker::String,
            2 => Marker::Blob,
            3 => Marker::Bool,
            4 => Marker::Char,
            5 => Marker::UChar,
            6 => Marker::UInt16,
            7 => Marker::Int16,
            8 => Marker::UInt32,
            9 => Marker::Int32,
            10 => Marker::UInt64,
            11 => Marker::Int64,
            12 => Marker::Float,
            _ => return Err(CodecError::UnknownMarker { marker }),
        })
    }
}

/// Serializes the tree rooted at `root` into `sink`.
pub fn save<W: Write>(root: &VolumeNode, sink: W) -> Result<(), CodecError> {
    let mut out = sink;
    out.write_all(&MAGIC)?;
    out.write_u8(FORMAT_VERSION)?;

    let mut queue = VecDeque::from([root.clone()]);
    let mut nodes = 0usize;
    while let Some(node) = queue.pop_front() {
        write_node(&node, &mut queue, &mut out)?;
        nodes += 1;
    }

    debug!(nodes, "volume snapshot saved");
    Ok(())
}

/// Reads a snapshot from `src` into `root`, which is expected to be empty.
///
/// On failure the nodes and entries ingested before the error remain; no
/// partial frame is ever applied beyond its last complete entry.
pub fn load<R: Read>(root: &VolumeNode, src: R) -> Result<(), CodecError> {
    let mut input = src;
    let mut magic = [0u8; 4];
    input.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(CodecError::BadMagic { found: magic });
    }

    let version = input.read_u8()?;
    if version > FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion { version });
    }

    let mut queue = VecDeque::from([root.clone()]);
    let mut nodes = 0usize;
    while let Some(node) = queue.pop_front() {
        read_node(&node, &mut queue, &mut input)?;
        nodes += 1;
    }

    debug!(nodes, "volume snapshot loaded");
    Ok(())
}

/// Serializes `root` into a freshly created file at `path`.
pub fn save_to_file<P: AsRef<Path>>(root: &VolumeNode, path: P) -> Result<(), CodecError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    save(root, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Loads the snapshot file at `path` into `root`.
pub fn load_from_file<P: AsRef<Path>>(root: &VolumeNode, path: P) -> Result<(), CodecError> {
    let file = File::open(path)?;
    load(root, BufReader::new(file))
}

fn write_node<W: Write>(
    node: &VolumeNode,
    queue: &mut VecDeque<VolumeNode>,
    out: &mut W,
) -> Result<(), CodecError> {
    let mut checksum = 0u8;

    let children = node.enumerate();
    out.write_u64::<LittleEndian>(children.len() as u64)?;
    for child in children {
        let name = child.name();
        write_bytes(name.as_bytes(), out)?;
        xor_bytes(name.as_bytes(), &mut checksum);
        queue.push_back(child);
    }

    let entries = node.open().enumerate();
    out.write_u64::<LittleEndian>(entries.len() as u64)?;
    for (key, value) in entries {
        write_bytes(key.as_bytes(), out)?;
        write_value(&value, out)?;
        xor_bytes(key.as_bytes(), &mut checksum);
        xor_value(&value, &mut checksum);
    }

    out.write_u8(checksum)?;
    Ok(())
}

fn read_node<R: Read>(
    node: &VolumeNode,
    queue: &mut VecDeque<VolumeNode>,
    input: &mut R,
) -> Result<(), CodecError> {
    let mut checksum = 0u8;

    let children = input.read_u64::<LittleEndian>()?;
    for _ in 0..children {
        let name = read_string(input)?;
        xor_bytes(name.as_bytes(), &mut checksum);
        let child = node.create(&name)?;
        queue.push_back(child);
    }

    let entries = input.read_u64::<LittleEndian>()?;
    let data = node.open();
    for _ in 0..entries {
        let key = read_string(input)?;
        let value = read_value(input)?;
        xor_bytes(key.as_bytes(), &mut checksum);
        xor_value(&value, &mut checksum);
        data.write(&key, value);
    }

    let stored = input.read_u8()?;
    if stored != checksum {
        return Err(CodecError::Corrupted);
    }

    Ok(())
}

fn write_value<W: Write>(value: &Value, out: &mut W) -> Result<(), CodecError> {
    out.write_u8(Marker::of(value) as u8)?;
    match value {
        Value::Bool(data) => out.write_u8(*data as u8)?,
        Value::Char(data) => out.write_i8(*data)?,
        Value::UChar(data) => out.write_u8(*data)?,
        Value::UInt16(data) => out.write_u16::<LittleEndian>(*data)?,
        Value::Int16(data) => out.write_i16::<LittleEndian>(*data)?,
        Value::UInt32(data) => out.write_u32::<LittleEndian>(*data)?,
        Value::Int32(data) => out.write_i32::<LittleEndian>(*data)?,
        Value::UInt64(data) => out.write_u64::<LittleEndian>(*data)?,
        Value::Int64(data) => out.write_i64::<LittleEndian>(*data)?,
        Value::Float32(data) => out.write_f32::<LittleEndian>(*data)?,
        Value::Float64(data) => out.write_f64::<LittleEndian>(*data)?,
        Value::String(data) => write_bytes(data.as_bytes(), out)?,
        Value::Blob(data) => write_bytes(data, out)?,
    }

    Ok(())
}

fn read_value<R: Read>(input: &mut R) -> Result<Value, CodecError> {
    let marker = Marker::from_byte(input.read_u8()?)?;
    Ok(match marker {
        Marker::Bool => Value::Bool(input.read_u8()? != 0),
        Marker::Char => Value::Char(input.read_i8()?),
        Marker::UChar => Value::UChar(input.read_u8()?),
        Marker::UInt16 => Value::UInt16(input.read_u16::<LittleEndian>()?),
        Marker::Int16 => Value::Int16(input.read_i16::<LittleEndian>()?),
        Marker::UInt32 => Value::UInt32(input.read_u32::<LittleEndian>()?),
        Marker::Int32 => Value::Int32(input.read_i32::<LittleEndian>()?),
        Marker::UInt64 => Value::UInt64(input.read_u64::<LittleEndian>()?),
        Marker::Int64 => Value::Int64(input.read_i64::<LittleEndian>()?),
        Marker::Float => Value::Float32(input.read_f32::<LittleEndian>()?),
        Marker::Double => Value::Float64(input.read_f64::<LittleEndian>()?),
        Marker::String => Value::string(String::from_utf8(read_bytes(input)?)?)?,
        Marker::Blob => Value::blob(read_bytes(input)?)?,
    })
}

fn write_bytes<W: Write>(bytes: &[u8], out: &mut W) -> Result<(), CodecError> {
    out.write_u64::<LittleEndian>(bytes.len() as u64)?;
    out.write_all(bytes)?;
    Ok(())
}

fn read_bytes<R: Read>(input: &mut R) -> Result<Vec<u8>, CodecError> {
    let len = input.read_u64::<LittleEndian>()?;
    if len > MAX_PAYLOAD_BYTES as u64 {
        return Err(CodecError::OversizedLength { len });
    }

    let mut bytes = vec![0u8; len as usize];
    input.read_exact(&mut bytes)?;
    Ok(bytes)
}

fn read_string<R: Read>(input: &mut R) -> Result<String, CodecError> {
    Ok(String::from_utf8(read_bytes(input)?)?)
}

fn xor_bytes(bytes: &[u8], checksum: &mut u8) {
    for byte in bytes {
        *checksum ^= byte;
    }
}

// Folds exactly the payload bytes written by `write_value`: markers and
// length prefixes stay outside the checksum.
fn xor_value(value: &Value, checksum: &mut u8) {
    match value {
        Value::Bool(data) => *checksum ^= *data as u8,
        Value::Char(data) => *checksum ^= *data as u8,
        Value::UChar(data) => *checksum ^= *data,
        Value::UInt16(data) => xor_bytes(&data.to_le_bytes(), checksum),
        Value::Int16(data) => xor_bytes(&data.to_le_bytes(), checksum),
        Value::UInt32(data) => xor_bytes(&data.to_le_bytes(), checksum),
        Value::Int32(data) => xor_bytes(&data.to_le_bytes(), checksum),
        Value::UInt64(data) => xor_bytes(&data.to_le_bytes(), checksum),
        Value::Int64(data) => xor_bytes(&data.to_le_bytes(), checksum),
        Value::Float32(data) => xor_bytes(&data.to_le_bytes(), checksum),
        Value::Float64(data) => xor_bytes(&data.to_le_bytes(), checksum),
        Value::String(data) => xor_bytes(data.as_bytes(), checksum),
        Value::Blob(data) => xor_bytes(data, checksum),
    }
}
