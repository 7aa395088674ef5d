use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use log::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{InstanceId, RecursionKind, RegionStat, StaticId};

/// Number of 8-byte fields in one statistics tuple
const STAT_FIELDS: u64 = 9;

/// Width in bytes of every field on the wire
const FIELD_WIDTH: u64 = 8;

/// Fixed-point scale of the self-parallelism bounds
const SELF_P_SCALE: f64 = 100.0;

/// One decoded trace record, before graph construction
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    pub uid: InstanceId,
    pub static_id: StaticId,
    /// Call-site id, 0 when absent
    pub call_site_id: StaticId,
    pub recursion: RecursionKind,
    /// Init instance a sink points at, 0 when absent
    pub recursion_target: InstanceId,
    pub instance_count: u64,
    pub parallel_bit: bool,
    /// Child instance ids in declaration order, without duplicates
    pub children: Vec<InstanceId>,
    /// Statistics tuples, one per recursion depth
    pub stats: Vec<RegionStat>,
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id: {} sid: {:16x} cid: {:16x} type: {} rtarget: {} instance: {:4} pbit {} nChildren: {} nStats: {}",
            self.uid,
            self.static_id,
            self.call_site_id,
            self.recursion.wire_tag(),
            self.recursion_target,
            self.instance_count,
            self.parallel_bit,
            self.children.len(),
            self.stats.len()
        )
    }
}

/// Little-endian field cursor that tracks its byte offset for error reports
struct FieldCursor<'a> {
    buf: &'a [u8],
    total: usize,
}

impl<'a> FieldCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            buf: data,
            total: data.len(),
        }
    }

    fn offset(&self) -> usize {
        self.total - self.buf.remaining()
    }

    fn has_remaining(&self) -> bool {
        self.buf.has_remaining()
    }

    fn next_u64(&mut self, field: &str) -> Result<u64> {
        if self.buf.remaining() < FIELD_WIDTH as usize {
            return Err(Error::decode(
                self.offset(),
                format!(
                    "truncated field '{}': {} byte(s) left",
                    field,
                    self.buf.remaining()
                ),
            ));
        }
        Ok(self.buf.get_u64_le())
    }

    /// Check a declared element count against the bytes left in the stream
    fn ensure_room(&self, count: u64, fields_each: u64, what: &str) -> Result<()> {
        let needed = count
            .checked_mul(fields_each)
            .and_then(|n| n.checked_mul(FIELD_WIDTH));
        match needed {
            Some(bytes) if bytes <= self.buf.remaining() as u64 => Ok(()),
            _ => Err(Error::decode(
                self.offset(),
                format!(
                    "declared {} {} exceed the {} byte(s) left",
                    count,
                    what,
                    self.buf.remaining()
                ),
            )),
        }
    }
}

/// Decoder for the binary profile trace
pub struct TraceReader;

impl TraceReader {
    /// Read and decode a trace file
    pub fn load(path: &Path) -> Result<Vec<TraceRecord>> {
        let data = fs::read(path)?;
        Self::decode(&data)
    }

    /// Decode every record in a byte buffer.
    ///
    /// Decoding stops at a record boundary when the buffer is exhausted; a
    /// buffer that ends inside a record is an error.
    pub fn decode(data: &[u8]) -> Result<Vec<TraceRecord>> {
        let mut cursor = FieldCursor::new(data);
        let mut records = Vec::new();

        while cursor.has_remaining() {
            records.push(Self::decode_record(&mut cursor)?);
        }

        debug!("decoded {} trace records from {} bytes", records.len(), data.len());
        Ok(records)
    }

    fn decode_record(cursor: &mut FieldCursor<'_>) -> Result<TraceRecord> {
        let record_offset = cursor.offset();
        let uid = cursor.next_u64("uid")?;
        let static_id = cursor.next_u64("static id")?;
        let call_site_id = cursor.next_u64("call site id")?;

        let tag_offset = cursor.offset();
        let tag = cursor.next_u64("recursion type")?;
        let recursion = RecursionKind::from_wire(tag).ok_or_else(|| {
            Error::decode(
                tag_offset,
                format!("record {} has recursion type {} outside 0..=2", uid, tag),
            )
        })?;

        let recursion_target = cursor.next_u64("recursion target")?;
        let instance_count = cursor.next_u64("instance count")?;
        let parallel_bit = cursor.next_u64("parallel bit")? != 0;

        let n_children = cursor.next_u64("child count")?;
        cursor.ensure_room(n_children, 1, "children")?;
        let mut children = Vec::with_capacity(n_children as usize);
        let mut seen = HashSet::with_capacity(n_children as usize);
        for _ in 0..n_children {
            let child = cursor.next_u64("child id")?;
            if seen.insert(child) {
                children.push(child);
            } else {
                warn!("record {} (byte {}) lists child {} twice", uid, record_offset, child);
            }
        }

        let n_stats = cursor.next_u64("stat count")?;
        cursor.ensure_room(n_stats, STAT_FIELDS, "statistics tuples")?;
        let mut stats = Vec::with_capacity(n_stats as usize);
        for _ in 0..n_stats {
            stats.push(Self::decode_stat(cursor)?);
        }

        Ok(TraceRecord {
            uid,
            static_id,
            call_site_id,
            recursion,
            recursion_target,
            instance_count,
            parallel_bit,
            children,
            stats,
        })
    }

    fn decode_stat(cursor: &mut FieldCursor<'_>) -> Result<RegionStat> {
        Ok(RegionStat {
            instance_count: cursor.next_u64("stat instance count")?,
            total_work: cursor.next_u64("total work")?,
            critical_path: cursor.next_u64("critical path")?,
            serial_work: cursor.next_u64("serial work")?,
            min_self_p: cursor.next_u64("min self-parallelism")? as f64 / SELF_P_SCALE,
            max_self_p: cursor.next_u64("max self-parallelism")? as f64 / SELF_P_SCALE,
            total_iterations: cursor.next_u64("total iterations")?,
            min_iterations: cursor.next_u64("min iterations")?,
            max_iterations: cursor.next_u64("max iterations")?,
            recursion_weight: 0.0,
        })
    }
}

/// Encoder producing the same layout `TraceReader` consumes
#[derive(Debug, Default)]
pub struct TraceWriter {
    buf: BytesMut,
}

impl TraceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a full record set in one call
    pub fn encode(records: &[TraceRecord]) -> Bytes {
        let mut writer = Self::new();
        for record in records {
            writer.write_record(record);
        }
        writer.finish()
    }

    /// Append one record. A `Descendant` kind is written as tag 3, which the
    /// reader rejects; only trace-level kinds should be encoded.
    pub fn write_record(&mut self, record: &TraceRecord) {
        let buf = &mut self.buf;
        buf.put_u64_le(record.uid);
        buf.put_u64_le(record.static_id);
        buf.put_u64_le(record.call_site_id);
        buf.put_u64_le(record.recursion.wire_tag());
        buf.put_u64_le(record.recursion_target);
        buf.put_u64_le(record.instance_count);
        buf.put_u64_le(u64::from(record.parallel_bit));

        buf.put_u64_le(record.children.len() as u64);
        for &child in &record.children {
            buf.put_u64_le(child);
        }

        buf.put_u64_le(record.stats.len() as u64);
        for stat in &record.stats {
            buf.put_u64_le(stat.instance_count);
            buf.put_u64_le(stat.total_work);
            buf.put_u64_le(stat.critical_path);
            buf.put_u64_le(stat.serial_work);
            buf.put_u64_le((stat.min_self_p * SELF_P_SCALE).round() as u64);
            buf.put_u64_le((stat.max_self_p * SELF_P_SCALE).round() as u64);
            buf.put_u64_le(stat.total_iterations);
            buf.put_u64_le(stat.min_iterations);
            buf.put_u64_le(stat.max_iterations);
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}
