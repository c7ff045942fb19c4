// crates/geoprobe-gpkg/src/geometry.rs
// ============================================================================
// Module: GeoPackage Geometry Codec
// Description: Parses GeoPackage binary headers and WKB bounds.
// Purpose: Compute layer extents without a full geometry library.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! GeoPackage stores geometries as a `GP` header followed by ISO WKB. The
//! header may carry an envelope; when it does not, bounds are computed by
//! walking the WKB coordinates. Extended WKB written by PostGIS-derived tools
//! is accepted too. Only bounds are extracted; coordinates are
//! never materialized.
//! Security posture: blobs come from the container and are untrusted; every
//! read is bounds-checked and nesting depth is capped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Magic bytes opening every GeoPackage geometry blob.
const GP_MAGIC: [u8; 2] = *b"GP";
/// Maximum nesting depth for collection geometries.
const MAX_WKB_DEPTH: usize = 32;
/// Extended WKB flag: coordinates carry Z.
const EWKB_Z: u32 = 0x8000_0000;
/// Extended WKB flag: coordinates carry M.
const EWKB_M: u32 = 0x4000_0000;
/// Extended WKB flag: a 4-byte SRID follows the type code.
const EWKB_SRID: u32 = 0x2000_0000;
/// Extended WKB dimension flag bits.
const EWKB_ZM: u32 = EWKB_Z | EWKB_M;
/// All extended WKB flag bits.
const EWKB_FLAGS: u32 = EWKB_ZM | EWKB_SRID;

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Axis-aligned 2D bounds.
///
/// # Invariants
/// - `min_x <= max_x` and `min_y <= max_y` for envelopes built by this module.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Envelope {
    /// Minimum X (longitude / easting).
    pub min_x: f64,
    /// Maximum X (longitude / easting).
    pub max_x: f64,
    /// Minimum Y (latitude / northing).
    pub min_y: f64,
    /// Maximum Y (latitude / northing).
    pub max_y: f64,
}

impl Envelope {
    /// Builds a degenerate envelope around one point.
    #[must_use]
    pub const fn from_point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    /// Returns the smallest envelope covering both inputs.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Returns the bounds in `[min_x, min_y, max_x, max_y]` order.
    #[must_use]
    pub const fn bbox(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

/// Folds an optional envelope with another.
fn merge(acc: Option<Envelope>, next: Envelope) -> Envelope {
    match acc {
        Some(current) => current.union(next),
        None => next,
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Geometry blob decoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// Blob does not start with the `GP` magic.
    #[error("geometry blob missing GP magic")]
    BadMagic,
    /// Header flags declare an envelope layout outside 0..=4.
    #[error("invalid envelope indicator: {0}")]
    BadEnvelopeIndicator(u8),
    /// Blob ended before a declared value.
    #[error("geometry blob truncated at byte {0}")]
    Truncated(usize),
    /// WKB byte order marker is neither 0 nor 1.
    #[error("invalid wkb byte order: {0}")]
    BadByteOrder(u8),
    /// WKB geometry type code is not supported.
    #[error("unsupported wkb geometry type: {0}")]
    UnsupportedType(u32),
    /// Collections nest deeper than the supported limit.
    #[error("wkb nesting exceeds depth limit")]
    TooDeep,
}

// ============================================================================
// SECTION: GeoPackage Header
// ============================================================================

/// Decoded GeoPackage binary header.
///
/// # Invariants
/// - `wkb_offset` points at the first WKB byte inside the source blob.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryHeader {
    /// Header version byte (0 for GeoPackage 1.x).
    pub version: u8,
    /// Spatial reference identifier recorded in the header.
    pub srs_id: i32,
    /// Envelope carried in the header, if any.
    pub envelope: Option<Envelope>,
    /// Empty-geometry flag.
    pub empty: bool,
    /// Extended (non-standard) geometry flag.
    pub extended: bool,
    /// Offset of the WKB payload.
    pub wkb_offset: usize,
}

/// Parses the GeoPackage binary header of a geometry blob.
///
/// # Errors
///
/// Returns [`GeometryError`] when the header is malformed or truncated.
pub fn parse_header(blob: &[u8]) -> Result<GeometryHeader, GeometryError> {
    let mut reader = ByteReader::new(blob);
    let magic = reader.take(2)?;
    if magic != GP_MAGIC {
        return Err(GeometryError::BadMagic);
    }
    let version = reader.u8()?;
    let flags = reader.u8()?;
    let little_endian = flags & 0b0000_0001 != 0;
    let indicator = (flags >> 1) & 0b0000_0111;
    let empty = flags & 0b0001_0000 != 0;
    let extended = flags & 0b0010_0000 != 0;
    let srs_id = reader.i32(little_endian)?;
    let extra_ranges = match indicator {
        0 => None,
        1 => Some(0),
        2 | 3 => Some(1),
        4 => Some(2),
        other => return Err(GeometryError::BadEnvelopeIndicator(other)),
    };
    let envelope = match extra_ranges {
        None => None,
        Some(extra) => {
            let min_x = reader.f64(little_endian)?;
            let max_x = reader.f64(little_endian)?;
            let min_y = reader.f64(little_endian)?;
            let max_y = reader.f64(little_endian)?;
            reader.take(extra * 16)?;
            Some(Envelope {
                min_x,
                max_x,
                min_y,
                max_y,
            })
        }
    };
    Ok(GeometryHeader {
        version,
        srs_id,
        envelope: envelope.filter(|env| !env.bbox().iter().any(|value| value.is_nan())),
        empty,
        extended,
        wkb_offset: reader.pos,
    })
}

/// Returns the 2D envelope of a GeoPackage geometry blob.
///
/// Uses the header envelope when present and falls back to the WKB
/// coordinates. Empty geometries yield `None`.
///
/// # Errors
///
/// Returns [`GeometryError`] when the blob is malformed.
pub fn blob_envelope(blob: &[u8]) -> Result<Option<Envelope>, GeometryError> {
    let header = parse_header(blob)?;
    if header.empty {
        return Ok(None);
    }
    if let Some(envelope) = header.envelope {
        return Ok(Some(envelope));
    }
    let wkb = blob.get(header.wkb_offset ..).ok_or(GeometryError::Truncated(header.wkb_offset))?;
    wkb_bounds(wkb)
}

// ============================================================================
// SECTION: WKB Bounds
// ============================================================================

/// Layout of the coordinates following a WKB type code.
#[derive(Clone, Copy)]
enum WkbLayout {
    /// A single coordinate.
    Point,
    /// A counted list of coordinates.
    PointList,
    /// A counted list of rings, each a counted list of coordinates.
    RingList,
    /// A counted list of nested WKB geometries.
    Nested,
}

/// Maps an ISO base type code to its coordinate layout.
const fn layout_for(base: u32) -> Option<WkbLayout> {
    match base {
        1 => Some(WkbLayout::Point),
        // LineString, CircularString
        2 | 8 => Some(WkbLayout::PointList),
        // Polygon, Triangle
        3 | 17 => Some(WkbLayout::RingList),
        // Multi*, GeometryCollection, CompoundCurve, CurvePolygon, MultiCurve,
        // MultiSurface, PolyhedralSurface, TIN
        4 | 5 | 6 | 7 | 9 | 10 | 11 | 12 | 15 | 16 => Some(WkbLayout::Nested),
        _ => None,
    }
}

/// Computes the 2D bounds of an ISO or extended (PostGIS-style) WKB geometry.
///
/// Extended type codes carry Z/M/SRID in their high bits; an embedded SRID is
/// skipped. Mixing the high bits with ISO dimension offsets is rejected.
/// Curve types are bounded by their control points. Empty geometries and
/// `NaN` points yield `None`.
///
/// # Errors
///
/// Returns [`GeometryError`] when the WKB is malformed or unsupported.
pub fn wkb_bounds(wkb: &[u8]) -> Result<Option<Envelope>, GeometryError> {
    let mut reader = ByteReader::new(wkb);
    read_geometry(&mut reader, 0)
}

/// Reads one WKB geometry and returns its bounds.
fn read_geometry(
    reader: &mut ByteReader<'_>,
    depth: usize,
) -> Result<Option<Envelope>, GeometryError> {
    if depth > MAX_WKB_DEPTH {
        return Err(GeometryError::TooDeep);
    }
    let little_endian = match reader.u8()? {
        0 => false,
        1 => true,
        other => return Err(GeometryError::BadByteOrder(other)),
    };
    let code = reader.u32(little_endian)?;
    let flags = code & EWKB_FLAGS;
    let iso = code & !EWKB_FLAGS;
    let (base, dims) = (iso % 1000, iso / 1000);
    let ordinates = match (dims, flags & EWKB_ZM) {
        (0, 0) => 2,
        (0, EWKB_Z | EWKB_M) | (1 | 2, 0) => 3,
        (0, EWKB_ZM) | (3, 0) => 4,
        _ => return Err(GeometryError::UnsupportedType(code)),
    };
    if flags & EWKB_SRID != 0 {
        reader.take(4)?;
    }
    let layout = layout_for(base).ok_or(GeometryError::UnsupportedType(code))?;
    match layout {
        WkbLayout::Point => read_point(reader, little_endian, ordinates),
        WkbLayout::PointList => read_point_list(reader, little_endian, ordinates),
        WkbLayout::RingList => {
            let rings = reader.count(little_endian, 4)?;
            let mut acc = None;
            for _ in 0 .. rings {
                if let Some(env) = read_point_list(reader, little_endian, ordinates)? {
                    acc = Some(merge(acc, env));
                }
            }
            Ok(acc)
        }
        WkbLayout::Nested => {
            let parts = reader.count(little_endian, 5)?;
            let mut acc = None;
            for _ in 0 .. parts {
                if let Some(env) = read_geometry(reader, depth + 1)? {
                    acc = Some(merge(acc, env));
                }
            }
            Ok(acc)
        }
    }
}

/// Reads one coordinate tuple; `NaN` X/Y marks an empty point.
fn read_point(
    reader: &mut ByteReader<'_>,
    little_endian: bool,
    ordinates: usize,
) -> Result<Option<Envelope>, GeometryError> {
    let x = reader.f64(little_endian)?;
    let y = reader.f64(little_endian)?;
    reader.take((ordinates - 2) * 8)?;
    if x.is_nan() || y.is_nan() {
        return Ok(None);
    }
    Ok(Some(Envelope::from_point(x, y)))
}

/// Reads a counted coordinate list.
fn read_point_list(
    reader: &mut ByteReader<'_>,
    little_endian: bool,
    ordinates: usize,
) -> Result<Option<Envelope>, GeometryError> {
    let points = reader.count(little_endian, ordinates * 8)?;
    let mut acc = None;
    for _ in 0 .. points {
        if let Some(env) = read_point(reader, little_endian, ordinates)? {
            acc = Some(merge(acc, env));
        }
    }
    Ok(acc)
}

// ============================================================================
// SECTION: Byte Reader
// ============================================================================

/// Bounds-checked cursor over a byte slice.
struct ByteReader<'a> {
    /// Source bytes.
    data: &'a [u8],
    /// Current read offset.
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of `data`.
    const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
        }
    }

    /// Consumes `len` bytes.
    fn take(&mut self, len: usize) -> Result<&'a [u8], GeometryError> {
        let end = self.pos.checked_add(len).ok_or(GeometryError::Truncated(self.pos))?;
        let bytes = self.data.get(self.pos .. end).ok_or(GeometryError::Truncated(self.pos))?;
        self.pos = end;
        Ok(bytes)
    }

    /// Consumes a fixed-size array.
    fn array<const N: usize>(&mut self) -> Result<[u8; N], GeometryError> {
        let start = self.pos;
        self.take(N)?.try_into().map_err(|_| GeometryError::Truncated(start))
    }

    /// Consumes one byte.
    fn u8(&mut self) -> Result<u8, GeometryError> {
        let [byte] = self.array::<1>()?;
        Ok(byte)
    }

    /// Consumes a `u32` in the given byte order.
    fn u32(&mut self, little_endian: bool) -> Result<u32, GeometryError> {
        let bytes = self.array::<4>()?;
        Ok(if little_endian { u32::from_le_bytes(bytes) } else { u32::from_be_bytes(bytes) })
    }

    /// Consumes an `i32` in the given byte order.
    fn i32(&mut self, little_endian: bool) -> Result<i32, GeometryError> {
        let bytes = self.array::<4>()?;
        Ok(if little_endian { i32::from_le_bytes(bytes) } else { i32::from_be_bytes(bytes) })
    }

    /// Consumes an `f64` in the given byte order.
    fn f64(&mut self, little_endian: bool) -> Result<f64, GeometryError> {
        let bytes = self.array::<8>()?;
        Ok(if little_endian { f64::from_le_bytes(bytes) } else { f64::from_be_bytes(bytes) })
    }

    /// Consumes an element count, rejecting counts the remaining bytes cannot hold.
    fn count(&mut self, little_endian: bool, min_item_bytes: usize) -> Result<usize, GeometryError> {
        let start = self.pos;
        let raw = self.u32(little_endian)?;
        let count = usize::try_from(raw).map_err(|_| GeometryError::Truncated(start))?;
        let remaining = self.data.len().saturating_sub(self.pos);
        if count.saturating_mul(min_item_bytes) > remaining {
            return Err(GeometryError::Truncated(self.pos));
        }
        Ok(count)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
