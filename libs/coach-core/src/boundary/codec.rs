//! Binary serialization of track boundaries.
//!
//! Wire layout, little-endian throughout:
//!
//! ```text
//! track_id:   i32
//! config_len: u16
//! config:     utf8 bytes (empty when the track has no named config)
//! grid_size:  u32
//! doubles:    5 x grid_size f64, in the order
//!             left-lat, left-lon, right-lat, right-lon, grid-distance-pct
//! ```

use crate::error::AnalysisError;

use super::TrackBoundary;

impl TrackBoundary {
    /// Serialize into the binary store format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let config = self.track_config_name.as_deref().unwrap_or("");
        let config_bytes = config.as_bytes();

        let mut out =
            Vec::with_capacity(4 + 2 + config_bytes.len() + 4 + 5 * 8 * self.grid_size);
        out.extend_from_slice(&self.track_id.to_le_bytes());
        out.extend_from_slice(&(config_bytes.len() as u16).to_le_bytes());
        out.extend_from_slice(config_bytes);
        out.extend_from_slice(&(self.grid_size as u32).to_le_bytes());

        for array in [
            &self.left_latitude,
            &self.left_longitude,
            &self.right_latitude,
            &self.right_longitude,
            &self.grid_distance_pct,
        ] {
            for value in array.iter() {
                out.extend_from_slice(&value.to_le_bytes());
            }
        }
        out
    }

    /// Deserialize from the binary store format.
    ///
    /// Source-lap provenance and track length are not part of the wire
    /// shape and come back empty. The decoded grid is validated
    /// structurally.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AnalysisError> {
        let mut reader = ByteReader::new(bytes);

        let track_id = reader.read_i32()?;
        let config_len = reader.read_u16()? as usize;
        let config_bytes = reader.read_slice(config_len)?;
        let config = std::str::from_utf8(config_bytes)
            .map_err(|_| AnalysisError::MalformedBoundary("config name is not utf-8".into()))?;
        let track_config_name = (!config.is_empty()).then(|| config.to_string());

        let grid_size = reader.read_u32()? as usize;

        let mut read_array = |reader: &mut ByteReader<'_>| -> Result<Vec<f64>, AnalysisError> {
            (0..grid_size).map(|_| reader.read_f64()).collect()
        };
        let left_latitude = read_array(&mut reader)?;
        let left_longitude = read_array(&mut reader)?;
        let right_latitude = read_array(&mut reader)?;
        let right_longitude = read_array(&mut reader)?;
        let grid_distance_pct = read_array(&mut reader)?;

        if !reader.is_empty() {
            return Err(AnalysisError::MalformedBoundary(format!(
                "{} trailing bytes after boundary data",
                reader.remaining()
            )));
        }

        let boundary = TrackBoundary {
            track_id,
            track_config_name,
            grid_size,
            grid_distance_pct,
            left_latitude,
            left_longitude,
            right_latitude,
            right_longitude,
            source_left_frames: 0,
            source_right_frames: 0,
            track_length: None,
        };
        boundary.validate()?;
        Ok(boundary)
    }
}

/// Cursor over a byte slice with bounds-checked little-endian reads.
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], AnalysisError> {
        let end = self.pos.checked_add(len).filter(|&e| e <= self.bytes.len());
        let Some(end) = end else {
            return Err(AnalysisError::MalformedBoundary(
                "unexpected end of boundary data".into(),
            ));
        };
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32, AnalysisError> {
        let bytes = self.read_slice(4)?;
        Ok(i32::from_le_bytes(bytes.try_into().expect("slice length checked")))
    }

    fn read_u16(&mut self) -> Result<u16, AnalysisError> {
        let bytes = self.read_slice(2)?;
        Ok(u16::from_le_bytes(bytes.try_into().expect("slice length checked")))
    }

    fn read_u32(&mut self) -> Result<u32, AnalysisError> {
        let bytes = self.read_slice(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().expect("slice length checked")))
    }

    fn read_f64(&mut self) -> Result<f64, AnalysisError> {
        let bytes = self.read_slice(8)?;
        Ok(f64::from_le_bytes(bytes.try_into().expect("slice length checked")))
    }

    fn is_empty(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}
