//! Sample Vector
//!
//! Typed, normalized read access to raw pixel samples. Integer types map to
//! `raw / T::MAX`; floating point types are passed through unchanged.

use super::ChannelType;
use crate::math::Float;
use byteorder::{ByteOrder, NativeEndian};
use half::f16;
use std::marker::PhantomData;

/// A numeric type pixel samples can be stored as.
pub trait SampleType: Copy + Send + Sync + 'static {
    /// The matching channel storage type.
    const CHANNEL_TYPE: ChannelType;

    /// Size of one sample in bytes.
    const SIZE: usize;

    /// Reads a sample from native-endian bytes.
    ///
    /// * `bytes` - Raw bytes; at least `SIZE` long.
    fn read_raw(bytes: &[u8]) -> Self;

    /// Writes a sample as native-endian bytes.
    ///
    /// * `bytes` - Destination; at least `SIZE` long.
    fn write_raw(self, bytes: &mut [u8]);

    /// Converts to the renderer-standard floating point range.
    fn to_normalized(self) -> Float;

    /// Converts from the renderer-standard floating point range, rounding and
    /// clamping for integer types.
    ///
    /// * `v` - The value.
    fn from_normalized(v: Float) -> Self;
}

macro_rules! unsigned_sample_type {
    ($t: ty, $ct: expr, $read: expr, $write: expr) => {
        impl SampleType for $t {
            const CHANNEL_TYPE: ChannelType = $ct;
            const SIZE: usize = std::mem::size_of::<$t>();

            #[inline(always)]
            fn read_raw(bytes: &[u8]) -> Self {
                $read(bytes)
            }

            #[inline(always)]
            fn write_raw(self, bytes: &mut [u8]) {
                $write(bytes, self)
            }

            #[inline(always)]
            fn to_normalized(self) -> Float {
                (self as f64 / <$t>::MAX as f64) as Float
            }

            #[inline(always)]
            fn from_normalized(v: Float) -> Self {
                let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
                (v as f64 * <$t>::MAX as f64).round() as $t
            }
        }
    };
}

macro_rules! signed_sample_type {
    ($t: ty, $ct: expr, $read: expr, $write: expr) => {
        impl SampleType for $t {
            const CHANNEL_TYPE: ChannelType = $ct;
            const SIZE: usize = std::mem::size_of::<$t>();

            #[inline(always)]
            fn read_raw(bytes: &[u8]) -> Self {
                $read(bytes)
            }

            #[inline(always)]
            fn write_raw(self, bytes: &mut [u8]) {
                $write(bytes, self)
            }

            #[inline(always)]
            fn to_normalized(self) -> Float {
                (self as f64 / <$t>::MAX as f64) as Float
            }

            #[inline(always)]
            fn from_normalized(v: Float) -> Self {
                let v = if v.is_nan() { 0.0 } else { v.clamp(-1.0, 1.0) };
                (v as f64 * <$t>::MAX as f64).round() as $t
            }
        }
    };
}

unsigned_sample_type!(
    u8,
    ChannelType::Uint8,
    |b: &[u8]| b[0],
    |b: &mut [u8], v: u8| b[0] = v
);
unsigned_sample_type!(
    u16,
    ChannelType::Uint16,
    NativeEndian::read_u16,
    NativeEndian::write_u16
);
unsigned_sample_type!(
    u32,
    ChannelType::Uint32,
    NativeEndian::read_u32,
    NativeEndian::write_u32
);
signed_sample_type!(
    i8,
    ChannelType::Int8,
    |b: &[u8]| b[0] as i8,
    |b: &mut [u8], v: i8| b[0] = v as u8
);
signed_sample_type!(
    i16,
    ChannelType::Int16,
    NativeEndian::read_i16,
    NativeEndian::write_i16
);
signed_sample_type!(
    i32,
    ChannelType::Int32,
    NativeEndian::read_i32,
    NativeEndian::write_i32
);

impl SampleType for f32 {
    const CHANNEL_TYPE: ChannelType = ChannelType::Float32;
    const SIZE: usize = 4;

    #[inline(always)]
    fn read_raw(bytes: &[u8]) -> Self {
        NativeEndian::read_f32(bytes)
    }

    #[inline(always)]
    fn write_raw(self, bytes: &mut [u8]) {
        NativeEndian::write_f32(bytes, self)
    }

    #[inline(always)]
    fn to_normalized(self) -> Float {
        self
    }

    #[inline(always)]
    fn from_normalized(v: Float) -> Self {
        v
    }
}

impl SampleType for f16 {
    const CHANNEL_TYPE: ChannelType = ChannelType::Float16;
    const SIZE: usize = 2;

    #[inline(always)]
    fn read_raw(bytes: &[u8]) -> Self {
        f16::from_bits(NativeEndian::read_u16(bytes))
    }

    #[inline(always)]
    fn write_raw(self, bytes: &mut [u8]) {
        NativeEndian::write_u16(bytes, self.to_bits())
    }

    #[inline(always)]
    fn to_normalized(self) -> Float {
        self.to_f32()
    }

    #[inline(always)]
    fn from_normalized(v: Float) -> Self {
        f16::from_f32(v)
    }
}

/// Read-only view of a run of raw samples of type `T`, returning normalized
/// floats. Indices are not range checked beyond what slicing enforces; the
/// caller guarantees `i < len()`.
#[derive(Copy, Clone)]
pub struct SampleVector<'a, T: SampleType> {
    /// Raw sample bytes.
    raw: &'a [u8],

    _t: PhantomData<T>,
}

impl<'a, T: SampleType> SampleVector<'a, T> {
    /// Wraps raw bytes holding consecutive samples of type `T`.
    ///
    /// * `raw` - Raw sample bytes.
    pub fn new(raw: &'a [u8]) -> Self {
        Self {
            raw,
            _t: PhantomData,
        }
    }

    /// Returns the number of whole samples in the view.
    pub fn len(&self) -> usize {
        self.raw.len() / T::SIZE
    }

    /// Returns true if the view holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns sample `i` as a normalized float.
    ///
    /// * `i` - Sample index.
    #[inline(always)]
    pub fn get(&self, i: usize) -> Float {
        debug_assert!(i < self.len());
        T::read_raw(&self.raw[i * T::SIZE..]).to_normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn uint8_normalizes_by_max() {
        let raw = [0u8, 255, 51];
        let v = SampleVector::<u8>::new(&raw);
        assert_eq!(v.len(), 3);
        assert_eq!(v.get(0), 0.0);
        assert_eq!(v.get(1), 1.0);
        assert!(approx_eq!(Float, v.get(2), 0.2, epsilon = 1e-6));
    }

    #[test]
    fn float_passes_through() {
        let mut raw = [0u8; 8];
        0.37f32.write_raw(&mut raw[0..4]);
        (-2.5f32).write_raw(&mut raw[4..8]);
        let v = SampleVector::<f32>::new(&raw);
        assert_eq!(v.get(0), 0.37);
        assert_eq!(v.get(1), -2.5);
    }

    #[test]
    fn half_float_passes_through() {
        let mut raw = [0u8; 2];
        f16::from_f32(0.5).write_raw(&mut raw);
        assert_eq!(SampleVector::<f16>::new(&raw).get(0), 0.5);
    }

    #[test]
    fn uint16_and_signed_types() {
        let mut raw = [0u8; 4];
        u16::MAX.write_raw(&mut raw[0..2]);
        0u16.write_raw(&mut raw[2..4]);
        let v = SampleVector::<u16>::new(&raw);
        assert_eq!(v.get(0), 1.0);
        assert_eq!(v.get(1), 0.0);

        let raw = [127u8, 0x81];
        let v = SampleVector::<i8>::new(&raw);
        assert_eq!(v.get(0), 1.0);
        assert_eq!(v.get(1), -1.0);
    }

    #[test]
    fn from_normalized_rounds_and_clamps() {
        assert_eq!(u8::from_normalized(1.5), 255);
        assert_eq!(u8::from_normalized(-0.5), 0);
        assert_eq!(u8::from_normalized(0.5), 128);
        assert_eq!(i16::from_normalized(-1.0), -i16::MAX);
        assert_eq!(u16::from_normalized(f32::NAN), 0);
    }
}
