//! A tiny binary-stream reader for GSUB/GPOS/GDEF table parsing (C2/C3/C4).
//!
//! `ttf-parser` (our font-table collaborator, §6) exposes its own `parser`
//! module for exactly this purpose, but the layout engine is THE CORE this
//! spec covers (§1), so we own our binary cursor rather than depend on an
//! unstable internal API. The shape mirrors `ttf-parser`'s `Stream`/
//! `FromData`/`LazyArray16` trio, the way the teacher's own GSUB/GPOS code
//! does.

use std::convert::{TryFrom, TryInto};
use std::marker::PhantomData;

/// Anything that can be read out of a fixed-size big-endian record.
pub trait FromData: Sized {
    const SIZE: usize;
    fn parse(data: &[u8]) -> Option<Self>;
}

macro_rules! impl_from_data_int {
    ($ty:ty, $size:expr) => {
        impl FromData for $ty {
            const SIZE: usize = $size;

            #[inline]
            fn parse(data: &[u8]) -> Option<Self> {
                let bytes: [u8; $size] = data.get(..$size)?.try_into().ok()?;
                Some(<$ty>::from_be_bytes(bytes))
            }
        }
    };
}

impl_from_data_int!(u8, 1);
impl_from_data_int!(i8, 1);
impl_from_data_int!(u16, 2);
impl_from_data_int!(i16, 2);
impl_from_data_int!(u32, 4);
impl_from_data_int!(i32, 4);

/// A 16.16 fixed-point value, used by some Device/Anchor variants.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct F2Dot14(pub i16);

impl F2Dot14 {
    pub fn to_f32(self) -> f32 {
        f32::from(self.0) / 16384.0
    }
}

impl FromData for F2Dot14 {
    const SIZE: usize = 2;

    fn parse(data: &[u8]) -> Option<Self> {
        i16::parse(data).map(F2Dot14)
    }
}

/// A cursor over a byte slice, with big-endian fixed-width reads.
#[derive(Clone, Copy)]
pub struct Stream<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Stream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Stream { data, offset: 0 }
    }

    pub fn new_at(data: &'a [u8], offset: usize) -> Option<Self> {
        if offset > data.len() {
            return None;
        }
        Some(Stream { data, offset })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    pub fn skip<T: FromData>(&mut self) {
        self.offset += T::SIZE;
    }

    pub fn skip_bytes(&mut self, n: usize) {
        self.offset += n;
    }

    pub fn read<T: FromData>(&mut self) -> Option<T> {
        let v = T::parse(self.data.get(self.offset..)?)?;
        self.offset += T::SIZE;
        Some(v)
    }

    pub fn read_at<T: FromData>(data: &[u8], offset: usize) -> Option<T> {
        T::parse(data.get(offset..)?)
    }

    /// Reads a `count`-length array of `T` at the current position.
    pub fn read_array16<T: FromData>(&mut self, count: u16) -> Option<LazyArray<'a, T>> {
        let len = usize::from(count) * T::SIZE;
        let data = self.data.get(self.offset..self.offset + len)?;
        self.offset += len;
        Some(LazyArray::new(data))
    }

    /// Reads a 16-bit count prefix, then that many `T`.
    pub fn read_array16_counted<T: FromData>(&mut self) -> Option<LazyArray<'a, T>> {
        let count: u16 = self.read()?;
        self.read_array16(count)
    }

    pub fn tail(&self) -> Option<&'a [u8]> {
        self.data.get(self.offset..)
    }
}

/// A lazily-indexed homogeneous array — binary-searchable without eager
/// decoding, the representation Coverage/ClassDef rows are stored in.
#[derive(Clone, Copy)]
pub struct LazyArray<'a, T> {
    data: &'a [u8],
    phantom: PhantomData<T>,
}

impl<'a, T: FromData> LazyArray<'a, T> {
    pub fn new(data: &'a [u8]) -> Self {
        LazyArray { data, phantom: PhantomData }
    }

    pub fn empty() -> Self {
        LazyArray { data: &[], phantom: PhantomData }
    }

    pub fn len(&self) -> u16 {
        u16::try_from(self.data.len() / T::SIZE.max(1)).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: u16) -> Option<T> {
        let start = usize::from(index) * T::SIZE;
        T::parse(self.data.get(start..)?)
    }

    pub fn binary_search_by<F>(&self, mut f: F) -> Option<(u16, T)>
    where
        F: FnMut(&T) -> std::cmp::Ordering,
    {
        use std::cmp::Ordering;

        let mut lo = 0i32;
        let mut hi = i32::from(self.len()) - 1;
        while lo <= hi {
            let mid = (lo + hi) / 2;
            let item = self.get(mid as u16)?;
            match f(&item) {
                Ordering::Equal => return Some((mid as u16, item)),
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid - 1,
            }
        }
        None
    }

    pub fn iter(&self) -> LazyArrayIter<'a, T> {
        LazyArrayIter { array: *self, index: 0 }
    }
}

pub struct LazyArrayIter<'a, T> {
    array: LazyArray<'a, T>,
    index: u16,
}

impl<'a, T: FromData> Iterator for LazyArrayIter<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let v = self.array.get(self.index)?;
        self.index += 1;
        Some(v)
    }
}

/// Resolves a 16-bit offset relative to `base`, returning the sub-slice it
/// points at. A `0` offset is "absent", per every OpenType layout table.
pub fn offset16(base: &[u8], offset_field_pos: usize) -> Option<&[u8]> {
    let off: u16 = Stream::read_at(base, offset_field_pos)?;
    if off == 0 {
        return None;
    }
    base.get(usize::from(off)..)
}

pub fn offset32(base: &[u8], offset_field_pos: usize) -> Option<&[u8]> {
    let off: u32 = Stream::read_at(base, offset_field_pos)?;
    if off == 0 {
        return None;
    }
    base.get(off as usize..)
}
