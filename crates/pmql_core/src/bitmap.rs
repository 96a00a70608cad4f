use std::fmt;

/// Fixed-length bitset backed by 64-bit blocks.
///
/// Used to track which cached op results are still valid and which ops
/// depend on a given variable.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    blocks: Vec<u64>,
    len: usize,
}

const BLOCK_BITS: usize = u64::BITS as usize;

impl Bitmap {
    /// Create a bitmap of `len` bits, all unset.
    pub fn new(len: usize) -> Self {
        Bitmap {
            blocks: vec![0; len.div_ceil(BLOCK_BITS)],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, idx: usize) -> bool {
        debug_assert!(idx < self.len);
        self.blocks[idx / BLOCK_BITS] & (1 << (idx % BLOCK_BITS)) != 0
    }

    pub fn set(&mut self, idx: usize, value: bool) {
        debug_assert!(idx < self.len);
        let mask = 1 << (idx % BLOCK_BITS);
        if value {
            self.blocks[idx / BLOCK_BITS] |= mask;
        } else {
            self.blocks[idx / BLOCK_BITS] &= !mask;
        }
    }

    pub fn set_all(&mut self, value: bool) {
        let fill = if value { u64::MAX } else { 0 };
        for block in &mut self.blocks {
            *block = fill;
        }
        self.clear_trailing();
    }

    /// Flip every bit in place.
    pub fn invert(&mut self) {
        for block in &mut self.blocks {
            *block = !*block;
        }
        self.clear_trailing();
    }

    /// `self &= other`. Lengths must match.
    pub fn and_assign(&mut self, other: &Bitmap) {
        debug_assert_eq!(self.len, other.len);
        for (block, o) in self.blocks.iter_mut().zip(&other.blocks) {
            *block &= o;
        }
    }

    pub fn count_set(&self) -> usize {
        self.blocks.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(|idx| self.get(idx))
    }

    /// Bits past `len` in the last block must stay unset so block-wise
    /// operations cannot leak them into counts.
    fn clear_trailing(&mut self) {
        let tail = self.len % BLOCK_BITS;
        if tail != 0 {
            if let Some(last) = self.blocks.last_mut() {
                *last &= (1 << tail) - 1;
            }
        }
    }
}

impl FromIterator<bool> for Bitmap {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let bits: Vec<bool> = iter.into_iter().collect();
        let mut bm = Bitmap::new(bits.len());
        for (idx, bit) in bits.into_iter().enumerate() {
            if bit {
                bm.set(idx, true);
            }
        }
        bm
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            write!(f, "{}", if bit { '1' } else { '0' })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut bm = Bitmap::new(100);
        assert_eq!(100, bm.len());
        assert_eq!(0, bm.count_set());

        bm.set(0, true);
        bm.set(63, true);
        bm.set(64, true);
        bm.set(99, true);
        assert!(bm.get(0));
        assert!(!bm.get(1));
        assert!(bm.get(63));
        assert!(bm.get(64));
        assert!(bm.get(99));
        assert_eq!(4, bm.count_set());

        bm.set(63, false);
        assert!(!bm.get(63));
        assert_eq!(3, bm.count_set());
    }

    #[test]
    fn invert_ignores_trailing_bits() {
        let mut bm = Bitmap::new(70);
        bm.set(3, true);
        bm.invert();
        assert!(!bm.get(3));
        assert_eq!(69, bm.count_set());
    }

    #[test]
    fn and_assign() {
        let mut a = Bitmap::new(5);
        a.set_all(true);
        let b: Bitmap = [true, false, true, false, true].into_iter().collect();
        a.and_assign(&b);
        assert_eq!(
            vec![true, false, true, false, true],
            a.iter().collect::<Vec<_>>()
        );
    }
}
