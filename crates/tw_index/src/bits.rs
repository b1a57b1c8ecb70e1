//! Arbitrary-width bitfield used for variant offsets.
//!
//! Every registered variant owns one or more bits; a rule's variant set is
//! the OR of those bits. The number of variants is unbounded, so the field
//! grows in 64-bit words. Comparison is numeric: the highest set bit wins.

use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitAnd, BitOr};

const WORD: usize = 64;

#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Bitfield {
    /// 低位在前；末尾不保留全零的字
    words: SmallVec<[u64; 4]>,
}

impl Bitfield {
    pub fn zero() -> Self {
        Self::default()
    }

    /// 只有第 `index` 位为 1
    pub fn bit(index: usize) -> Self {
        let mut field = Self::zero();
        field.set(index);
        field
    }

    pub fn is_zero(&self) -> bool {
        self.words.is_empty()
    }

    pub fn set(&mut self, index: usize) {
        let word = index / WORD;
        if self.words.len() <= word {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1 << (index % WORD);
    }

    pub fn contains(&self, index: usize) -> bool {
        self.words
            .get(index / WORD)
            .is_some_and(|w| w & (1 << (index % WORD)) != 0)
    }

    pub fn highest_bit(&self) -> Option<usize> {
        let last = self.words.last()?;
        Some((self.words.len() - 1) * WORD + (WORD - 1 - last.leading_zeros() as usize))
    }

    /// 所有为 1 的位，从低到高
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            (0..WORD).filter(move |b| word & (1 << b) != 0).map(move |b| i * WORD + b)
        })
    }

    /// 左移 `n` 位
    pub fn shl(&self, n: usize) -> Self {
        let mut out = Self::zero();
        for bit in self.ones() {
            out.set(bit + n);
        }
        out
    }

    /// 只保留高于 `index` 的位
    pub fn above(&self, index: usize) -> Self {
        let mut out = Self::zero();
        for bit in self.ones().filter(|b| *b > index) {
            out.set(bit);
        }
        out
    }

    /// `self & !mask`
    pub fn and_not(&self, mask: &Bitfield) -> Self {
        let words = self
            .words
            .iter()
            .enumerate()
            .map(|(i, w)| w & !mask.words.get(i).copied().unwrap_or(0))
            .collect();
        Self { words }.normalized()
    }

    /// 按 `(旧位, 新位)` 映射重排
    ///
    /// 先收集所有命中的旧位和对应的新位，再一次性 `(bits & !old) | new`，
    /// 旧位与新位重叠（循环置换）时也不会互相覆盖。
    pub fn remap(&self, mapping: &[(usize, usize)]) -> Self {
        let mut old_mask = Self::zero();
        let mut new_mask = Self::zero();
        for &(old, new) in mapping {
            if self.contains(old) {
                old_mask.set(old);
                new_mask.set(new);
            }
        }
        &self.and_not(&old_mask) | &new_mask
    }

    fn normalized(mut self) -> Self {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
        self
    }
}

impl BitOr for &Bitfield {
    type Output = Bitfield;

    fn bitor(self, rhs: &Bitfield) -> Bitfield {
        let len = self.words.len().max(rhs.words.len());
        let words = (0..len)
            .map(|i| self.words.get(i).copied().unwrap_or(0) | rhs.words.get(i).copied().unwrap_or(0))
            .collect();
        Bitfield { words }
    }
}

impl BitAnd for &Bitfield {
    type Output = Bitfield;

    fn bitand(self, rhs: &Bitfield) -> Bitfield {
        let words = self
            .words
            .iter()
            .zip(rhs.words.iter())
            .map(|(a, b)| a & b)
            .collect();
        Bitfield { words }.normalized()
    }
}

impl Ord for Bitfield {
    fn cmp(&self, other: &Self) -> Ordering {
        self.words
            .len()
            .cmp(&other.words.len())
            .then_with(|| self.words.iter().rev().cmp(other.words.iter().rev()))
    }
}

impl PartialOrd for Bitfield {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Bitfield {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits: Vec<usize> = self.ones().collect();
        write!(f, "Bitfield{bits:?}")
    }
}
