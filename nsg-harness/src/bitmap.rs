/// Visited set over node ids, one bit per node.
pub struct Bitmap {
    data: Vec<u64>,
    len: usize,
}

impl Bitmap {
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0; (len + 63) / 64],
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline(always)]
    pub fn check(&self, index: usize) -> bool {
        debug_assert!(index < self.len);
        self.data[index / 64] & (1 << (index % 64)) != 0
    }

    #[inline(always)]
    pub fn set(&mut self, index: usize) {
        debug_assert!(index < self.len);
        self.data[index / 64] |= 1 << (index % 64);
    }

    /// Sets the bit and returns its previous value.
    #[inline(always)]
    pub fn check_set(&mut self, index: usize) -> bool {
        debug_assert!(index < self.len);
        let elt = &mut self.data[index / 64];
        let mask = 1 << (index % 64);
        let was_set = *elt & mask != 0;
        *elt |= mask;
        was_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn do_a_bitmap_once() {
        let idx = 42;
        let mut bitmap = Bitmap::new(100);

        assert!(!bitmap.check(idx));
        assert!(!bitmap.check(idx + 1));
        bitmap.set(idx);
        assert!(bitmap.check(idx));
        assert!(!bitmap.check(idx + 1));
    }

    #[test]
    fn check_set_reports_previous() {
        let mut bitmap = Bitmap::new(130);
        assert!(!bitmap.check_set(129));
        assert!(bitmap.check_set(129));
        assert!(bitmap.check(129));
        assert!(!bitmap.check(128));
        assert_eq!(bitmap.len(), 130);
    }
}
