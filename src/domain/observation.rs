// ============================================================
// Layer 3 — Observation Domain Type
// ============================================================
// A single occupancy reading as stored in the source table:
//   name | year | month | day | chunk | percentage
//
// `chunk` is the intraday time bucket (10-minute buckets,
// so 144 chunks per day). The tuple (year, month, day, chunk)
// is the chronological ordering key of a reading.

/// Composite chronological key.
/// Field order matters: the derived `Ord` compares year first,
/// then month, day and finally the intraday chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChronoKey {
    pub year:  i32,
    pub month: u32,
    pub day:   u32,
    pub chunk: u32,
}

impl ChronoKey {
    pub fn new(year: i32, month: u32, day: u32, chunk: u32) -> Self {
        Self { year, month, day, chunk }
    }
}

/// One raw reading for one entity.
#[derive(Debug, Clone)]
pub struct Observation {
    /// Library name as stored in the source table
    pub entity: String,

    /// When the reading was taken
    pub key: ChronoKey,

    /// Raw occupancy percentage, nominally in [0, 100]
    pub percentage: f64,
}

impl Observation {
    pub fn new(entity: impl Into<String>, key: ChronoKey, percentage: f64) -> Self {
        Self { entity: entity.into(), key, percentage }
    }

    /// Two rows are duplicates only if every column matches.
    pub fn same_row(&self, other: &Observation) -> bool {
        self.entity == other.entity
            && self.key == other.key
            && self.percentage.to_bits() == other.percentage.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chrono_key_orders_by_date_then_chunk() {
        let a = ChronoKey::new(2024, 1, 31, 143);
        let b = ChronoKey::new(2024, 2, 1, 0);
        let c = ChronoKey::new(2024, 2, 1, 1);
        assert!(a < b);
        assert!(b < c);

        let mut keys = vec![c, a, b];
        keys.sort();
        assert_eq!(keys, vec![a, b, c]);
    }

    #[test]
    fn test_same_row_requires_matching_percentage() {
        let key = ChronoKey::new(2024, 5, 2, 10);
        let a   = Observation::new("A3", key, 42.0);
        let b   = Observation::new("A3", key, 42.0);
        let c   = Observation::new("A3", key, 43.0);
        assert!(a.same_row(&b));
        assert!(!a.same_row(&c));
    }
}
