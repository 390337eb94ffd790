/// Rounds to the nearest integer with halves rounded up; negative values become zero
pub fn round_half_up(value: f64) -> usize {
    (value + 0.5).floor().max(0.0) as usize
}

/// Number of rows needed to lay out `items` in `columns` columns
pub fn rows(items: usize, columns: usize) -> usize {
    items.div_ceil(columns.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(0.0), 0);
        assert_eq!(round_half_up(0.49), 0);
        assert_eq!(round_half_up(0.5), 1);
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(7.6), 8);
        assert_eq!(round_half_up(-3.0), 0);
    }

    #[test]
    fn test_rows() {
        assert_eq!(rows(0, 3), 0);
        assert_eq!(rows(1, 3), 1);
        assert_eq!(rows(3, 3), 1);
        assert_eq!(rows(4, 3), 2);
        assert_eq!(rows(4, 0), 4);
    }
}
