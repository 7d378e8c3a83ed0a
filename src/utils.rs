pub const PROTON: f64 = 1.00727646677;

/// Mass difference between the 13C and 12C isotopes, the step between
/// successive averagine isotopic peaks at charge 1.
pub const C13_C12_DIFF: f64 = 1.003355;

/// Test whether `value` lies in the closed interval `[lower, upper]`
#[inline]
pub(crate) fn in_closed(value: f64, lower: f64, upper: f64) -> bool {
    lower <= value && value <= upper
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_closed_interval() {
        assert!(in_closed(1.0, 1.0, 2.0));
        assert!(in_closed(2.0, 1.0, 2.0));
        assert!(!in_closed(2.0000001, 1.0, 2.0));
    }
}
