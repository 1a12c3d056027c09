use std::convert::TryFrom;

use anyhow::{anyhow, Result};

pub fn to_u64(value: i64, field: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| anyhow!("{field} contains negative value {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_counts_within_range() {
        assert_eq!(to_u64(42, "count").unwrap(), 42);
    }

    #[test]
    fn rejects_negative_counts() {
        let err = to_u64(-1, "count").unwrap_err();
        assert!(err.to_string().contains("count"));
    }
}
