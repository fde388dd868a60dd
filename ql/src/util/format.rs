use num_format::{CustomFormat, Grouping, ToFormattedString};

pub fn number_format() -> CustomFormat {
    CustomFormat::builder()
        .grouping(Grouping::Standard)
        .minus_sign("-")
        .separator("_")
        .build()
        .expect("static number format should be valid")
}

/// `6500` => `"6_500"`
pub fn format_count<N: ToFormattedString>(n: N) -> String {
    n.to_formatted_string(&number_format())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, "0")]
    #[case(999, "999")]
    #[case(6500, "6_500")]
    #[case(1_234_567, "1_234_567")]
    fn test_format_count(#[case] n: u64, #[case] expected: &str) {
        assert_eq!(format_count(n), expected);
    }
}
