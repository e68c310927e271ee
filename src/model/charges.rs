//! Derived freight amounts.
//!
//! The form asks for a rate and the revenue tons it applies to; the freight
//! amount is their product and lands in the Prepaid or Collect column
//! depending on the freight terms. Amounts the user typed in are kept.

use super::{BillOfLading, FieldId, FreightTerms};

/// Parse a decimal amount, tolerating thousands separators, a currency
/// prefix and surrounding whitespace (`"USD 1,250.50"` → `1250.5`).
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '$' || c.is_whitespace())
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Fill in the freight amount when it can be computed.
///
/// Returns the amount written, if any.
pub fn apply_freight(bill: &mut BillOfLading) -> Option<f64> {
    let rate = parse_amount(bill.value(FieldId::Rate)?)?;
    let tons = parse_amount(bill.value(FieldId::RevenueTons)?)?;
    let target = match bill.freight_terms {
        FreightTerms::Prepaid => FieldId::Prepaid,
        FreightTerms::Collect => FieldId::Collect,
    };
    if bill.value(target).is_some() {
        return None;
    }
    let amount = (rate * tons * 100.0).round() / 100.0;
    bill.set(target, format!("{:.2}", amount));
    Some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,250.50"), Some(1250.5));
        assert_eq!(parse_amount("USD 42"), Some(42.0));
        assert_eq!(parse_amount("$ 7.5"), Some(7.5));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("as agreed"), None);
    }

    #[test]
    fn test_prepaid_amount_computed() {
        let mut bill = BillOfLading::new()
            .with(FieldId::Rate, "85.50")
            .with(FieldId::RevenueTons, "12.4");
        assert_eq!(apply_freight(&mut bill), Some(1060.2));
        assert_eq!(bill.value(FieldId::Prepaid), Some("1060.20"));
        assert_eq!(bill.value(FieldId::Collect), None);
    }

    #[test]
    fn test_collect_terms_fill_collect() {
        let mut bill = BillOfLading::new()
            .with(FieldId::Rate, "10")
            .with(FieldId::RevenueTons, "3");
        bill.freight_terms = FreightTerms::Collect;
        apply_freight(&mut bill);
        assert_eq!(bill.value(FieldId::Collect), Some("30.00"));
        assert_eq!(bill.value(FieldId::Prepaid), None);
    }

    #[test]
    fn test_user_amount_kept() {
        let mut bill = BillOfLading::new()
            .with(FieldId::Rate, "10")
            .with(FieldId::RevenueTons, "3")
            .with(FieldId::Prepaid, "AS ARRANGED");
        assert_eq!(apply_freight(&mut bill), None);
        assert_eq!(bill.value(FieldId::Prepaid), Some("AS ARRANGED"));
    }

    #[test]
    fn test_non_numeric_rate_leaves_bill_alone() {
        let mut bill = BillOfLading::new()
            .with(FieldId::Rate, "as agreed")
            .with(FieldId::RevenueTons, "3");
        assert_eq!(apply_freight(&mut bill), None);
        assert_eq!(bill.value(FieldId::Prepaid), None);
    }
}
