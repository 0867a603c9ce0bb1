//! Per-period payment breakdown of a loan part or a whole mortgage

use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MortgageError, MortgageResult};

/// Fields a payment mapping must carry to be combined with a record
pub const BASE_FIELDS: [&str; 3] = ["amount_boy", "interest", "repayment"];

/// Fields derived from the base fields; tolerated in a mapping but ignored when combining
pub const DERIVED_FIELDS: [&str; 2] = ["payment", "amount_end"];

/// Payment information of a single period
///
/// Only the balance at the beginning of the period, the interest and the
/// repayment are stored. `payment` and `amount_end` are always derived, so
/// summing records never sums the derived values directly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Outstanding balance at the beginning of the period
    pub amount_boy: f64,

    /// Interest paid this period (fixed surcharge included)
    pub interest: f64,

    /// Principal repaid this period
    pub repayment: f64,
}

impl PaymentRecord {
    pub fn new(amount_boy: f64, interest: f64, repayment: f64) -> Self {
        Self {
            amount_boy,
            interest,
            repayment,
        }
    }

    /// Additive identity, also used as the accumulator of a mortgage step
    pub fn zero() -> Self {
        Self::default()
    }

    /// Total payment: interest plus repayment
    pub fn payment(&self) -> f64 {
        self.interest + self.repayment
    }

    /// Balance after this period's repayment
    pub fn amount_end(&self) -> f64 {
        self.amount_boy - self.repayment
    }

    /// Field-wise sum of two records
    pub fn combine(&self, other: &PaymentRecord) -> PaymentRecord {
        PaymentRecord {
            amount_boy: self.amount_boy + other.amount_boy,
            interest: self.interest + other.interest,
            repayment: self.repayment + other.repayment,
        }
    }

    /// Combine with a mapping of field names to values.
    ///
    /// The mapping must contain every base field and nothing outside the
    /// base and derived fields. Derived values are accepted but not used.
    pub fn combine_mapping(&self, mapping: &BTreeMap<String, f64>) -> MortgageResult<PaymentRecord> {
        let keys: Vec<&str> = mapping.keys().map(String::as_str).collect();
        check_mapping_keys(&keys)?;

        // keys were checked above, absent entries cannot occur
        let field = |name: &str| mapping.get(name).copied().unwrap_or_default();
        Ok(self.combine(&PaymentRecord::new(
            field("amount_boy"),
            field("interest"),
            field("repayment"),
        )))
    }

    /// Combine with a loosely typed value.
    ///
    /// Accepts the number `0` (identity) or an object shaped like a payment
    /// mapping. Anything else is a type mismatch.
    pub fn combine_value(&self, value: &Value) -> MortgageResult<PaymentRecord> {
        match value {
            Value::Number(n) if n.as_f64() == Some(0.0) => Ok(*self),
            Value::Object(object) => {
                let keys: Vec<&str> = object.keys().map(String::as_str).collect();
                check_mapping_keys(&keys)?;

                let mut mapping = BTreeMap::new();
                for (key, entry) in object {
                    let number = entry.as_f64().ok_or_else(|| MortgageError::TypeMismatch {
                        expected: format!("number for field '{}'", key),
                        found: value_kind(entry).to_string(),
                    })?;
                    mapping.insert(key.clone(), number);
                }
                self.combine_mapping(&mapping)
            }
            other => Err(MortgageError::TypeMismatch {
                expected: "payment record, payment mapping or 0".to_string(),
                found: value_kind(other).to_string(),
            }),
        }
    }

    /// Snapshot of base and derived fields
    pub fn as_mapping(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("amount_boy".to_string(), self.amount_boy),
            ("interest".to_string(), self.interest),
            ("repayment".to_string(), self.repayment),
            ("payment".to_string(), self.payment()),
            ("amount_end".to_string(), self.amount_end()),
        ])
    }
}

fn check_mapping_keys(keys: &[&str]) -> MortgageResult<()> {
    let missing: Vec<String> = BASE_FIELDS
        .iter()
        .filter(|required| !keys.contains(required))
        .map(|s| s.to_string())
        .collect();

    let unrecognized: Vec<String> = keys
        .iter()
        .filter(|k| !BASE_FIELDS.contains(*k) && !DERIVED_FIELDS.contains(*k))
        .map(|s| s.to_string())
        .collect();

    if missing.is_empty() && unrecognized.is_empty() {
        Ok(())
    } else {
        Err(MortgageError::Shape {
            missing,
            unrecognized,
        })
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "non-zero number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Add for PaymentRecord {
    type Output = PaymentRecord;

    fn add(self, other: PaymentRecord) -> PaymentRecord {
        self.combine(&other)
    }
}

impl AddAssign for PaymentRecord {
    fn add_assign(&mut self, other: PaymentRecord) {
        *self = self.combine(&other);
    }
}

impl Sum for PaymentRecord {
    fn sum<I: Iterator<Item = PaymentRecord>>(iter: I) -> Self {
        iter.fold(PaymentRecord::zero(), |acc, record| acc + record)
    }
}

impl<'a> Sum<&'a PaymentRecord> for PaymentRecord {
    fn sum<I: Iterator<Item = &'a PaymentRecord>>(iter: I) -> Self {
        iter.fold(PaymentRecord::zero(), |acc, record| acc + *record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn simple_payment() -> PaymentRecord {
        PaymentRecord::new(1000.0, 10.0, 20.0)
    }

    #[test]
    fn test_add_two_payments() {
        let other = PaymentRecord::new(0.0, 100.0, 0.0);
        let added = simple_payment() + other;

        assert_eq!(added.interest, 110.0);
        assert_eq!(added.amount_boy, 1000.0);
        assert_eq!(added.repayment, 20.0);
    }

    #[test]
    fn test_derived_fields() {
        let payment = simple_payment();
        assert_eq!(payment.payment(), payment.interest + payment.repayment);
        assert_eq!(payment.amount_end(), payment.amount_boy - payment.repayment);
    }

    #[test]
    fn test_combine_identity_and_commutativity() {
        let a = simple_payment();
        let b = PaymentRecord::new(250.5, 3.25, 17.125);

        assert_eq!(a.combine(&PaymentRecord::zero()), a);
        assert_eq!(a.combine_value(&json!(0)).unwrap(), a);
        assert_eq!(a.combine(&b), b.combine(&a));
    }

    #[test]
    fn test_combine_recomputes_derived_fields() {
        let a = simple_payment();
        let b = PaymentRecord::new(500.0, 5.0, 50.0);
        let combined = a + b;

        assert_eq!(combined.payment(), 85.0);
        assert_eq!(combined.amount_end(), 1430.0);
    }

    #[test]
    fn test_sum_of_records() {
        let records = vec![simple_payment(), simple_payment(), simple_payment()];
        let total: PaymentRecord = records.iter().sum();
        assert_eq!(total, PaymentRecord::new(3000.0, 30.0, 60.0));
    }

    #[test]
    fn test_combine_mapping_with_derived_fields() {
        let mapping = PaymentRecord::new(100.0, 1.0, 9.0).as_mapping();
        let combined = simple_payment().combine_mapping(&mapping).unwrap();

        assert_eq!(combined, PaymentRecord::new(1100.0, 11.0, 29.0));
    }

    #[test]
    fn test_combine_mapping_rejects_missing_keys() {
        let mapping = BTreeMap::from([
            ("amount_boy".to_string(), 1.0),
            ("interest".to_string(), 1.0),
        ]);

        match simple_payment().combine_mapping(&mapping) {
            Err(MortgageError::Shape { missing, unrecognized }) => {
                assert_eq!(missing, vec!["repayment".to_string()]);
                assert!(unrecognized.is_empty());
            }
            other => panic!("Expected shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_combine_mapping_rejects_unknown_keys() {
        let mut mapping = simple_payment().as_mapping();
        mapping.insert("fee".to_string(), 2.0);

        match simple_payment().combine_mapping(&mapping) {
            Err(MortgageError::Shape { missing, unrecognized }) => {
                assert!(missing.is_empty());
                assert_eq!(unrecognized, vec!["fee".to_string()]);
            }
            other => panic!("Expected shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_combine_value_object() {
        let value = json!({"amount_boy": 10.0, "interest": 1.0, "repayment": 2.0});
        let combined = simple_payment().combine_value(&value).unwrap();
        assert_eq!(combined, PaymentRecord::new(1010.0, 11.0, 22.0));
    }

    #[test]
    fn test_combine_value_type_mismatch() {
        let base = simple_payment();

        assert!(matches!(
            base.combine_value(&json!(5)),
            Err(MortgageError::TypeMismatch { .. })
        ));
        assert!(matches!(
            base.combine_value(&json!("payment")),
            Err(MortgageError::TypeMismatch { .. })
        ));
        assert!(matches!(
            base.combine_value(&json!({"amount_boy": "x", "interest": 1.0, "repayment": 2.0})),
            Err(MortgageError::TypeMismatch { .. })
        ));
        assert!(matches!(
            base.combine_value(&json!({"interest": 1.0})),
            Err(MortgageError::Shape { .. })
        ));
    }
}
