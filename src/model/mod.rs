//! # Bill Model
//!
//! The input side of the engine: a flat set of field values, zero or more
//! cargo line items and an optional tracking URL. A bill is built once per
//! submission (from url-encoded form data or JSON), read by the document
//! builder, and dropped when the PDF has been produced.
//!
//! Nothing here is validated beyond trimming: missing values are the normal
//! case and are replaced by the placeholder when the content is built.

mod charges;
mod fields;

pub use charges::{apply_freight, parse_amount};
pub use fields::{Captions, FieldId, FieldSpec};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Separator between the columns of one `cargo_lines` entry.
pub const CARGO_LINE_SEPARATOR: char = '|';

/// Who pays the ocean freight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FreightTerms {
    #[default]
    Prepaid,
    Collect,
}

impl FreightTerms {
    /// Parse a form value; anything unrecognised is `Prepaid`.
    pub fn from_form_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("collect") {
            FreightTerms::Collect
        } else {
            FreightTerms::Prepaid
        }
    }
}

/// One line of the cargo manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CargoItem {
    pub container_no: String,
    pub packages: String,
    pub description: String,
    pub gross_weight: String,
    pub measurement: String,
}

impl CargoItem {
    pub fn is_blank(&self) -> bool {
        [
            &self.container_no,
            &self.packages,
            &self.description,
            &self.gross_weight,
            &self.measurement,
        ]
        .iter()
        .all(|s| s.trim().is_empty())
    }

    /// The value printed in a given manifest column.
    pub fn column(&self, id: FieldId) -> &str {
        match id {
            FieldId::ContainerNo => &self.container_no,
            FieldId::Packages => &self.packages,
            FieldId::Description => &self.description,
            FieldId::GrossWeight => &self.gross_weight,
            FieldId::Measurement => &self.measurement,
            _ => "",
        }
    }

    /// Parse one `cargo_lines` entry: `container | packages | description |
    /// weight | measurement`. Missing trailing columns are empty; extra
    /// separators stay in the measurement column.
    pub fn from_line(line: &str) -> Self {
        let mut parts = line.splitn(5, CARGO_LINE_SEPARATOR).map(|p| p.trim().to_string());
        Self {
            container_no: parts.next().unwrap_or_default(),
            packages: parts.next().unwrap_or_default(),
            description: parts.next().unwrap_or_default(),
            gross_weight: parts.next().unwrap_or_default(),
            measurement: parts.next().unwrap_or_default(),
        }
    }
}

/// A submitted bill of lading.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BillInput", into = "BillInput")]
pub struct BillOfLading {
    values: HashMap<FieldId, String>,
    pub cargo: Vec<CargoItem>,
    pub tracking_url: Option<String>,
    pub freight_terms: FreightTerms,
}

/// Wire shape of a bill: field values keyed by their form keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct BillInput {
    fields: HashMap<String, String>,
    cargo: Vec<CargoItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tracking_url: Option<String>,
    freight_terms: FreightTerms,
}

impl From<BillInput> for BillOfLading {
    fn from(input: BillInput) -> Self {
        let mut bill = BillOfLading {
            cargo: input.cargo.into_iter().filter(|c| !c.is_blank()).collect(),
            tracking_url: input.tracking_url,
            freight_terms: input.freight_terms,
            ..Default::default()
        };
        for (key, value) in input.fields {
            match FieldId::from_key(&key) {
                Some(id) => bill.set(id, value),
                None => debug!(key = %key, "ignoring unknown field"),
            }
        }
        bill
    }
}

impl From<BillOfLading> for BillInput {
    fn from(bill: BillOfLading) -> Self {
        BillInput {
            fields: bill
                .values
                .into_iter()
                .map(|(id, v)| (id.key().to_string(), v))
                .collect(),
            cargo: bill.cargo,
            tracking_url: bill.tracking_url,
            freight_terms: bill.freight_terms,
        }
    }
}

impl BillOfLading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value. Line endings are normalised to `\n`.
    pub fn set(&mut self, id: FieldId, value: impl Into<String>) {
        let value = value.into().replace("\r\n", "\n").replace('\r', "\n");
        self.values.insert(id, value);
    }

    pub fn with(mut self, id: FieldId, value: impl Into<String>) -> Self {
        self.set(id, value);
        self
    }

    /// The value of a field, or `None` when it is absent or blank.
    pub fn value(&self, id: FieldId) -> Option<&str> {
        self.values
            .get(&id)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// The tracking URL, or `None` when it is absent or blank.
    pub fn tracking_url(&self) -> Option<&str> {
        self.tracking_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// Build a bill from url-encoded form data.
    ///
    /// The single-line goods inputs (`container_no`, `quantity`, ...) form
    /// the first cargo item when any of them is filled; each non-blank line
    /// of `cargo_lines` adds another.
    pub fn from_form(form: &HashMap<String, String>) -> Self {
        let mut bill = BillOfLading::new();
        let mut first_item = CargoItem::default();

        for (key, value) in form {
            match key.as_str() {
                "tracking_url" => bill.tracking_url = Some(value.trim().to_string()),
                "freight_terms" => bill.freight_terms = FreightTerms::from_form_value(value),
                "cargo_lines" => {}
                _ => match FieldId::from_key(key) {
                    Some(FieldId::ContainerNo) => first_item.container_no = value.trim().to_string(),
                    Some(FieldId::Packages) => first_item.packages = value.trim().to_string(),
                    Some(FieldId::Description) => {
                        first_item.description = value.replace("\r\n", "\n").trim().to_string()
                    }
                    Some(FieldId::GrossWeight) => first_item.gross_weight = value.trim().to_string(),
                    Some(FieldId::Measurement) => first_item.measurement = value.trim().to_string(),
                    Some(id) => bill.set(id, value.as_str()),
                    None => debug!(key = %key, "ignoring unknown form field"),
                },
            }
        }

        if !first_item.is_blank() {
            bill.cargo.push(first_item);
        }
        if let Some(lines) = form.get("cargo_lines") {
            bill.cargo.extend(
                lines
                    .lines()
                    .map(CargoItem::from_line)
                    .filter(|item| !item.is_blank()),
            );
        }
        bill
    }

    /// Parse a bill from JSON.
    pub fn from_json(json: &str) -> Result<Self, crate::error::BolError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_blank_values_read_as_missing() {
        let bill = BillOfLading::new()
            .with(FieldId::Shipper, "   ")
            .with(FieldId::Consignee, "ACME");
        assert_eq!(bill.value(FieldId::Shipper), None);
        assert_eq!(bill.value(FieldId::Consignee), Some("ACME"));
        assert_eq!(bill.value(FieldId::NotifyParty), None);
    }

    #[test]
    fn test_crlf_normalised() {
        let bill = BillOfLading::new().with(FieldId::Shipper, "A\r\nB\rC");
        assert_eq!(bill.value(FieldId::Shipper), Some("A\nB\nC"));
    }

    #[test]
    fn test_from_form_builds_cargo() {
        let bill = BillOfLading::from_form(&form(&[
            ("bl_number", "MCL-001"),
            ("container_no", "MSCU1234567"),
            ("quantity", "10 PLT"),
            ("cargo_lines", "TGHU7654321 | 5 CTN | Spare parts | 800\n\n  \nABCU1111111|1 CS"),
            ("freight_terms", "collect"),
            ("tracking_url", " https://track.example.com/MCL-001 "),
            ("bogus", "x"),
        ]));
        assert_eq!(bill.value(FieldId::BlNumber), Some("MCL-001"));
        assert_eq!(bill.freight_terms, FreightTerms::Collect);
        assert_eq!(bill.tracking_url(), Some("https://track.example.com/MCL-001"));
        assert_eq!(bill.cargo.len(), 3);
        assert_eq!(bill.cargo[0].container_no, "MSCU1234567");
        assert_eq!(bill.cargo[0].packages, "10 PLT");
        assert_eq!(
            bill.cargo[1],
            CargoItem {
                container_no: "TGHU7654321".into(),
                packages: "5 CTN".into(),
                description: "Spare parts".into(),
                gross_weight: "800".into(),
                measurement: String::new(),
            }
        );
        assert_eq!(bill.cargo[2].packages, "1 CS");
        // cargo inputs are not duplicated as single values
        assert_eq!(bill.value(FieldId::ContainerNo), None);
    }

    #[test]
    fn test_empty_form_has_no_cargo() {
        let bill = BillOfLading::from_form(&form(&[("container_no", ""), ("cargo_lines", "")]));
        assert!(bill.cargo.is_empty());
        assert_eq!(bill.tracking_url(), None);
    }

    #[test]
    fn test_json_round_trip_keys() {
        let bill = BillOfLading::from_json(
            r#"{
                "fields": { "shipper": "ACME\nRotterdam", "doc_no": "D-1", "nope": "x" },
                "cargo": [ { "container_no": "C1" }, {} ],
                "freight_terms": "collect"
            }"#,
        )
        .unwrap();
        assert_eq!(bill.value(FieldId::Shipper), Some("ACME\nRotterdam"));
        assert_eq!(bill.value(FieldId::DocumentNo), Some("D-1"));
        assert_eq!(bill.cargo.len(), 1);
        assert_eq!(bill.freight_terms, FreightTerms::Collect);

        let json = serde_json::to_string(&bill).unwrap();
        assert!(json.contains("\"doc_no\":\"D-1\""), "{}", json);
        assert_eq!(BillOfLading::from_json(&json).unwrap(), bill);
    }

    #[test]
    fn test_cargo_line_keeps_extra_separators() {
        let item = CargoItem::from_line("a|b|c|d|e|f");
        assert_eq!(item.measurement, "e|f");
    }
}
