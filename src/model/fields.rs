//! The printed fields of the form and their captions.
//!
//! Field identity is an enum, not a caption string: every lookup goes
//! through [`FieldId`], and the caption printed for it comes from a static
//! table that the layout configuration can override per field.

use std::collections::HashMap;

use crate::config::LayoutConfig;

/// Every field printed on the bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldId {
    Shipper,
    Consignee,
    NotifyParty,
    DocumentNo,
    BlNumber,
    ExportReferences,
    ForwardingAgent,
    Origin,
    AlsoNotify,
    OnwardRouting,
    VesselVoyage,
    PreCarriage,
    PlaceOfReceipt,
    PortOfLoading,
    PortOfDischarge,
    PlaceOfDelivery,
    TypeOfMove,
    ContainerNo,
    Packages,
    Description,
    GrossWeight,
    Measurement,
    DeclaredValue,
    FreightCharges,
    RevenueTons,
    Rate,
    Prepaid,
    Collect,
    Originals,
    PlaceOfIssue,
    DateOfIssue,
    OnBoardDate,
    Signature,
}

/// Static description of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Stable form / JSON key.
    pub key: &'static str,
    /// Number printed in front of the caption, e.g. `"2"` for `(2) Shipper`.
    pub number: &'static str,
    pub caption: &'static str,
    /// Whether the form offers a textarea for this field.
    pub multiline: bool,
}

const fn spec(key: &'static str, number: &'static str, caption: &'static str, multiline: bool) -> FieldSpec {
    FieldSpec {
        key,
        number,
        caption,
        multiline,
    }
}

impl FieldId {
    /// All fields in form order.
    pub const ALL: [FieldId; 33] = [
        FieldId::Shipper,
        FieldId::Consignee,
        FieldId::NotifyParty,
        FieldId::DocumentNo,
        FieldId::BlNumber,
        FieldId::ExportReferences,
        FieldId::ForwardingAgent,
        FieldId::Origin,
        FieldId::AlsoNotify,
        FieldId::OnwardRouting,
        FieldId::VesselVoyage,
        FieldId::PreCarriage,
        FieldId::PlaceOfReceipt,
        FieldId::PortOfLoading,
        FieldId::PortOfDischarge,
        FieldId::PlaceOfDelivery,
        FieldId::TypeOfMove,
        FieldId::ContainerNo,
        FieldId::Packages,
        FieldId::Description,
        FieldId::GrossWeight,
        FieldId::Measurement,
        FieldId::DeclaredValue,
        FieldId::FreightCharges,
        FieldId::RevenueTons,
        FieldId::Rate,
        FieldId::Prepaid,
        FieldId::Collect,
        FieldId::Originals,
        FieldId::PlaceOfIssue,
        FieldId::DateOfIssue,
        FieldId::OnBoardDate,
        FieldId::Signature,
    ];

    /// The cargo columns, which are entered per line item rather than once.
    pub const CARGO: [FieldId; 5] = [
        FieldId::ContainerNo,
        FieldId::Packages,
        FieldId::Description,
        FieldId::GrossWeight,
        FieldId::Measurement,
    ];

    pub fn spec(self) -> FieldSpec {
        match self {
            FieldId::Shipper => spec("shipper", "2", "Shipper / Exporter", true),
            FieldId::Consignee => spec("consignee", "3", "Consignee", true),
            FieldId::NotifyParty => spec("notify_party", "4", "Notify Party", true),
            FieldId::DocumentNo => spec("doc_no", "5", "Document No.", false),
            FieldId::BlNumber => spec("bl_number", "5A", "B/L No.", false),
            FieldId::ExportReferences => spec("export_ref", "6", "Export References", true),
            FieldId::ForwardingAgent => {
                spec("fwd_agent", "7", "Forwarding Agent / References", true)
            }
            FieldId::Origin => spec("origin", "8", "Point and Country of Origin", false),
            FieldId::AlsoNotify => {
                spec("also_notify", "9", "Also Notify / Routing & Instructions", true)
            }
            FieldId::OnwardRouting => spec("onward_routing", "10", "Onward Inland Routing", false),
            FieldId::VesselVoyage => spec("vessel_voyage", "11", "Vessel / Voyage", false),
            FieldId::PreCarriage => spec("pre_carriage", "12", "Pre-Carriage By", false),
            FieldId::PlaceOfReceipt => spec("place_receipt", "13", "Place of Receipt", false),
            FieldId::PortOfLoading => spec("port_loading", "14", "Port of Loading", false),
            FieldId::PortOfDischarge => spec("port_discharge", "15", "Port of Discharge", false),
            FieldId::PlaceOfDelivery => spec("place_delivery", "16", "Place of Delivery", false),
            FieldId::TypeOfMove => spec("type_of_move", "17", "Type of Move", false),
            FieldId::ContainerNo => spec("container_no", "18", "Container No. and Seal No.", false),
            FieldId::Packages => spec("quantity", "19", "Quantity and Kind of Packages", false),
            FieldId::Description => spec("description", "20", "Description of Goods", true),
            FieldId::GrossWeight => spec("weight", "21", "Gross Weight (KGS)", false),
            FieldId::Measurement => spec("measurement", "22", "Measurement (CBM)", false),
            FieldId::DeclaredValue => spec("declared_value", "23", "Declared Value", false),
            FieldId::FreightCharges => spec("freight_charges", "24", "Freight & Charges", true),
            FieldId::RevenueTons => spec("revenue_tons", "25", "Revenue Tons", false),
            FieldId::Rate => spec("rate", "26", "Rate", false),
            FieldId::Prepaid => spec("prepaid", "27", "Prepaid", false),
            FieldId::Collect => spec("collect", "28", "Collect", false),
            FieldId::Originals => spec("originals", "29", "Number of Original B/L", false),
            FieldId::PlaceOfIssue => spec("place_issue", "30", "Place of Issue", false),
            FieldId::DateOfIssue => spec("date_issue", "31", "Date of Issue", false),
            FieldId::OnBoardDate => spec("onboard_date", "32", "Shipped on Board Date", false),
            FieldId::Signature => spec("signature", "33", "Signature / For the Carrier", true),
        }
    }

    pub fn key(self) -> &'static str {
        self.spec().key
    }

    /// Look a field up by its form key.
    pub fn from_key(key: &str) -> Option<FieldId> {
        FieldId::ALL.iter().copied().find(|f| f.key() == key)
    }
}

/// Caption table with configuration overrides applied.
#[derive(Debug, Clone, Default)]
pub struct Captions {
    overrides: HashMap<FieldId, (String, String)>,
}

impl Captions {
    pub fn from_config(config: &LayoutConfig) -> Self {
        let mut overrides = HashMap::new();
        for (key, ov) in &config.captions {
            match FieldId::from_key(key) {
                Some(id) => {
                    let number = ov
                        .number
                        .clone()
                        .unwrap_or_else(|| id.spec().number.to_string());
                    overrides.insert(id, (number, ov.caption.clone()));
                }
                None => tracing::warn!(key = %key, "caption override for unknown field ignored"),
            }
        }
        Self { overrides }
    }

    /// The printed caption, `"(n) Caption"`, or just the caption when the
    /// number is empty.
    pub fn caption(&self, id: FieldId) -> String {
        let (number, caption) = match self.overrides.get(&id) {
            Some((n, c)) => (n.as_str(), c.as_str()),
            None => {
                let spec = id.spec();
                (spec.number, spec.caption)
            }
        };
        if number.is_empty() {
            caption.to_string()
        } else {
            format!("({}) {}", number, caption)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CaptionOverride;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique_and_round_trip() {
        let keys: HashSet<&str> = FieldId::ALL.iter().map(|f| f.key()).collect();
        assert_eq!(keys.len(), FieldId::ALL.len());
        for id in FieldId::ALL {
            assert_eq!(FieldId::from_key(id.key()), Some(id));
        }
        assert_eq!(FieldId::from_key("shiper"), None);
    }

    #[test]
    fn test_default_caption_has_number() {
        let captions = Captions::default();
        assert_eq!(captions.caption(FieldId::Shipper), "(2) Shipper / Exporter");
        assert_eq!(captions.caption(FieldId::DocumentNo), "(5) Document No.");
    }

    #[test]
    fn test_override_keeps_number_unless_given() {
        let mut config = LayoutConfig::default();
        config.captions.insert(
            "doc_no".to_string(),
            CaptionOverride {
                number: None,
                caption: "B/L No.".to_string(),
            },
        );
        config.captions.insert(
            "origin".to_string(),
            CaptionOverride {
                number: Some(String::new()),
                caption: "Origin".to_string(),
            },
        );
        config.captions.insert(
            "not_a_field".to_string(),
            CaptionOverride {
                number: None,
                caption: "x".to_string(),
            },
        );
        let captions = Captions::from_config(&config);
        assert_eq!(captions.caption(FieldId::DocumentNo), "(5) B/L No.");
        assert_eq!(captions.caption(FieldId::Origin), "Origin");
    }
}
