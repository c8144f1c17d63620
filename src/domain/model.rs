use serde::{Deserialize, Serialize};

/// 欄位缺值時輸出的標記字串
pub const ABSENT: &str = "None";

/// Optional text field. Missing, `null` and the `"None"` marker all read as
/// absent; absent fields are written back out as `"None"`.
mod text_field {
    use super::ABSENT;
    use serde::de::{self, Deserializer};
    use serde::ser::Serializer;
    use serde::Deserialize;

    pub fn serialize<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.as_deref().unwrap_or(ABSENT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) if s == ABSENT => Ok(None),
            serde_json::Value::String(s) => Ok(Some(s)),
            serde_json::Value::Number(n) => Ok(Some(n.to_string())),
            serde_json::Value::Bool(b) => Ok(Some(b.to_string())),
            other => Err(de::Error::custom(format!(
                "expected a string, number or \"None\", found {}",
                kind(&other)
            ))),
        }
    }

    pub(super) fn kind(value: &serde_json::Value) -> &'static str {
        match value {
            serde_json::Value::Null => "null",
            serde_json::Value::Bool(_) => "a boolean",
            serde_json::Value::Number(_) => "a number",
            serde_json::Value::String(_) => "a string",
            serde_json::Value::Array(_) => "an array",
            serde_json::Value::Object(_) => "an object",
        }
    }
}

/// Vendor is either a full party or the bare `"None"` marker.
mod party_field {
    use super::{Party, ABSENT};
    use serde::de::{self, Deserializer};
    use serde::ser::Serializer;
    use serde::{Deserialize, Serialize};

    pub fn serialize<S: Serializer>(value: &Option<Party>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(party) => party.serialize(serializer),
            None => serializer.serialize_str(ABSENT),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Party>, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) if s == ABSENT => Ok(None),
            value @ serde_json::Value::Object(_) => {
                Party::deserialize(value).map(Some).map_err(de::Error::custom)
            }
            other => Err(de::Error::custom(format!(
                "expected a party object or \"None\", found {}",
                super::text_field::kind(&other)
            ))),
        }
    }
}

/// Integer quantity; floats truncate toward zero and numeric strings parse.
mod quantity_field {
    use serde::de::{self, Deserializer};
    use serde::Deserialize;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .ok_or_else(|| de::Error::custom(format!("quantity out of range: {}", n))),
            serde_json::Value::String(s) => s
                .trim()
                .parse::<f64>()
                .map(|f| f.trunc() as i64)
                .map_err(|_| de::Error::custom(format!("quantity is not numeric: {:?}", s))),
            other => Err(de::Error::custom(format!(
                "expected an integer quantity, found {}",
                super::text_field::kind(&other)
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Party {
    #[serde(default, with = "text_field")]
    pub name: Option<String>,
    #[serde(default, with = "text_field")]
    pub address1: Option<String>,
    #[serde(default, with = "text_field")]
    pub address2: Option<String>,
    #[serde(default, with = "text_field")]
    pub address3: Option<String>,
    #[serde(default, with = "text_field")]
    pub city: Option<String>,
    #[serde(default, with = "text_field")]
    pub state: Option<String>,
    #[serde(default, with = "text_field")]
    pub country: Option<String>,
    #[serde(default, with = "text_field")]
    pub country_code: Option<String>,
    #[serde(default, with = "text_field")]
    pub zip: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, with = "text_field")]
    pub name: Option<String>,
    #[serde(default, with = "text_field")]
    pub email: Option<String>,
    #[serde(default, with = "text_field")]
    pub contact_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub ship_to: Party,
    pub bill_to: Party,
    #[serde(default, with = "party_field")]
    pub vendor: Option<Party>,
    pub buyer_contact: Contact,
    pub shipping_contact: Contact,
    #[serde(default, with = "text_field")]
    pub project_number: Option<String>,
    #[serde(default, with = "text_field")]
    pub purchase_order_number: Option<String>,
    #[serde(default, with = "text_field")]
    pub job_name: Option<String>,
    #[serde(default, with = "text_field")]
    pub job_number: Option<String>,
    #[serde(default, with = "text_field")]
    pub quote_number: Option<String>,
    #[serde(default, with = "text_field")]
    pub date_ordered: Option<String>,
    #[serde(default, with = "text_field")]
    pub delivery_date: Option<String>,
    #[serde(default, with = "text_field")]
    pub shipping_instructions: Option<String>,
    #[serde(default, with = "text_field")]
    pub notes: Option<String>,
    #[serde(default, with = "text_field")]
    pub ship_via: Option<String>,
    #[serde(default, with = "text_field")]
    pub payment_terms: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, with = "text_field")]
    pub line_no: Option<String>,
    #[serde(default, with = "text_field")]
    pub on_hand: Option<String>,
    #[serde(default, with = "text_field")]
    pub to_buy: Option<String>,
    #[serde(default, deserialize_with = "quantity_field::deserialize")]
    pub quantity: i64,
    #[serde(default, with = "text_field")]
    pub uom: Option<String>,
    #[serde(default, with = "text_field")]
    pub unit_price: Option<String>,
    #[serde(default, with = "text_field")]
    pub currency: Option<String>,
    #[serde(default, with = "text_field")]
    pub part_numbers: Option<String>,
    #[serde(default, with = "text_field")]
    pub product_description: Option<String>,
    #[serde(default, with = "text_field")]
    pub spell_corrected_product_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionItem {
    pub header: Header,
    pub line_items: Vec<LineItem>,
}

/// 輸出檔案的根結構
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrderDocument {
    pub extraction: Vec<ExtractionItem>,
}

impl WorkOrderDocument {
    pub fn line_item_count(&self) -> usize {
        self.extraction.iter().map(|item| item.line_items.len()).sum()
    }
}

/// extract 階段的產出：模型回傳的原始文字
#[derive(Debug, Clone)]
pub struct RawExtraction {
    pub source_path: String,
    pub model: String,
    pub raw_output: String,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub document: WorkOrderDocument,
    pub json_output: String,
}
