use crate::domain::model::{WorkOrderDocument, ABSENT};
use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use serde_json::{Map, Value};

const PARTY_FIELDS: &[&str] = &[
    "name",
    "address1",
    "address2",
    "address3",
    "city",
    "state",
    "country",
    "country_code",
    "zip",
];

const CONTACT_FIELDS: &[&str] = &["name", "email", "contact_number"];

const DATE_FIELDS: &[&str] = &["date_ordered", "delivery_date"];

/// 常見的工單日期格式，依序嘗試
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
];

fn absent_record(fields: &[&str]) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|k| (k.to_string(), Value::String(ABSENT.to_string())))
            .collect(),
    )
}

/// Strips a Markdown code fence the model sometimes wraps around its JSON.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        // 單行 fence：去掉緊接的語言標記（json、JSON…）
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parses an ISO date out of the handful of layouts seen on work orders.
pub fn normalize_date(value: &str) -> Option<String> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// `int(float(q))` semantics; anything non-numeric becomes 0.
fn normalize_quantity(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
            .unwrap_or(0),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    }
}

fn normalize_header(header: &mut Map<String, Value>) {
    // 只補缺少的區塊，不覆寫模型提供的資料
    for key in ["ship_to", "bill_to"] {
        header
            .entry(key)
            .or_insert_with(|| absent_record(PARTY_FIELDS));
    }
    for key in ["buyer_contact", "shipping_contact"] {
        header
            .entry(key)
            .or_insert_with(|| absent_record(CONTACT_FIELDS));
    }

    for key in DATE_FIELDS {
        if let Some(Value::String(raw)) = header.get_mut(*key) {
            if raw.as_str() == ABSENT {
                continue;
            }
            match normalize_date(raw) {
                Some(iso) => *raw = iso,
                None => tracing::warn!("Unrecognized {} format kept as-is: {:?}", key, raw),
            }
        }
    }
}

fn normalize_item(index: usize, item: &mut Value) -> Result<()> {
    let Value::Object(item) = item else {
        return Err(EtlError::ValidationError {
            message: format!("extraction[{}] is not an object", index),
        });
    };

    let header = item
        .entry("header")
        .or_insert_with(|| Value::Object(Map::new()));
    match header {
        Value::Object(header) => normalize_header(header),
        _ => {
            return Err(EtlError::ValidationError {
                message: format!("extraction[{}].header is not an object", index),
            })
        }
    }

    if let Some(Value::Array(line_items)) = item.get_mut("line_items") {
        for line in line_items.iter_mut() {
            if let Value::Object(line) = line {
                let quantity = normalize_quantity(line.get("quantity"));
                line.insert("quantity".to_string(), Value::from(quantity));
            }
        }
    }

    Ok(())
}

/// Wraps, fills and coerces raw model output into the shape the schema expects.
pub fn normalize_output(data: Value) -> Result<Value> {
    let mut data = match data {
        Value::Object(map) if map.contains_key("extraction") => Value::Object(map),
        other => {
            tracing::debug!("Model output has no 'extraction' key, wrapping it");
            serde_json::json!({ "extraction": [other] })
        }
    };

    let items = match data.get_mut("extraction") {
        Some(Value::Array(items)) => items,
        _ => {
            return Err(EtlError::ValidationError {
                message: "extraction must be a list".to_string(),
            })
        }
    };
    if items.is_empty() {
        return Err(EtlError::ValidationError {
            message: "extraction list is empty".to_string(),
        });
    }
    for (index, item) in items.iter_mut().enumerate() {
        normalize_item(index, item)?;
    }

    Ok(data)
}

/// 解析、正規化並驗證模型輸出；失敗時保留原始輸出以便除錯
pub fn parse_work_order(raw_output: &str) -> Result<WorkOrderDocument> {
    let schema_error = |message: String| EtlError::SchemaError {
        message,
        raw_output: raw_output.to_string(),
    };

    let value: Value =
        serde_json::from_str(strip_code_fence(raw_output)).map_err(|e| schema_error(e.to_string()))?;
    let value = normalize_output(value).map_err(|e| schema_error(e.to_string()))?;

    serde_json::from_value(value).map_err(|e| schema_error(e.to_string()))
}
