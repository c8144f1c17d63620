const BASE_RULES: &str = "You are an expert data extraction model. Extract all fields from a roofing work-order PDF into valid JSON.\n\
- Use contextual clues (like proximity or headers) to populate fields, even if not explicitly labeled.\n\
- Do NOT fabricate values. Use only information visible in the text.\n\
- If a field is missing or unreadable, return the literal string \"None\".\n\
- Preserve all numeric fields as strings if unsure, but prefer integer for quantities.\n\
- Dates must be in YYYY-MM-DD format if detected; otherwise use \"None\".\n\
- Return ONLY valid JSON matching this structure:\n\
{ \"extraction\": [ { \"header\": {...}, \"line_items\": [...] } ] }\n";

/// 內建的屋頂工單欄位提示，依序加入 prompt
const ROOFING_HINTS: &[(&str, &str)] = &[
    ("header.job_number", "Use 'WO #' or similar as job_number."),
    ("header.date_ordered", "Extract from 'Start Date' or similar label."),
    ("header.delivery_date", "Extract from 'Delivery Date'"),
    ("header.bill_to.name", "Customer or company name only (exclude address numbers)."),
    ("header.bill_to.address1", "Street number and name of the billing address (e.g., '89 streetsman')."),
    ("header.bill_to.city", "City associated with billing address."),
    ("header.bill_to.state", "State abbreviation (like PN, GA, etc.)."),
    ("header.bill_to.zip", "Numeric ZIP code, even if short (e.g., '98')."),
    ("header.ship_to", "If separate shipping section is not found, use same details as bill_to."),
    ("header.buyer_contact.name", "Name of project consultant or manager."),
    ("header.buyer_contact.contact_number", "Phone number of the consultant or manager."),
    ("header.shipping_contact.name", "Contact responsible for delivery/shipping if mentioned."),
    ("header.shipping_instructions", "Include all crew and delivery-related notes and instructions."),
    ("line_items", "Extract every material line (e.g., taps, buckets, ring) as a separate entry."),
    ("line_items.quantity", "Numeric quantity preceding item name; round decimals if needed."),
    ("line_items.product_description", "Full product/material description."),
    ("line_items.spell_corrected_product_description", "Same as description, corrected if typos exist."),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHint {
    pub path: String,
    pub hint: String,
}

#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    field_hints: Vec<FieldHint>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hint(&mut self, path: impl Into<String>, hint: impl Into<String>) -> &mut Self {
        self.field_hints.push(FieldHint {
            path: path.into(),
            hint: hint.into(),
        });
        self
    }

    pub fn hints(&self) -> &[FieldHint] {
        &self.field_hints
    }

    pub fn build(&self, pdf_text: &str) -> String {
        let hint_lines = self
            .field_hints
            .iter()
            .map(|h| format!("- {}: {}", h.path, h.hint))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{}\nField-Level Hints:\n{}\n\nPDF_TEXT START\n{}\nPDF_TEXT END\n\nRETURN: Valid JSON only.",
            BASE_RULES,
            hint_lines,
            pdf_text.trim()
        )
    }
}

pub fn roofing_prompt_builder() -> PromptBuilder {
    let mut builder = PromptBuilder::new();
    for (path, hint) in ROOFING_HINTS {
        builder.add_hint(*path, *hint);
    }
    builder
}

pub fn build_final_prompt(pdf_text: &str) -> String {
    roofing_prompt_builder().build(pdf_text)
}

/// 內建提示之後再附加設定檔提供的提示
pub fn build_prompt_with_hints(pdf_text: &str, extra_hints: &[(String, String)]) -> String {
    let mut builder = roofing_prompt_builder();
    for (path, hint) in extra_hints {
        builder.add_hint(path.as_str(), hint.as_str());
    }
    builder.build(pdf_text)
}
