//! The extraction instruction sent alongside the page images.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — the prompt and the response parser are a
//!    matched pair: the prompt demands a bare JSON object with exactly four
//!    keys, and the parser's recovery logic assumes that shape. Changing
//!    one without the other breaks extraction silently.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    a live model call, catching contract regressions early.
//!
//! Callers can override via [`crate::config::ExtractionConfig::prompt`];
//! the constant here is used only when no override is provided.

/// Default instruction for extracting donation fields from a document image.
///
/// Used when `ExtractionConfig::prompt` is `None`.
pub const EXTRACTION_PROMPT: &str = r#"You are a highly accurate data extraction assistant. Your task is to extract specific donation details from the provided document image.

**FIELDS TO EXTRACT:**

1.  **Donor Name:**
    *   Locate the donor's name, typically found in the top section or on a check.
    *   **Exclude** organization names (e.g., "Ambulance Corps"), headers, or form labels.
    *   If multiple names are present (e.g., "John & Jane Doe"), include both.

2.  **Address:**
    *   Extract the full mailing address (Street, City, State, Zip).
    *   **CRITICAL:** The address MUST be a single line string. Replace any line breaks with a comma and a space (e.g., "123 Main St, Anytown, NY 12345").

3.  **Amount:**
    *   Extract the donation amount in USD.
    *   Look for the '$' symbol, "DOLLARS", or "AMOUNT" labels.
    *   **Format:** Return as a decimal string (e.g., "25.00").
    *   **Correction:** If you see a large integer like "2500" that clearly represents $25.00, convert it to "25.00".

4.  **Date:**
    *   Extract the date of the donation.
    *   **Format:** Convert to MM/DD/YYYY format (e.g., 11/06/2025).

**OUTPUT FORMAT:**

Return **ONLY** a valid JSON object with the following structure. Do not include markdown formatting (like ```json) or any other text.

{
  "name": "extracted name or null",
  "address": "single line address string or null",
  "amount": "decimal string or null",
  "date": "MM/DD/YYYY or null"
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_exactly_the_four_parsed_fields() {
        for field in ["name", "address", "amount", "date"] {
            assert!(
                EXTRACTION_PROMPT.contains(&format!("\"{field}\"")),
                "prompt must request the '{field}' key"
            );
        }
        // filename is attached by the parser, never requested from the model
        assert!(!EXTRACTION_PROMPT.contains("filename"));
    }

    #[test]
    fn prompt_demands_a_bare_json_object() {
        assert!(EXTRACTION_PROMPT.contains("ONLY"));
        assert!(EXTRACTION_PROMPT.contains("valid JSON object"));
    }
}
