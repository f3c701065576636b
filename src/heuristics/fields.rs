// src/heuristics/fields.rs

use std::sync::LazyLock;

use regex::Regex;

use super::InvoiceFields;

/// Pattern batteries — one ordered list per field, first match wins.
/// Compiled once; the tables are read-only afterwards.
static INVOICE_NUMBER: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)Invoice\s*#?:?\s*([\w\-/]+)").unwrap(),
        Regex::new(r"(?i)Invoice\s+No\.?\s*[:\-]?\s*([\w\-/]+)").unwrap(),
        Regex::new(r"(?i)\b(INV[\d\-]+)").unwrap(),
    ]
});

static TOTAL: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)Total\s*[:\-]?\s*(KES|USD|\$)?\s*([\d,]+\.\d{2})").unwrap(),
        Regex::new(r"(?i)(KES|USD|\$)?\s*([\d,]+\.\d{2})\s*Total").unwrap(),
        Regex::new(r"(?i)Amount\s*Due\s*[:\-]?\s*(KES|USD|\$)?\s*([\d,]+\.\d{2})").unwrap(),
    ]
});

static VENDOR_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Ltd|Limited|Company|Enterprises|Inc|Nairobi|PO Box|Kenya)").unwrap()
});

static PAYMENT_PERIOD: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)(\d{2}/\d{2}/\d{4})\s*[-–to]+\s*(\d{2}/\d{2}/\d{4})").unwrap(),
        // The gap between Start and End may span lines
        Regex::new(r"(?is)Start\s*[:\-]?\s*(\d{2}/\d{2}/\d{4})\s*.*?End\s*[:\-]?\s*(\d{2}/\d{2}/\d{4})")
            .unwrap(),
    ]
});

static NARRATION_KEYWORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(Narration|Payment For|Purpose|Description)").unwrap());

static NARRATION_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Narration|Payment For|Purpose|Description)\s*[:\-]?\s*(.+)").unwrap()
});

/// How far down the document the vendor line is looked for.
const VENDOR_SCAN_LINES: usize = 15;

/// Run every field battery over the text.
pub(super) fn extract(text: &str) -> InvoiceFields {
    InvoiceFields {
        invoice_number: extract_invoice_number(text),
        total: extract_total(text),
        vendor: extract_vendor(text),
        payment_period: extract_payment_period(text),
        payment_narration: extract_payment_narration(text),
    }
}

fn extract_invoice_number(text: &str) -> Option<String> {
    INVOICE_NUMBER
        .iter()
        .find_map(|re| re.captures(text))
        .map(|cap| cap[1].to_string())
}

fn extract_total(text: &str) -> Option<String> {
    for re in TOTAL.iter() {
        if let Some(cap) = re.captures(text) {
            let currency = cap.get(1).map_or("", |m| m.as_str());
            let amount = &cap[2];
            return Some(format!("{currency} {amount}").trim().to_string());
        }
    }
    None
}

fn extract_vendor(text: &str) -> Option<String> {
    text.lines()
        .take(VENDOR_SCAN_LINES)
        .find(|line| VENDOR_MARKERS.is_match(line))
        .map(|line| line.trim().to_string())
}

fn extract_payment_period(text: &str) -> Option<String> {
    PAYMENT_PERIOD
        .iter()
        .find_map(|re| re.captures(text))
        .map(|cap| format!("{} to {}", &cap[1], &cap[2]))
}

fn extract_payment_narration(text: &str) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        if !NARRATION_KEYWORDS.is_match(line) {
            continue;
        }
        // The line after the keyword wins, even when the keyword line
        // carries trailing text of its own. Compatibility policy.
        if i + 1 < lines.len() {
            return Some(lines[i + 1].trim().to_string());
        }
        if let Some(cap) = NARRATION_INLINE.captures(line) {
            return Some(cap[1].trim().to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_number_after_hash_colon() {
        let text = "ACME Supplies\nInvoice #: INV-2024-001\nDate: 05/03/2024";
        assert_eq!(
            extract_invoice_number(text).as_deref(),
            Some("INV-2024-001")
        );
    }

    #[test]
    fn test_invoice_number_bare_inv_token() {
        let text = "Reference INV-7723 attached for your records";
        assert_eq!(extract_invoice_number(text).as_deref(), Some("INV-7723"));
    }

    #[test]
    fn test_invoice_number_pattern_order_is_fixed() {
        // "Invoice No." is consumed by the first pattern, which captures
        // the token right after "Invoice". Long-standing behavior.
        let text = "Invoice No. 4412";
        assert_eq!(extract_invoice_number(text).as_deref(), Some("No"));
    }

    #[test]
    fn test_total_with_keyword_first() {
        let text = "Total: USD 1,250.00";
        assert_eq!(extract_total(text).as_deref(), Some("USD 1,250.00"));
    }

    #[test]
    fn test_total_reversed_order() {
        let text = "KES 3,400.00 Total";
        assert_eq!(extract_total(text).as_deref(), Some("KES 3,400.00"));
    }

    #[test]
    fn test_total_amount_due_without_currency() {
        let text = "Amount Due: 900.00";
        assert_eq!(extract_total(text).as_deref(), Some("900.00"));
    }

    #[test]
    fn test_vendor_line_in_header() {
        let text = "\n  Acme Enterprises Ltd, PO Box 100, Nairobi  \nTel: 0700 000000";
        assert_eq!(
            extract_vendor(text).as_deref(),
            Some("Acme Enterprises Ltd, PO Box 100, Nairobi")
        );
    }

    #[test]
    fn test_vendor_not_searched_past_line_limit() {
        let mut text = "line\n".repeat(VENDOR_SCAN_LINES);
        text.push_str("Acme Ltd\n");
        assert_eq!(extract_vendor(&text), None);
    }

    #[test]
    fn test_period_dash_separated() {
        let text = "Billing period 01/02/2024 - 29/02/2024 inclusive";
        assert_eq!(
            extract_payment_period(text).as_deref(),
            Some("01/02/2024 to 29/02/2024")
        );
    }

    #[test]
    fn test_period_start_end_same_line() {
        let text = "Start: 01/01/2024 ... End: 31/01/2024";
        assert_eq!(
            extract_payment_period(text).as_deref(),
            Some("01/01/2024 to 31/01/2024")
        );
    }

    #[test]
    fn test_period_start_end_across_lines() {
        let text = "Start: 01/01/2024\nsome other details\nEnd: 31/01/2024";
        assert_eq!(
            extract_payment_period(text).as_deref(),
            Some("01/01/2024 to 31/01/2024")
        );
    }

    #[test]
    fn test_narration_from_next_line() {
        let text = "Narration\nConsulting fees for March";
        assert_eq!(
            extract_payment_narration(text).as_deref(),
            Some("Consulting fees for March")
        );
    }

    #[test]
    fn test_narration_next_line_beats_same_line_text() {
        let text = "Narration: office rent\nApproved by accounts";
        assert_eq!(
            extract_payment_narration(text).as_deref(),
            Some("Approved by accounts")
        );
    }

    #[test]
    fn test_narration_same_line_when_keyword_line_is_last() {
        let text = "Payment For: consultancy services";
        assert_eq!(
            extract_payment_narration(text).as_deref(),
            Some("consultancy services")
        );
    }

    #[test]
    fn test_no_matches_anywhere() {
        let result = extract("completely unrelated text\nwith two lines");
        assert_eq!(result.coverage(), (0, 5));
    }
}
