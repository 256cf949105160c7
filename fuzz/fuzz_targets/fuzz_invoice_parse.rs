#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    // Malformed input must come back as an error, never a panic.
    if let Ok(doc) = hoadon::xml::Document::parse(&text) {
        let invoice = hoadon::extract::extract_invoice(&doc);
        let _ = invoice.header.issue_date_value();
        for item in &invoice.items {
            let _ = item.after_tax_amount();
        }
    }
});
