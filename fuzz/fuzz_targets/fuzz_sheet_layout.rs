#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let name = hoadon::report::sanitize_sheet_name(&text);
    assert!((1..=31).contains(&name.chars().count()));

    if let Ok(doc) = hoadon::xml::Document::parse(&text) {
        let invoice = hoadon::extract::extract_invoice(&doc);
        let mut builder = hoadon::report::ReportBuilder::new(hoadon::ExportConfig::default());
        builder.add_invoice(&text, &invoice);
        let _ = builder.finish();
    }
});
