#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let once = hoadon::format_amount(s);
        if hoadon::parse_decimal(s).is_some() {
            assert_eq!(hoadon::format_amount(&once), once);
        }
        let _ = hoadon::core::format::format_after_tax(s, s, "VND");
    }
});
