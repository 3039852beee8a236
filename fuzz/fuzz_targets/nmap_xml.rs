#![no_main]

use libfuzzer_sys::fuzz_target;
use scanpost_nmap::{ScanResult, normalize};

fuzz_target!(|data: &[u8]| {
    // 임의 바이트: 패닉 없이 Ok 또는 Err
    if let Ok(result) = normalize(data) {
        let json = serde_json::to_string(&result).expect("result must serialize");
        let back: ScanResult = serde_json::from_str(&json).expect("result must deserialize");
        assert_eq!(back, result);
    }
});
