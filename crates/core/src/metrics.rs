//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 스캐너는 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않은 경우 매크로 호출은 no-op입니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `scanpost_`
//! - 모듈명: `nmap_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(scanpost_core::metrics::NMAP_SCANS_TOTAL, "result" => "success").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 실패 종류 레이블 키 (binary_not_found, execution_failed, ...)
pub const LABEL_ERROR_KIND: &str = "kind";

// ─── nmap 스캐너 메트릭 ────────────────────────────────────────────

/// 실행된 전체 스캔 수 (counter, label: result)
pub const NMAP_SCANS_TOTAL: &str = "scanpost_nmap_scans_total";

/// 실패한 스캔 수 (counter, label: kind)
pub const NMAP_SCAN_FAILURES_TOTAL: &str = "scanpost_nmap_scan_failures_total";

/// 정규화된 호스트 수 (counter)
pub const NMAP_HOSTS_PARSED_TOTAL: &str = "scanpost_nmap_hosts_parsed_total";

/// 스캔 1회 소요 시간 (histogram, 초): 프로세스 실행과 정규화 포함
pub const NMAP_SCAN_DURATION_SECONDS: &str = "scanpost_nmap_scan_duration_seconds";

/// 전체 메트릭 이름 목록
pub const ALL_METRIC_NAMES: &[&str] = &[
    NMAP_SCANS_TOTAL,
    NMAP_SCAN_FAILURES_TOTAL,
    NMAP_HOSTS_PARSED_TOTAL,
    NMAP_SCAN_DURATION_SECONDS,
];

/// 스캔 지연 시간 히스토그램 버킷 (초)
///
/// nmap 스캔은 수 초에서 수십 분까지 걸릴 수 있습니다.
pub const SCAN_DURATION_BUCKETS: [f64; 9] =
    [0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0, 900.0, 3600.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(NMAP_SCANS_TOTAL, "Total number of nmap scans by result");
    describe_counter!(
        NMAP_SCAN_FAILURES_TOTAL,
        "Failed nmap scans by failure kind"
    );
    describe_counter!(
        NMAP_HOSTS_PARSED_TOTAL,
        "Total host records normalized from nmap XML"
    );
    describe_histogram!(
        NMAP_SCAN_DURATION_SECONDS,
        "nmap scan latency (process + normalization) in seconds"
    );
}
