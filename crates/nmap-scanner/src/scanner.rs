//! nmap 스캐너 오케스트레이터 -- 요청 검증, 실행, 정규화
//!
//! [`NmapScanner`]는 스캔 요청 하나를 받아 다음 순서로 처리합니다.
//!
//! ```text
//! ScanRequest --> validate --> NmapInvoker --> size check --> normalize --> ScanResult
//!                    |              |               |             |
//!                    +--------------+-------+-------+-------------+
//!                                           v
//!                                       ScanError
//! ```
//!
//! 실패는 어느 단계에서든 그 자리에서 멈추고 단일 [`ScanError`]로 보고됩니다.
//! 스캐너는 호출 간 상태를 공유하지 않으므로 여러 스레드에서 동시에 호출해도 됩니다.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use scanpost_core::metrics as m;

use crate::config::NmapScannerConfig;
use crate::error::{NmapScannerError, ScanError};
use crate::invoker::{CommandRunner, NmapInvoker, ProcessRunner};
use crate::normalizer::normalize;
use crate::types::{ScanRequest, ScanResult};

/// nmap 스캐너
///
/// [`NmapScannerBuilder`]로 생성합니다.
pub struct NmapScanner<R = ProcessRunner> {
    /// 스캐너 설정
    config: NmapScannerConfig,
    /// 프로세스 실행기
    invoker: NmapInvoker<R>,
    /// 성공한 스캔 수
    scans_completed: AtomicU64,
    /// 실패한 스캔 수
    scans_failed: AtomicU64,
}

impl<R: CommandRunner> NmapScanner<R> {
    /// 스캐너 설정을 반환합니다.
    pub fn config(&self) -> &NmapScannerConfig {
        &self.config
    }

    /// 성공한 스캔 수를 반환합니다.
    pub fn scans_completed(&self) -> u64 {
        self.scans_completed.load(Ordering::Relaxed)
    }

    /// 실패한 스캔 수를 반환합니다.
    pub fn scans_failed(&self) -> u64 {
        self.scans_failed.load(Ordering::Relaxed)
    }

    /// 스캔 요청 하나를 처리합니다.
    ///
    /// 요청 옵션이 공백뿐이면 설정의 `default_options`를 사용합니다.
    ///
    /// # Errors
    ///
    /// 검증, 실행, 크기 검사, 정규화 중 처음 실패한 단계의 에러를 반환합니다.
    pub fn scan(&self, request: &ScanRequest) -> Result<ScanResult, NmapScannerError> {
        let scan_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();

        let outcome = self.execute(&scan_id, request);

        let elapsed = started.elapsed();
        histogram!(m::NMAP_SCAN_DURATION_SECONDS).record(elapsed.as_secs_f64());

        match &outcome {
            Ok(result) => {
                self.scans_completed.fetch_add(1, Ordering::Relaxed);
                counter!(m::NMAP_SCANS_TOTAL, m::LABEL_RESULT => "success").increment(1);
                counter!(m::NMAP_HOSTS_PARSED_TOTAL).increment(result.host_count() as u64);
                info!(
                    scan_id = %scan_id,
                    host = %request.host,
                    hosts = result.host_count(),
                    open_ports = result.open_port_count(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "scan completed"
                );
            }
            Err(e) => {
                self.scans_failed.fetch_add(1, Ordering::Relaxed);
                counter!(m::NMAP_SCANS_TOTAL, m::LABEL_RESULT => "failure").increment(1);
                counter!(m::NMAP_SCAN_FAILURES_TOTAL, m::LABEL_ERROR_KIND => e.kind().as_str())
                    .increment(1);
                warn!(
                    scan_id = %scan_id,
                    host = %request.host,
                    kind = e.kind().as_str(),
                    error = %e,
                    "scan failed"
                );
            }
        }

        outcome
    }

    /// 호스트와 옵션으로 스캔하고 호출자용 결과를 반환합니다.
    pub fn run(&self, host: &str, options: &str) -> Result<ScanResult, ScanError> {
        self.scan(&ScanRequest::new(host, options))
            .map_err(ScanError::from)
    }

    fn execute(&self, scan_id: &str, request: &ScanRequest) -> Result<ScanResult, NmapScannerError> {
        request.validate()?;

        let options = self.config.effective_options(&request.options);
        debug!(scan_id = %scan_id, host = %request.host, options = %options, "starting scan");

        let output = self.invoker.run(&request.host, options)?;

        // 프로세스 출력을 모두 받은 뒤 검사합니다. 정규화 전에 거부할 뿐 읽기 중 메모리는 제한하지 않습니다.
        if output.stdout.len() > self.config.max_output_size {
            return Err(NmapScannerError::OutputTooLarge {
                size: output.stdout.len(),
                max: self.config.max_output_size,
            });
        }

        normalize(&output.stdout).inspect_err(|e| {
            if let NmapScannerError::Parse { reason } = e {
                debug!(scan_id = %scan_id, reason = %reason, "xml parse error");
            }
        })
    }
}

/// 스캐너 빌더
pub struct NmapScannerBuilder<R = ProcessRunner> {
    config: NmapScannerConfig,
    runner: R,
}

impl NmapScannerBuilder<ProcessRunner> {
    /// 실제 프로세스를 실행하는 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: NmapScannerConfig::default(),
            runner: ProcessRunner,
        }
    }
}

impl Default for NmapScannerBuilder<ProcessRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CommandRunner> NmapScannerBuilder<R> {
    /// 스캐너 설정을 지정합니다.
    pub fn config(mut self, config: NmapScannerConfig) -> Self {
        self.config = config;
        self
    }

    /// 프로세스 러너를 교체합니다 (테스트용 가짜 러너 주입 등).
    pub fn runner<R2: CommandRunner>(self, runner: R2) -> NmapScannerBuilder<R2> {
        NmapScannerBuilder {
            config: self.config,
            runner,
        }
    }

    /// 설정을 검증하고 스캐너를 빌드합니다.
    pub fn build(self) -> Result<NmapScanner<R>, NmapScannerError> {
        self.config.validate()?;

        let invoker = NmapInvoker::with_runner(self.config.binary.clone(), self.runner);
        info!(binary = %self.config.binary, "nmap scanner initialized");

        Ok(NmapScanner {
            config: self.config,
            invoker,
            scans_completed: AtomicU64::new(0),
            scans_failed: AtomicU64::new(0),
        })
    }
}

/// 기본 설정으로 스캔 한 번을 수행합니다.
///
/// `nmap`을 PATH에서 찾아 실행합니다.
pub fn run_scan(host: &str, options: &str) -> Result<ScanResult, ScanError> {
    NmapScannerBuilder::new()
        .build()
        .map_err(ScanError::from)?
        .run(host, options)
}
