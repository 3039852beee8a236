//! nmap 프로세스 실행기
//!
//! [`NmapInvoker`]는 대상 호스트와 자유 형식 옵션 문자열로 인자 벡터를 만들고,
//! XML 출력(`-oX -`)이 요청되어 있는지 보장한 뒤 프로세스를 한 번 실행합니다.
//!
//! 프로세스 실행은 [`CommandRunner`] trait을 거치므로 테스트에서는
//! 실제 nmap 없이 가짜 러너를 주입할 수 있습니다.
//!
//! ```text
//! ┌──────────────┐
//! │ NmapInvoker  │  build_args(options, host)
//! └──────┬───────┘
//!        ▼
//!  ┌──────────────┐
//!  │CommandRunner │ (trait)
//!  └──────────────┘
//!     │        │
//!     ▼        ▼
//! ┌────────┐ ┌──────┐
//! │Process │ │ Fake │
//! └───┬────┘ └──────┘
//!     ▼
//!   nmap
//! ```
//!
//! # 신뢰 경계
//!
//! 옵션 문자열은 검증하거나 정제하지 않고 토큰 단위로 그대로 전달합니다.
//! 셸을 거치지 않으므로 인용 문제는 없지만, 임의의 nmap 플래그(예: `-oN /path`,
//! `--script`)를 허용할지는 호출자가 결정해야 합니다.

use std::io::ErrorKind;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::NmapScannerError;

/// XML 출력 플래그
pub const XML_OUTPUT_FLAG: &str = "-oX";
/// 표준 출력을 가리키는 파일 인자
pub const STDOUT_TARGET: &str = "-";

/// 프로세스 실행 결과 (표준 스트림 전체 + 종료 코드)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawOutput {
    /// 표준 출력 전체
    pub stdout: Vec<u8>,
    /// 표준 에러 전체
    pub stderr: Vec<u8>,
    /// 종료 코드 (시그널로 종료되면 None)
    pub exit_code: Option<i32>,
}

impl RawOutput {
    /// 종료 코드가 0인지 확인합니다.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// 표준 에러를 손실 허용 UTF-8로 디코딩하고 끝 공백을 제거합니다.
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim_end().to_owned()
    }
}

/// 외부 프로세스 실행 추상화
///
/// 구현체는 프로세스를 한 번 실행하고 완료까지 동기적으로 기다려
/// 두 표준 스트림을 모두 수집해야 합니다.
pub trait CommandRunner: Send + Sync {
    /// `program`을 `args`로 실행합니다.
    ///
    /// # Errors
    ///
    /// 프로세스를 생성하거나 기다리지 못하면 원본 `std::io::Error`를 반환합니다.
    /// 바이너리가 없으면 `ErrorKind::NotFound`여야 합니다.
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<RawOutput>;
}

/// `std::process::Command` 기반 러너
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> std::io::Result<RawOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()?;

        Ok(RawOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }
}

/// nmap 실행기
pub struct NmapInvoker<R = ProcessRunner> {
    binary: String,
    runner: R,
}

impl NmapInvoker<ProcessRunner> {
    /// 실제 프로세스를 실행하는 실행기를 생성합니다.
    pub fn new(binary: impl Into<String>) -> Self {
        Self::with_runner(binary, ProcessRunner)
    }
}

impl<R: CommandRunner> NmapInvoker<R> {
    /// 주어진 러너로 실행기를 생성합니다.
    pub fn with_runner(binary: impl Into<String>, runner: R) -> Self {
        Self {
            binary: binary.into(),
            runner,
        }
    }

    /// 실행할 바이너리 이름을 반환합니다.
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// 프로세스 러너를 반환합니다.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// nmap을 한 번 실행하고 성공한 출력을 반환합니다.
    ///
    /// # Errors
    ///
    /// - `BinaryNotFound`: 실행 경로에 바이너리 없음
    /// - `ExecutionFailed`: 0이 아닌 종료 코드 또는 시그널 종료
    /// - `EmptyOutput`: 정상 종료했지만 표준 출력이 비어 있음
    /// - `Spawn`: 그 밖의 생성/대기 실패
    pub fn run(&self, host: &str, options: &str) -> Result<RawOutput, NmapScannerError> {
        let args = build_args(options, host);
        debug!(binary = %self.binary, args = ?args, "spawning nmap");

        let output = self
            .runner
            .run(&self.binary, &args)
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => NmapScannerError::BinaryNotFound {
                    binary: self.binary.clone(),
                },
                _ => NmapScannerError::Spawn {
                    binary: self.binary.clone(),
                    source: e,
                },
            })?;

        debug!(
            exit_code = ?output.exit_code,
            stdout_bytes = output.stdout.len(),
            stderr_bytes = output.stderr.len(),
            "nmap exited"
        );

        if !output.success() {
            return Err(NmapScannerError::ExecutionFailed {
                exit_code: output.exit_code,
                stderr: output.stderr_text(),
            });
        }

        if output.stdout.is_empty() {
            return Err(NmapScannerError::EmptyOutput);
        }

        Ok(output)
    }
}

/// nmap 인자 벡터를 구성합니다.
///
/// 결과: `[<옵션 토큰>.., "-oX", "-", <host>]`.
/// 옵션에 이미 `-oX -` 쌍이 있으면 다시 추가하지 않습니다.
pub fn build_args(options: &str, host: &str) -> Vec<String> {
    let mut args: Vec<String> = options.split_whitespace().map(str::to_owned).collect();

    if !requests_xml_stdout(&args) {
        args.push(XML_OUTPUT_FLAG.to_owned());
        args.push(STDOUT_TARGET.to_owned());
    }

    args.push(host.to_owned());
    args
}

/// 토큰 목록에 인접한 `-oX -` 쌍이 있는지 확인합니다.
fn requests_xml_stdout(tokens: &[String]) -> bool {
    tokens
        .windows(2)
        .any(|pair| pair[0] == XML_OUTPUT_FLAG && pair[1] == STDOUT_TARGET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// 미리 정해진 응답을 돌려주고 호출 인자를 기록하는 러너
    struct FakeRunner {
        response: Mutex<Option<std::io::Result<RawOutput>>>,
        calls: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl FakeRunner {
        fn returning(response: std::io::Result<RawOutput>) -> Self {
            Self {
                response: Mutex::new(Some(response)),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn exited(code: i32, stdout: &str, stderr: &str) -> Self {
            Self::returning(Ok(RawOutput {
                stdout: stdout.as_bytes().to_vec(),
                stderr: stderr.as_bytes().to_vec(),
                exit_code: Some(code),
            }))
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[String]) -> std::io::Result<RawOutput> {
            self.calls
                .lock()
                .unwrap()
                .push((program.to_owned(), args.to_vec()));
            self.response
                .lock()
                .unwrap()
                .take()
                .expect("fake runner called more than once")
        }
    }

    #[test]
    fn build_args_appends_xml_flag_before_host() {
        let args = build_args("-sV -T4", "scanme.nmap.org");
        assert_eq!(args, vec!["-sV", "-T4", "-oX", "-", "scanme.nmap.org"]);
    }

    #[test]
    fn build_args_keeps_existing_xml_flag() {
        let args = build_args("-oX - -sV", "10.0.0.1");
        assert_eq!(args, vec!["-oX", "-", "-sV", "10.0.0.1"]);
    }

    #[test]
    fn build_args_with_empty_options() {
        let args = build_args("   ", "10.0.0.1");
        assert_eq!(args, vec!["-oX", "-", "10.0.0.1"]);
    }

    #[test]
    fn build_args_xml_to_file_still_requests_stdout() {
        let args = build_args("-oX out.xml", "10.0.0.1");
        assert_eq!(args, vec!["-oX", "out.xml", "-oX", "-", "10.0.0.1"]);
    }

    #[test]
    fn run_passes_binary_and_args_to_runner() {
        let invoker = NmapInvoker::with_runner("nmap", FakeRunner::exited(0, "<nmaprun/>", ""));
        invoker.run("10.0.0.1", "-F").unwrap();

        let calls = invoker.runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "nmap");
        assert_eq!(calls[0].1, vec!["-F", "-oX", "-", "10.0.0.1"]);
    }

    #[test]
    fn run_returns_output_on_success() {
        let invoker = NmapInvoker::with_runner("nmap", FakeRunner::exited(0, "<nmaprun/>", ""));
        let output = invoker.run("10.0.0.1", "").unwrap();
        assert_eq!(output.stdout, b"<nmaprun/>");
        assert!(output.success());
    }

    #[test]
    fn run_maps_not_found_to_binary_not_found() {
        let runner = FakeRunner::returning(Err(std::io::Error::new(ErrorKind::NotFound, "nope")));
        let err = NmapInvoker::with_runner("nmap", runner)
            .run("10.0.0.1", "")
            .unwrap_err();
        assert!(matches!(err, NmapScannerError::BinaryNotFound { .. }));
        assert_eq!(err.to_string(), "binary not found");
    }

    #[test]
    fn run_maps_other_io_errors_to_unexpected() {
        let runner = FakeRunner::returning(Err(std::io::Error::new(
            ErrorKind::PermissionDenied,
            "permission denied",
        )));
        let err = NmapInvoker::with_runner("nmap", runner)
            .run("10.0.0.1", "")
            .unwrap_err();
        assert_eq!(err.to_string(), "unexpected error: permission denied");
    }

    #[test]
    fn run_reports_stderr_on_nonzero_exit() {
        let invoker = NmapInvoker::with_runner("nmap", FakeRunner::exited(1, "", "QUITTING!\n"));
        let err = invoker.run("10.0.0.1", "--bogus").unwrap_err();
        assert_eq!(err.to_string(), "execution failed: QUITTING!");
    }

    #[test]
    fn run_treats_signal_termination_as_failure() {
        let runner = FakeRunner::returning(Ok(RawOutput {
            stdout: b"<nmaprun>".to_vec(),
            stderr: Vec::new(),
            exit_code: None,
        }));
        let err = NmapInvoker::with_runner("nmap", runner)
            .run("10.0.0.1", "")
            .unwrap_err();
        assert!(matches!(
            err,
            NmapScannerError::ExecutionFailed { exit_code: None, .. }
        ));
    }

    #[test]
    fn run_rejects_empty_stdout() {
        let invoker = NmapInvoker::with_runner("nmap", FakeRunner::exited(0, "", ""));
        let err = invoker.run("10.0.0.1", "").unwrap_err();
        assert_eq!(err.to_string(), "no output produced");
    }

    #[test]
    fn process_runner_missing_binary_is_not_found() {
        let invoker = NmapInvoker::new("scanpost-definitely-missing-binary-7f3a");
        let err = invoker.run("127.0.0.1", "-sV").unwrap_err();
        assert!(matches!(err, NmapScannerError::BinaryNotFound { .. }));
    }
}
