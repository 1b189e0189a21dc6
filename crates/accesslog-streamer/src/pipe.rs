//! named pipe(FIFO) 생성, 열기, 제거

use std::ffi::CString;
use std::io::ErrorKind;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use tokio::net::unix::pipe;
use tracing::{debug, warn};

use crate::error::StreamerError;

/// FIFO 파일 권한 (소유자 읽기/쓰기)
const FIFO_MODE: libc::mode_t = 0o600;

/// 경로에 남아 있는 파일을 지우고 새 FIFO를 만듭니다.
pub fn create_fifo(path: &Path) -> Result<(), StreamerError> {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale access log pipe"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(setup_error(path, format!("failed to remove stale file: {}", e))),
    }

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| setup_error(path, "path contains a NUL byte"))?;

    // SAFETY: c_path는 호출 동안 유효한 NUL 종료 문자열이다
    let result = unsafe { libc::mkfifo(c_path.as_ptr(), FIFO_MODE) };
    if result != 0 {
        let err = std::io::Error::last_os_error();
        return Err(setup_error(path, format!("mkfifo failed: {}", err)));
    }

    debug!(path = %path.display(), "created access log pipe");
    Ok(())
}

/// FIFO를 읽기용으로 엽니다.
///
/// Linux에서는 읽기/쓰기 모드로 열어 쓰는 쪽이 모두 닫혀도 EOF를 받지 않습니다.
pub fn open_receiver(path: &Path) -> Result<pipe::Receiver, StreamerError> {
    let mut options = pipe::OpenOptions::new();
    #[cfg(target_os = "linux")]
    options.read_write(true);

    options
        .open_receiver(path)
        .map_err(|e| setup_error(path, format!("failed to open pipe: {}", e)))
}

/// FIFO 파일을 제거합니다. 이미 없으면 무시합니다.
pub fn remove_fifo(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed access log pipe"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove access log pipe"),
    }
}

fn setup_error(path: &Path, reason: impl Into<String>) -> StreamerError {
    StreamerError::PipeSetup {
        path: path.display().to_string(),
        reason: reason.into(),
    }
}
