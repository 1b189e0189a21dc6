//! named pipe 접근 로그 스트리머
//!
//! [`AccessLogStreamer`]는 Envoy가 기록하는 FIFO를 만들고, 한 줄씩 읽은 레코드를
//! 목적지 주소별 [`LogSender`](crate::sender::LogSender)로 전달합니다.
//!
//! # 레코드 처리 정책
//! - 형태가 잘못된 레코드, 연결 실패, 전송 실패는 경고 로그를 남기고 드롭합니다.
//! - 연결 실패 시 재시도하지 않습니다. 다음 레코드가 새 연결을 시도합니다.
//! - 한 목적지의 실패는 다른 목적지의 전달에 영향을 주지 않습니다.
//! - 같은 목적지의 레코드는 읽은 순서대로 전송됩니다.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use kuma_dp_core::error::{KumaDpError, PipelineError};
use kuma_dp_core::metrics as m;
use kuma_dp_core::pipeline::{HealthStatus, Pipeline};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::StreamerConfig;
use crate::error::StreamerError;
use crate::pipe;
use crate::record::PipeRecord;
use crate::registry::SenderRegistry;

/// EOF 또는 읽기 에러 후 FIFO를 다시 열기 전 대기 시간
const REOPEN_BACKOFF: Duration = Duration::from_millis(100);

/// 스트리머 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamerState {
    /// 생성됨, 아직 시작하지 않음
    Initialized,
    /// FIFO를 읽는 중
    Running,
    /// 정지됨
    Stopped,
}

/// 리더 루프 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    /// 입력이 끝남 (쓰는 쪽이 모두 닫힘)
    Eof,
    /// 취소 토큰에 의해 종료
    Cancelled,
}

// ─── Record dispatch ─────────────────────────────────────────────────

/// 읽은 한 줄을 파싱해서 레지스트리로 전달하는 처리기
#[derive(Clone)]
pub struct RecordDispatcher {
    registry: Arc<SenderRegistry>,
    max_record_size: usize,
}

impl RecordDispatcher {
    /// 새 처리기를 생성합니다.
    pub fn new(registry: Arc<SenderRegistry>, max_record_size: usize) -> Self {
        Self {
            registry,
            max_record_size,
        }
    }

    /// 레코드 최대 크기를 반환합니다.
    pub fn max_record_size(&self) -> usize {
        self.max_record_size
    }

    /// 한 줄을 처리합니다. 실패한 레코드는 로그를 남기고 드롭하며 에러를 반환하지 않습니다.
    pub async fn dispatch(&self, line: &[u8]) {
        if line.iter().all(u8::is_ascii_whitespace) {
            debug!("skipping blank access log record");
            return;
        }
        metrics::counter!(m::ACCESS_LOG_RECORDS_RECEIVED_TOTAL).increment(1);

        let Some(record) = PipeRecord::parse(line) else {
            let text = String::from_utf8_lossy(line);
            warn!(record = %text.trim_end(), "dropping malformed access log record");
            metrics::counter!(m::ACCESS_LOG_RECORDS_DROPPED_TOTAL, m::LABEL_REASON => m::DROP_REASON_MALFORMED)
                .increment(1);
            return;
        };

        match self.registry.send(&record.address, &record.message).await {
            Ok(()) => {
                trace!(address = %record.address, bytes = record.message.len(), "forwarded access log record");
                metrics::counter!(m::ACCESS_LOG_RECORDS_FORWARDED_TOTAL).increment(1);
            }
            Err(e) => {
                warn!(address = %record.address, error = %e, "dropping access log record");
                metrics::counter!(m::ACCESS_LOG_RECORDS_DROPPED_TOTAL, m::LABEL_REASON => e.drop_reason())
                    .increment(1);
            }
        }
    }

    /// 크기 제한을 넘은 레코드를 드롭합니다.
    fn drop_oversized(&self, size: usize) {
        metrics::counter!(m::ACCESS_LOG_RECORDS_RECEIVED_TOTAL).increment(1);
        warn!(
            size,
            max = self.max_record_size,
            "dropping access log record exceeding max size"
        );
        metrics::counter!(m::ACCESS_LOG_RECORDS_DROPPED_TOTAL, m::LABEL_REASON => m::DROP_REASON_TOO_LARGE)
            .increment(1);
    }
}

// ─── Reader loop ─────────────────────────────────────────────────────

/// 한 줄 읽기 결과
enum ReadOutcome {
    /// 버퍼에 한 레코드가 담김
    Record,
    /// 제한을 넘은 레코드를 다음 개행까지 버림 (버린 바이트 수)
    TooLarge(usize),
    /// 입력 끝
    Eof,
}

/// 개행을 뺀 길이가 `max` 바이트 이하인 한 줄을 `buf`에 읽는다. 넘으면 다음 개행까지 버린다.
async fn read_record<R>(reader: &mut R, buf: &mut Vec<u8>, max: usize) -> std::io::Result<ReadOutcome>
where
    R: AsyncBufRead + Unpin,
{
    let mut discarded: Option<usize> = None;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(match discarded {
                Some(size) => ReadOutcome::TooLarge(size),
                None if buf.is_empty() => ReadOutcome::Eof,
                None => ReadOutcome::Record,
            });
        }

        let newline = available.iter().position(|&b| b == b'\n');
        let chunk = newline.map_or(available.len(), |i| i + 1);

        if let Some(size) = discarded.as_mut() {
            *size += chunk;
        } else if buf.len() + chunk - usize::from(newline.is_some()) > max {
            discarded = Some(buf.len() + chunk);
            buf.clear();
        } else {
            buf.extend_from_slice(&available[..chunk]);
        }
        reader.consume(chunk);

        if newline.is_some() {
            return Ok(match discarded {
                Some(size) => ReadOutcome::TooLarge(size),
                None => ReadOutcome::Record,
            });
        }
    }
}

/// 개행으로 구분된 레코드를 읽어 처리기로 넘기는 루프
///
/// 취소 토큰이 취소되거나 입력이 끝날 때까지 실행됩니다. 레코드 단위 실패는
/// 루프를 멈추지 않으며, 읽기 I/O 에러만 반환합니다.
///
/// 취소는 레코드 사이에서만 확인합니다. 전송 중인 레코드는 끝까지 보내며,
/// 전송 시간은 전송기 타임아웃으로 제한됩니다.
pub async fn run_reader<R>(
    source: R,
    dispatcher: &RecordDispatcher,
    cancel: &CancellationToken,
) -> std::io::Result<ReaderExit>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(source);
    let mut line = Vec::with_capacity(1024);

    loop {
        line.clear();

        let outcome = tokio::select! {
            result = read_record(&mut reader, &mut line, dispatcher.max_record_size()) => result?,
            _ = cancel.cancelled() => return Ok(ReaderExit::Cancelled),
        };

        match outcome {
            ReadOutcome::Eof => return Ok(ReaderExit::Eof),
            ReadOutcome::TooLarge(size) => dispatcher.drop_oversized(size),
            ReadOutcome::Record => dispatcher.dispatch(&line).await,
        }
    }
}

/// FIFO를 열고 [`run_reader`]를 돌린다. EOF나 읽기 에러가 나면 다시 연다.
async fn pipe_reader_task(
    path: PathBuf,
    receiver: tokio::net::unix::pipe::Receiver,
    dispatcher: RecordDispatcher,
    cancel: CancellationToken,
) {
    let mut receiver = Some(receiver);

    loop {
        let source = match receiver.take() {
            Some(r) => r,
            None => match pipe::open_receiver(&path) {
                Ok(r) => r,
                Err(e) => {
                    error!(error = %e, "failed to reopen access log pipe");
                    tokio::select! {
                        _ = tokio::time::sleep(REOPEN_BACKOFF) => continue,
                        _ = cancel.cancelled() => break,
                    }
                }
            },
        };

        match run_reader(source, &dispatcher, &cancel).await {
            Ok(ReaderExit::Cancelled) => break,
            Ok(ReaderExit::Eof) => debug!(path = %path.display(), "access log pipe reached EOF, reopening"),
            Err(e) => error!(path = %path.display(), error = %e, "access log pipe read failed, reopening"),
        }

        tokio::select! {
            _ = tokio::time::sleep(REOPEN_BACKOFF) => {}
            _ = cancel.cancelled() => break,
        }
    }

    debug!(path = %path.display(), "access log pipe reader stopped");
}

// ─── Streamer ────────────────────────────────────────────────────────

/// named pipe 접근 로그 스트리머
///
/// core의 `Pipeline` trait을 구현하여 데몬에서 start/stop/health_check로 관리됩니다.
pub struct AccessLogStreamer {
    config: StreamerConfig,
    registry: Arc<SenderRegistry>,
    /// 레지스트리를 직접 만들었는지 여부 (공유 레지스트리는 소유자가 닫는다)
    owns_registry: bool,
    state: StreamerState,
    cancel_token: CancellationToken,
    reader_task: Option<JoinHandle<()>>,
}

impl AccessLogStreamer {
    /// 설정으로 스트리머를 생성합니다. 전송기 레지스트리는 새로 만듭니다.
    pub fn new(config: StreamerConfig) -> Self {
        let registry = Arc::new(SenderRegistry::new(config.connect_timeout()));
        Self::with_registry(config, registry, true)
    }

    fn with_registry(config: StreamerConfig, registry: Arc<SenderRegistry>, owns_registry: bool) -> Self {
        Self {
            config,
            registry,
            owns_registry,
            state: StreamerState::Initialized,
            cancel_token: CancellationToken::new(),
            reader_task: None,
        }
    }

    /// 빌더를 반환합니다.
    pub fn builder() -> AccessLogStreamerBuilder {
        AccessLogStreamerBuilder::new()
    }

    /// 설정을 반환합니다.
    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    /// FIFO 경로를 반환합니다.
    pub fn pipe_path(&self) -> &Path {
        &self.config.pipe_path
    }

    /// 공유 전송기 레지스트리를 반환합니다.
    pub fn registry(&self) -> Arc<SenderRegistry> {
        Arc::clone(&self.registry)
    }
}

impl Pipeline for AccessLogStreamer {
    async fn start(&mut self) -> Result<(), KumaDpError> {
        if self.state == StreamerState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        let path = self.config.pipe_path.clone();
        info!(path = %path.display(), "starting access log streamer");

        pipe::create_fifo(&path)?;
        let receiver = match pipe::open_receiver(&path) {
            Ok(receiver) => receiver,
            Err(e) => {
                pipe::remove_fifo(&path);
                return Err(e.into());
            }
        };

        self.cancel_token = CancellationToken::new();
        let dispatcher = RecordDispatcher::new(Arc::clone(&self.registry), self.config.max_record_size);
        self.reader_task = Some(tokio::spawn(pipe_reader_task(
            path,
            receiver,
            dispatcher,
            self.cancel_token.clone(),
        )));

        self.state = StreamerState::Running;
        info!("access log streamer started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), KumaDpError> {
        if self.state != StreamerState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        info!("stopping access log streamer");

        self.cancel_token.cancel();
        if let Some(task) = self.reader_task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "access log reader task ended abnormally");
            }
        }

        if self.owns_registry {
            self.registry.close_all().await;
        }
        pipe::remove_fifo(&self.config.pipe_path);

        self.state = StreamerState::Stopped;
        info!("access log streamer stopped");
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            StreamerState::Running => match &self.reader_task {
                Some(task) if task.is_finished() => {
                    HealthStatus::Unhealthy("pipe reader exited".to_owned())
                }
                _ => HealthStatus::Healthy,
            },
            StreamerState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            StreamerState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 스트리머 빌더
pub struct AccessLogStreamerBuilder {
    config: StreamerConfig,
    registry: Option<Arc<SenderRegistry>>,
}

impl AccessLogStreamerBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: StreamerConfig::default(),
            registry: None,
        }
    }

    /// 스트리머 설정을 지정합니다.
    pub fn config(mut self, config: StreamerConfig) -> Self {
        self.config = config;
        self
    }

    /// 외부 전송기 레지스트리를 지정합니다.
    ///
    /// [`AccessLogServer`](crate::server::AccessLogServer)와 공유하면
    /// 두 경로가 목적지별 연결을 함께 사용합니다. 공유 레지스트리는 정지 시
    /// 닫지 않으므로 소유자가 [`SenderRegistry::close_all`]을 호출해야 합니다.
    pub fn registry(mut self, registry: Arc<SenderRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 설정을 검증하고 스트리머를 생성합니다.
    pub fn build(self) -> Result<AccessLogStreamer, StreamerError> {
        self.config.validate()?;
        Ok(match self.registry {
            Some(registry) => AccessLogStreamer::with_registry(self.config, registry, false),
            None => AccessLogStreamer::new(self.config),
        })
    }
}

impl Default for AccessLogStreamerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
