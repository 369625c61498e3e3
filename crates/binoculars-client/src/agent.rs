//! 보고 에이전트.
//!
//! 시작 즉시 한 번 보고한 뒤, "간격 경과"와 "중지 요청" 중 먼저 오는 쪽을 기다린다.
//! 콜렉터가 양수 간격(분)을 돌려주면 다음 대기부터 그 간격을 쓰고,
//! 0이나 실패면 직전 간격을 유지한다. 재시도는 없다.
//!
//! `start`/`stop`은 하나의 락으로 보호되며 여러 태스크에서 동시에 호출해도 안전하다.
//! `stop`은 중지를 요청만 하고 기다리지 않는다. 루프 종료를 확인해야 하면
//! [`ReportingAgent::stop_and_wait`]를 사용한다.

use binoculars_core::config::{AgentConfig, DEFAULT_REQUEST_INTERVAL};
use binoculars_core::error::CoreError;
use binoculars_core::ports::metric_handler::MetricHandler;
use binoculars_core::ports::report_transport::ReportTransport;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::http_client::HttpReportClient;

/// start/stop이 공유하는 상태
#[derive(Default)]
struct AgentState {
    running: bool,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

/// 보고 루프 하나가 소유하는 값
struct ReportLoop {
    transport: Arc<dyn ReportTransport>,
    handler: Arc<dyn MetricHandler>,
    interval: Duration,
    published: Arc<Mutex<Option<Duration>>>,
}

impl ReportLoop {
    async fn run(
        mut self,
        loop_slot: Arc<tokio::sync::Mutex<()>>,
        mut stop_rx: oneshot::Receiver<()>,
    ) {
        // 이전 루프가 진행 중인 사이클을 끝낼 때까지 대기
        let _slot = tokio::select! {
            guard = loop_slot.lock_owned() => guard,
            _ = &mut stop_rx => return,
        };

        info!("보고 루프 시작 (간격 {:?})", self.interval);
        *self.published.lock() = Some(self.interval);

        loop {
            self.interval = self.cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut stop_rx => break,
            }
        }

        info!("보고 루프 종료");
    }

    /// 수집 → 전송 → 간격 갱신 → 콜백. 다음 대기 간격을 반환한다.
    async fn cycle(&self) -> Duration {
        let batch = self.handler.gather_metrics().await;
        let result = self.transport.send_metrics(&batch).await;

        let next = match &result {
            Ok(resp) => resp.request_interval().unwrap_or(self.interval),
            Err(e) => {
                debug!("보고 실패, 간격 유지: {e}");
                self.interval
            }
        };
        if next != self.interval {
            debug!("보고 간격 변경: {:?} → {next:?}", self.interval);
        }
        *self.published.lock() = Some(next);

        self.handler.handle_response(&result).await;
        next
    }
}

/// 보고 에이전트
///
/// 에이전트를 drop하면 중지 채널이 닫혀 루프도 다음 대기 시점에 종료된다.
pub struct ReportingAgent {
    transport: Arc<dyn ReportTransport>,
    handler: Arc<dyn MetricHandler>,
    default_interval: Mutex<Duration>,
    published: Arc<Mutex<Option<Duration>>>,
    loop_slot: Arc<tokio::sync::Mutex<()>>,
    state: Mutex<AgentState>,
}

impl ReportingAgent {
    /// 전송 계층과 핸들러로 에이전트 생성 (정지 상태)
    pub fn new(transport: Arc<dyn ReportTransport>, handler: Arc<dyn MetricHandler>) -> Self {
        Self {
            transport,
            handler,
            default_interval: Mutex::new(DEFAULT_REQUEST_INTERVAL),
            published: Arc::new(Mutex::new(None)),
            loop_slot: Arc::new(tokio::sync::Mutex::new(())),
            state: Mutex::new(AgentState::default()),
        }
    }

    /// HTTP 콜렉터 URL로 에이전트 생성
    pub fn http(collector_url: &str, handler: Arc<dyn MetricHandler>) -> Result<Self, CoreError> {
        let transport = HttpReportClient::new(collector_url)?;
        Ok(Self::new(Arc::new(transport), handler))
    }

    /// 설정으로 에이전트 생성
    pub fn from_config(
        config: &AgentConfig,
        handler: Arc<dyn MetricHandler>,
    ) -> Result<Self, CoreError> {
        let transport = HttpReportClient::with_timeout(&config.collector_url, config.request_timeout)?;
        let agent = Self::new(Arc::new(transport), handler);
        agent.set_default_request_interval(config.default_request_interval);
        Ok(agent)
    }

    /// 첫 서버 응답 전까지 사용할 간격 설정
    ///
    /// 다음 `start` 때 읽힌다. 실행 중인 루프에는 영향이 없다.
    pub fn set_default_request_interval(&self, interval: Duration) {
        if interval.is_zero() {
            warn!("0 보고 간격은 무시됨");
            return;
        }
        *self.default_interval.lock() = interval;
    }

    /// 보고 루프 시작. 이미 실행 중이면 아무것도 하지 않는다.
    ///
    /// Tokio 런타임 안에서 호출해야 한다.
    pub fn start(&self) {
        let mut state = self.state.lock();
        if state.running {
            debug!("에이전트가 이미 실행 중");
            return;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let report_loop = ReportLoop {
            transport: self.transport.clone(),
            handler: self.handler.clone(),
            interval: *self.default_interval.lock(),
            published: self.published.clone(),
        };
        let task = tokio::spawn(report_loop.run(self.loop_slot.clone(), stop_rx));

        state.running = true;
        state.stop_tx = Some(stop_tx);
        state.task = Some(task);
    }

    /// 보고 루프 중지 요청. 실행 중이 아니면 아무것도 하지 않는다.
    ///
    /// 진행 중인 사이클은 끝까지 수행된다. 종료를 기다리지 않는다.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        Self::signal_stop(&mut state);
    }

    /// 중지 요청 후 루프가 완전히 종료될 때까지 대기
    ///
    /// 앞서 `stop`만 하고 재시작한 경우, 그 이전 루프의 진행 중 사이클도 기다린다.
    pub async fn stop_and_wait(&self) {
        let task = {
            let mut state = self.state.lock();
            Self::signal_stop(&mut state);
            state.task.take()
        };

        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("보고 루프 비정상 종료: {e}");
            }
        }

        // 재시작 전에 중지된 루프가 아직 사이클을 수행 중일 수 있음
        let _drained = self.loop_slot.lock().await;
    }

    fn signal_stop(state: &mut AgentState) {
        if !state.running {
            return;
        }
        if let Some(tx) = state.stop_tx.take() {
            let _ = tx.send(());
        }
        state.running = false;
        debug!("에이전트 중지 요청");
    }

    /// 실행 중 여부
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// 루프가 마지막으로 채택한 간격 (루프가 없었으면 기본 간격)
    pub fn current_interval(&self) -> Duration {
        self.published
            .lock()
            .unwrap_or_else(|| *self.default_interval.lock())
    }
}
