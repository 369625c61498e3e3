//! 콜렉터 서버 감독.
//!
//! 서버 태스크와 종료 시그널 중 먼저 끝나는 쪽을 기다린다.
//! 시그널이 먼저면 서버에 graceful shutdown을 알리고 진행 중인 요청이 끝날 때까지 기다린다.
//! 서버가 먼저 멈추면 시그널은 기다리지 않는다.

use anyhow::{Context, Result};
use binoculars_core::error::CoreError;
use std::fmt;
use std::future::Future;
use std::io;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 종료를 요청한 OS 시그널
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// 서버가 멈춘 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    Signal(ShutdownSignal),
    ServerExited,
}

/// SIGINT 또는 SIGTERM 대기
#[cfg(unix)]
pub async fn os_signal() -> io::Result<ShutdownSignal> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(tokio::select! {
        _ = interrupt.recv() => ShutdownSignal::Interrupt,
        _ = terminate.recv() => ShutdownSignal::Terminate,
    })
}

/// Ctrl+C 대기
#[cfg(not(unix))]
pub async fn os_signal() -> io::Result<ShutdownSignal> {
    tokio::signal::ctrl_c().await?;
    Ok(ShutdownSignal::Interrupt)
}

/// 서버 감독자
pub struct ServerSupervisor {
    shutdown_tx: watch::Sender<bool>,
}

impl ServerSupervisor {
    pub fn new() -> Self {
        Self {
            shutdown_tx: watch::Sender::new(false),
        }
    }

    /// `Collector::serve`에 넘길 종료 수신기
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// graceful shutdown 요청. 처음 요청한 호출만 `true`를 반환한다.
    pub fn request_shutdown(&self) -> bool {
        self.shutdown_tx.send_if_modified(|stopping| {
            let first = !*stopping;
            *stopping = true;
            first
        })
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// 서버 태스크가 끝날 때까지 감독
    ///
    /// `stop`이 먼저 완료되면 종료를 요청하고 서버가 빠져나올 때까지 기다린다.
    /// 서버 실패와 태스크 패닉은 에러로 전파된다.
    pub async fn supervise<S>(
        &self,
        mut server: JoinHandle<Result<(), CoreError>>,
        stop: S,
    ) -> Result<StopCause>
    where
        S: Future<Output = io::Result<ShutdownSignal>>,
    {
        let cause = tokio::select! {
            signal = stop => {
                let signal = signal.context("시그널 핸들러 등록 실패")?;
                info!("{signal} 수신, 종료");
                self.request_shutdown();
                StopCause::Signal(signal)
            }
            served = &mut server => {
                served
                    .context("콜렉터 태스크 비정상 종료")?
                    .context("콜렉터 실행 실패")?;
                warn!("콜렉터가 종료 요청 없이 멈춤");
                return Ok(StopCause::ServerExited);
            }
        };

        server
            .await
            .context("콜렉터 태스크 비정상 종료")?
            .context("콜렉터 실행 실패")?;
        Ok(cause)
    }
}

impl Default for ServerSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
