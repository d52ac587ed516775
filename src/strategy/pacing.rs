//! 重试 / 退避控制
//!
//! 正常活动之后停顿较长，出错之后停顿较短；余额不足立即终止。

use crate::core::executor::ExecutionOutcome;
use crate::core::types::AutomationError;
use async_trait::async_trait;
use rand::Rng;
use std::ops::Range;
use std::str::FromStr;
use std::time::Duration;

/// 成功 / 跳过之后的停顿 (秒)
pub const ACTIVITY_PAUSE_SECS: Range<u64> = 15..121;
/// 非致命错误之后的停顿 (秒)
pub const ERROR_PAUSE_SECS: Range<u64> = 15..31;

/// 控制器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerState {
    Running,
    PausedAfterSuccess,
    PausedAfterSkip,
    PausedAfterError,
    Aborted,
    Completed,
}

/// 预算跳过之后使用哪种停顿
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipPause {
    /// 与成功相同的长停顿
    #[default]
    Activity,
    /// 与错误相同的短停顿
    Error,
}

impl FromStr for SkipPause {
    type Err = AutomationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "activity" | "success" => Ok(SkipPause::Activity),
            "error" => Ok(SkipPause::Error),
            other => Err(AutomationError::ConfigError(format!("Invalid SKIP_PAUSE: {}", other))),
        }
    }
}

pub struct BackoffController {
    state: PacerState,
    skip_pause: SkipPause,
    requested: u64,
}

impl BackoffController {
    pub fn new(requested: u64, skip_pause: SkipPause) -> Self {
        Self {
            state: PacerState::Running,
            skip_pause,
            requested,
        }
    }

    pub fn state(&self) -> PacerState {
        self.state
    }

    /// 运行是否已经结束 (完成或终止)
    pub fn is_finished(&self) -> bool {
        matches!(self.state, PacerState::Aborted | PacerState::Completed)
    }

    /// 根据第 `iteration` 次 (从1开始) 的结果推进状态，返回需要停顿的时长
    pub fn after<R: Rng + ?Sized>(
        &mut self,
        outcome: &ExecutionOutcome,
        iteration: u64,
        rng: &mut R,
    ) -> Option<Duration> {
        if outcome.is_fatal() {
            self.state = PacerState::Aborted;
            return None;
        }
        if iteration >= self.requested {
            self.state = PacerState::Completed;
            return None;
        }

        let (state, range) = match outcome {
            ExecutionOutcome::Success { .. } => (PacerState::PausedAfterSuccess, ACTIVITY_PAUSE_SECS),
            ExecutionOutcome::Skipped { .. } => (
                PacerState::PausedAfterSkip,
                match self.skip_pause {
                    SkipPause::Activity => ACTIVITY_PAUSE_SECS,
                    SkipPause::Error => ERROR_PAUSE_SECS,
                },
            ),
            ExecutionOutcome::Failed { .. } | ExecutionOutcome::FatalAbort { .. } => {
                (PacerState::PausedAfterError, ERROR_PAUSE_SECS)
            }
        };

        self.state = state;
        Some(Duration::from_secs(rng.gen_range(range)))
    }

    /// 停顿结束，进入下一次迭代
    pub fn resume(&mut self) {
        if !self.is_finished() {
            self.state = PacerState::Running;
        }
    }
}

/// 停顿的实现，测试中替换为记录器
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
