//! Reconnect supervision.
//!
//! The event connection does not re-establish itself. [`Supervisor`] re-opens
//! a [`Bot`] after its stream ends, backing off between failed opens, until
//! shut down.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use emi_core::ReconnectPolicy;

use crate::bot::Bot;
use crate::config::StreamConfig;
use crate::error::RuntimeResult;

/// Keeps a bot connected.
#[derive(Debug)]
pub struct Supervisor {
    bot: Bot,
    policy: ReconnectPolicy,
    auto_reconnect: bool,
    shutdown: CancellationToken,
}

impl Supervisor {
    /// Creates a supervisor that reconnects with `policy`.
    pub fn new(bot: Bot, policy: ReconnectPolicy) -> Self {
        Self {
            bot,
            policy,
            auto_reconnect: true,
            shutdown: CancellationToken::new(),
        }
    }

    /// Creates a supervisor from the `stream` configuration section.
    pub fn from_config(bot: Bot, config: &StreamConfig) -> Self {
        let mut supervisor = Self::new(bot, config.reconnect.to_policy());
        supervisor.auto_reconnect = config.auto_reconnect;
        supervisor
    }

    /// Stops after the first session ends instead of reconnecting.
    pub fn without_reconnect(mut self) -> Self {
        self.auto_reconnect = false;
        self
    }

    /// Uses `token` to stop the supervisor.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Returns the token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Returns the supervised bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    /// Runs until shut down, reconnecting as configured.
    ///
    /// Returns the last open error once `max_attempts` consecutive opens
    /// have failed.
    pub async fn run(&self) -> RuntimeResult<()> {
        let mut delay = self.policy.initial_delay;
        let mut failures = 0u32;

        while !self.shutdown.is_cancelled() {
            let opened = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                opened = self.bot.open() => opened,
            };

            match opened {
                Ok(()) => {
                    failures = 0;
                    delay = self.policy.initial_delay;
                    info!("Event stream connected");

                    tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => break,
                        _ = self.bot.wait() => warn!("Event stream ended"),
                    }

                    if !self.auto_reconnect {
                        return Ok(());
                    }
                    if !self.sleep(delay).await {
                        break;
                    }
                }
                Err(e) => {
                    failures += 1;
                    if let Some(max) = self.policy.max_attempts
                        && failures >= max
                    {
                        error!(error = %e, attempts = failures, "Giving up on event stream");
                        return Err(e);
                    }

                    warn!(
                        error = %e,
                        attempt = failures,
                        delay = ?delay,
                        "Failed to open event stream, retrying"
                    );
                    if !self.sleep(delay).await {
                        break;
                    }
                    delay = self.policy.next_delay(delay);
                }
            }
        }

        info!("Supervisor shutting down");
        self.bot.close().await?;
        self.bot.wait().await;
        Ok(())
    }

    /// Sleeps for `delay`; false if shut down meanwhile.
    async fn sleep(&self, delay: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::time::timeout;

    use emi_core::TransportError;

    use super::*;
    use crate::bot::tests::{TestSource, offline_client, test_bot, test_bot_with};
    use crate::error::RuntimeError;

    fn fast_policy(max_attempts: Option<u32>) -> ReconnectPolicy {
        ReconnectPolicy {
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
            multiplier: 2.0,
            max_attempts,
        }
    }

    async fn until(cond: impl Fn() -> bool) {
        timeout(Duration::from_secs(5), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
        .await
        .unwrap();
    }

    fn failing_bot(failures: usize) -> (Bot, Arc<TestSource>) {
        let source = Arc::new(TestSource::failing(failures));
        (test_bot_with(Arc::clone(&source), offline_client()), source)
    }

    #[tokio::test]
    async fn test_reconnects_after_stream_ends() {
        let (bot, source) = test_bot();
        let supervisor = Arc::new(Supervisor::new(bot, fast_policy(None)));
        let task = tokio::spawn({
            let supervisor = Arc::clone(&supervisor);
            async move { supervisor.run().await }
        });

        until(|| source.opens() == 1).await;
        source.disconnect();
        until(|| source.opens() == 2).await;

        supervisor.shutdown_token().cancel();
        timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (bot, source) = failing_bot(10);
        let supervisor = Supervisor::new(bot, fast_policy(Some(3)));

        let err = timeout(Duration::from_secs(5), supervisor.run())
            .await
            .unwrap()
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Transport(TransportError::ConnectionFailed { .. })
        ));
        assert_eq!(source.opens(), 3);
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let (bot, source) = failing_bot(2);
        let supervisor = Arc::new(Supervisor::new(bot, fast_policy(Some(3))));
        let task = tokio::spawn({
            let supervisor = Arc::clone(&supervisor);
            async move { supervisor.run().await }
        });

        until(|| source.opens() == 3).await;
        // Connected now; a later drop starts a fresh failure count.
        source.disconnect();
        until(|| source.opens() == 4).await;

        supervisor.shutdown_token().cancel();
        timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_without_reconnect_returns_when_stream_ends() {
        let (bot, source) = test_bot();
        let supervisor = Supervisor::new(bot, fast_policy(None)).without_reconnect();

        let run = supervisor.run();
        let disconnect = async {
            until(|| source.opens() == 1).await;
            source.disconnect();
        };
        let (result, ()) = timeout(Duration::from_secs(5), async { tokio::join!(run, disconnect) })
            .await
            .unwrap();

        result.unwrap();
        assert_eq!(source.opens(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_hanging_open() {
        let source = Arc::new(TestSource::hanging());
        let bot = test_bot_with(Arc::clone(&source), offline_client());
        let supervisor = Arc::new(Supervisor::new(bot, fast_policy(None)));
        let task = tokio::spawn({
            let supervisor = Arc::clone(&supervisor);
            async move { supervisor.run().await }
        });

        until(|| source.opens() == 1).await;
        supervisor.shutdown_token().cancel();
        timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(source.opens(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_before_run() {
        let (bot, source) = test_bot();
        let token = CancellationToken::new();
        token.cancel();

        let supervisor = Supervisor::new(bot, fast_policy(None)).with_shutdown(token);
        timeout(Duration::from_secs(5), supervisor.run())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(source.opens(), 0);
    }
}
