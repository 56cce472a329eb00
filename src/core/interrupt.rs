// Interrupt module - operator interrupt shared by the session loop and the reconnector

use tokio::sync::watch;
use tracing::debug;

/// Receiving side of the operator interrupt. Once fired it stays fired.
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

/// Sending side of the operator interrupt.
#[derive(Debug)]
pub struct InterruptTrigger {
    tx: watch::Sender<bool>,
}

impl Interrupt {
    pub fn channel() -> (InterruptTrigger, Interrupt) {
        let (tx, rx) = watch::channel(false);
        (InterruptTrigger { tx }, Interrupt { rx })
    }

    /// An interrupt that never fires.
    pub fn never() -> Self {
        Self::channel().1
    }

    /// Fire on SIGINT. Must be called from within a tokio runtime.
    pub fn ctrl_c() -> Self {
        let (trigger, interrupt) = Self::channel();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                debug!("Operator interrupt received");
                trigger.fire();
            }
        });
        interrupt
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the interrupt has fired. Pends forever if the trigger is
    /// gone without firing.
    pub async fn triggered(&mut self) {
        if self.rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

impl InterruptTrigger {
    pub fn fire(&self) {
        self.tx.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fire_wakes_waiter() {
        let (trigger, mut interrupt) = Interrupt::channel();
        assert!(!interrupt.is_triggered());
        trigger.fire();
        tokio::time::timeout(Duration::from_secs(1), interrupt.triggered())
            .await
            .expect("interrupt should resolve");
        assert!(interrupt.is_triggered());
    }

    #[tokio::test]
    async fn test_never_does_not_resolve() {
        let mut interrupt = Interrupt::never();
        let result = tokio::time::timeout(Duration::from_millis(50), interrupt.triggered()).await;
        assert!(result.is_err());
    }
}
