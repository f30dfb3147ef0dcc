pub mod inbox_sweeper;
pub mod notification_dispatch;
pub mod token_cleanup;

pub use inbox_sweeper::InboxSweeperWorker;
pub use notification_dispatch::NotificationDispatchWorker;
pub use token_cleanup::TokenCleanupWorker;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// The background tasks spawned alongside the HTTP listeners.
#[derive(Debug)]
pub struct Workers {
    pub inbox_sweeper: InboxSweeperWorker,
    pub token_cleanup: TokenCleanupWorker,
    pub notification_dispatch: Option<NotificationDispatchWorker>,
}

impl Workers {
    pub fn spawn_all(self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let mut tasks = Vec::new();

        tasks.push(tokio::spawn(
            self.inbox_sweeper.run(shutdown.clone()).instrument(tracing::info_span!("inbox_sweeper")),
        ));
        tasks.push(tokio::spawn(
            self.token_cleanup.run(shutdown.clone()).instrument(tracing::info_span!("token_cleanup")),
        ));

        if let Some(dispatch) = self.notification_dispatch {
            tasks.push(tokio::spawn(
                dispatch.run(shutdown).instrument(tracing::info_span!("notification_dispatch")),
            ));
        } else {
            tracing::info!("No webhook URL configured; notification dispatch worker disabled");
        }

        tasks
    }
}
