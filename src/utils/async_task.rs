use std::future::Future;

use tokio::task::JoinHandle;
use tracing::error;

use crate::Result;

/// Spawns a long running task and logs how it ended.
///
/// The task's own result is still handed to whoever joins the handle.
pub(crate) fn spawn_task<Fut>(
    name: &str,
    task: Fut,
) -> JoinHandle<Result<()>>
where
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let name = name.to_string();
    tokio::spawn(async move {
        let res = task.await;
        if let Err(e) = &res {
            error!("spawned task: {name} stopped or encountered an error: {:?}", e);
        }
        res
    })
}
