use crate::state::AppState;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Hourly sweep deleting notifications whose `expires_at` has passed. Expiry
/// is enforced only here, read paths keep returning expired rows until the
/// sweep removes them.
pub async fn start_cleanup_service(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async("0 0 * * * *", move |_uuid, _l| {
        let state = state.clone();

        Box::pin(async move {
            match state.notification_repository.delete_expired().await {
                Ok(0) => tracing::debug!("Expiry sweep found nothing to remove"),
                Ok(count) => info!("Expiry sweep removed {} notifications", count),
                Err(e) => error!("Error sweeping expired notifications: {:?}", e),
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Notification cleanup service started");
    Ok(())
}
