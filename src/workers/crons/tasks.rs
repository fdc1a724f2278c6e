#[macro_export]
macro_rules! cron_tasks {
    ($ctx:expr, $($t:path),* $(,)?) => {
        $({
            const TASK_NAME: &str = const_str::convert_ascii_case!(upper_camel, stringify!($t));
            let started = std::time::Instant::now();
            tracing::info!("Starting task {TASK_NAME}");
            match ($t)($ctx).await {
                Ok(v) => tracing::info!(
                    "Completed task {TASK_NAME} in {:?} with result {v:?}",
                    started.elapsed()
                ),
                Err(e) => tracing::error!("Task {TASK_NAME} failed: {e:?}"),
            }
        })*
    };
}
