use anyhow::Result;
use chrono::Utc;

use stockreaper_core::Extension;

/// Activation hook
pub async fn activate(extension: &Extension) -> Result<()> {
    if extension.activate().await? {
        println!("Scheduled '{}' to run daily.", extension.job_name());
    } else {
        println!("'{}' is already scheduled.", extension.job_name());
    }
    Ok(())
}

/// Deactivation hook
pub async fn deactivate(extension: &Extension) -> Result<()> {
    if extension.deactivate().await? {
        println!("Unscheduled '{}'.", extension.job_name());
    } else {
        println!("'{}' was not scheduled.", extension.job_name());
    }
    Ok(())
}

pub async fn status(extension: &Extension) -> Result<()> {
    println!(
        "Threshold: {} days out of stock",
        extension.reaper().policy().threshold_days()
    );

    match extension.scheduled_job().await? {
        Some(job) => {
            println!("Job '{}' is scheduled every {} seconds.", job.name, job.interval_secs);
            match job.last_run_at {
                Some(last) => println!("  Last run: {}", last.format("%Y-%m-%d %H:%M")),
                None => println!("  Last run: never"),
            }
            let due = if job.is_due(Utc::now()) { " (due)" } else { "" };
            println!("  Next run: {}{}", job.next_run_at.format("%Y-%m-%d %H:%M"), due);
        }
        None => {
            println!("Job '{}' is not scheduled.", extension.job_name());
            println!("\nTo schedule it, run:");
            println!("  stockreaper activate");
        }
    }

    Ok(())
}
