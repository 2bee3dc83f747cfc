use std::num::NonZeroU32;

use anyhow::{bail, Result};

use stockreaper_core::{catalog::StalenessPolicy, Extension};

pub async fn run(extension: &Extension, threshold_days: Option<u32>, dry_run: bool) -> Result<()> {
    let policy = match threshold_days {
        Some(days) => {
            let Some(days) = NonZeroU32::new(days) else {
                bail!("--threshold-days must be greater than 0");
            };
            StalenessPolicy::new(days)
        }
        None => extension.reaper().policy(),
    };
    let reaper = extension.reaper().with_policy(policy);
    let days = reaper.policy().threshold_days();

    if dry_run {
        let ids = reaper.preview().await?;
        if ids.is_empty() {
            println!("No out-of-stock products older than {} days.", days);
        } else {
            println!("{} out-of-stock products older than {} days would be deleted:", ids.len(), days);
            for id in ids {
                println!("  {}", id);
            }
        }
        return Ok(());
    }

    let result = reaper.reap().await?;

    if !result.failed.is_empty() {
        println!(
            "Could not delete {} products; they will be retried on the next run.",
            result.failed.len()
        );
    }
    println!(
        "Success: Out-of-stock products older than {} days deleted! ({} removed)",
        days,
        result.deleted_count()
    );

    Ok(())
}
