//! Drop commands.
//!
//! # Usage
//!
//! ```bash
//! blessed drops list
//! blessed drops toggle drop03 --active true
//! ```

use blessed_core::drop::partition_by_active;
use blessed_core::{Drop, DropId, DropUpdate};

use super::{CliError, backend_from_env};

/// One line of `drops list` output.
#[must_use]
pub fn list_line(drop: &Drop) -> String {
    format!(
        "{:<10} {:<4} {:<24} {:<26} {:>5} piezas",
        drop.id.as_str(),
        drop.number,
        drop.label,
        drop.release_date,
        drop.total_pieces,
    )
}

/// List drops, active first.
///
/// # Errors
///
/// Returns an error if the backend request fails.
#[allow(clippy::print_stdout)]
pub async fn list() -> Result<(), CliError> {
    let backend = backend_from_env()?;
    let drops = backend.list_drops().await?;
    let (active, inactive) = partition_by_active(&drops);

    println!("Activos ({})", active.len());
    for drop in active {
        println!("  {}", list_line(drop));
    }
    println!("Inactivos ({})", inactive.len());
    for drop in inactive {
        println!("  {}", list_line(drop));
    }
    Ok(())
}

/// Set a drop's active flag.
///
/// # Errors
///
/// Returns an error if the drop does not exist or the update fails.
pub async fn toggle(id: &str, active: bool) -> Result<(), CliError> {
    let backend = backend_from_env()?;
    let id = DropId::new(id);

    let drop = backend.get_drop(&id).await?;
    if drop.active == active {
        tracing::info!(drop_id = %id, active, "Drop already in requested state");
        return Ok(());
    }

    backend.update_drop(&id, &DropUpdate::active(active)).await?;
    tracing::info!(
        drop_id = %id,
        active,
        "\"{}\" {}",
        drop.label,
        if active { "activado" } else { "desactivado" }
    );
    Ok(())
}
