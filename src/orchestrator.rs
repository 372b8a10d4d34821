//! Reconciliation orchestrator.
//!
//! This module plays the caller's role around the engine: it persists
//! allocation state as JSON between runs, chooses create or update depending
//! on whether state exists, and turns engine errors into logged diagnostics.

use crate::error::{AllocationError, Diagnostic};
use crate::ip::{AllocationRequest, AllocationState, Reconciler};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::info;
use std::fs;
use std::path::Path;

/// Read a persisted allocation state
pub fn load_state(state_path: &Path) -> Result<AllocationState> {
    let content = fs::read_to_string(state_path)
        .wrap_err_with(|| format!("Failed to read allocation state '{}'", state_path.display()))?;
    let state = serde_json::from_str(&content)
        .wrap_err_with(|| format!("Failed to parse allocation state '{}'", state_path.display()))?;
    Ok(state)
}

/// Persist an allocation state, creating parent directories as needed
pub fn save_state(state_path: &Path, state: &AllocationState) -> Result<()> {
    if let Some(parent) = state_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create state directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(state)?;
    fs::write(state_path, json)
        .wrap_err_with(|| format!("Failed to write allocation state '{}'", state_path.display()))?;
    Ok(())
}

/// Create the allocation if `state_path` does not exist yet, otherwise update
/// it. The new state is written back only on success.
pub fn apply(
    reconciler: &Reconciler,
    request: &AllocationRequest,
    state_path: &Path,
) -> Result<AllocationState> {
    let result = if state_path.exists() {
        let prior = load_state(state_path)?;
        info!("Updating allocation {} from {:?}", prior.id, state_path);
        reconciler.update(request, &prior)
    } else {
        info!("No state at {:?}, creating a new allocation", state_path);
        reconciler.create(request)
    };

    let state = result.map_err(surface)?;
    save_state(state_path, &state)?;
    info!("Allocation state written to {:?}", state_path);
    Ok(state)
}

/// Read the persisted allocation
pub fn show(reconciler: &Reconciler, state_path: &Path) -> Result<AllocationState> {
    let state = load_state(state_path)?;
    Ok(reconciler.read(state))
}

/// Delete the allocation and its state file
pub fn destroy(reconciler: &Reconciler, state_path: &Path) -> Result<()> {
    let state = load_state(state_path)?;
    reconciler.delete(state);
    fs::remove_file(state_path)
        .wrap_err_with(|| format!("Failed to remove allocation state '{}'", state_path.display()))?;
    Ok(())
}

/// Register other persisted allocations with the reconciler's ledger so
/// `apply` will not reuse their addresses
pub fn adopt_peers<P: AsRef<Path>>(reconciler: &Reconciler, peer_paths: &[P]) -> Result<()> {
    for path in peer_paths {
        let peer = load_state(path.as_ref())?;
        let conflicts = reconciler.adopt(&peer);
        info!(
            "Adopted peer allocation {} ({} hosts, {} conflicts) from {:?}",
            peer.id,
            peer.len(),
            conflicts.len(),
            path.as_ref()
        );
    }
    if let Some(stats) = reconciler.ledger_stats() {
        for (pool, owned) in &stats {
            info!("Ledger holds {} addresses in pool '{}'", owned, pool);
        }
    }
    Ok(())
}

fn surface(error: AllocationError) -> color_eyre::Report {
    log::error!("{}", Diagnostic::from(&error));
    color_eyre::Report::new(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ip::AllocationLedger;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn reconciler() -> Reconciler {
        let config: Config = serde_yaml::from_str(
            r#"
pools:
  - name: "POOL1"
    prefix_length: 24
    gateway: "10.1.1.254"
    ranges:
      - from_ip: "10.1.1.1"
        to_ip: "10.1.1.3"
"#,
        )
        .unwrap();
        Reconciler::new(Arc::new(config.validate().unwrap()))
    }

    #[test]
    fn test_apply_creates_then_updates() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("nested").join("state.json");
        let reconciler = reconciler();

        let created = apply(
            &reconciler,
            &AllocationRequest::new("POOL1", ["host1", "host2"]),
            &state_path,
        )
        .unwrap();
        assert!(state_path.exists());
        assert_eq!(load_state(&state_path).unwrap(), created);

        let updated = apply(
            &reconciler,
            &AllocationRequest::new("POOL1", ["host2", "host3"]),
            &state_path,
        )
        .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.address_of("host2"), created.address_of("host2"));
        assert!(updated.address_of("host1").is_none());
        assert_eq!(
            updated.address_of("host3").unwrap().ip.to_string(),
            "10.1.1.1"
        );
    }

    #[test]
    fn test_failed_apply_keeps_prior_state_file() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state.json");
        let reconciler = reconciler();

        apply(&reconciler, &AllocationRequest::new("POOL1", ["a"]), &state_path).unwrap();
        let before = fs::read_to_string(&state_path).unwrap();

        let error = apply(
            &reconciler,
            &AllocationRequest::new("POOL1", ["a", "b", "c", "d"]),
            &state_path,
        )
        .unwrap_err();
        assert!(matches!(
            error.downcast_ref::<AllocationError>(),
            Some(AllocationError::InsufficientAddresses { .. })
        ));
        assert_eq!(fs::read_to_string(&state_path).unwrap(), before);
    }

    #[test]
    fn test_show_and_destroy() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state.json");
        let reconciler = reconciler();

        let created =
            apply(&reconciler, &AllocationRequest::new("POOL1", ["a"]), &state_path).unwrap();
        assert_eq!(show(&reconciler, &state_path).unwrap(), created);

        destroy(&reconciler, &state_path).unwrap();
        assert!(!state_path.exists());
        assert!(show(&reconciler, &state_path).is_err());
    }

    #[test]
    fn test_adopt_peers_excludes_their_addresses() {
        let dir = TempDir::new().unwrap();
        let peer_path = dir.path().join("peer.json");
        let own_path = dir.path().join("own.json");

        apply(&reconciler(), &AllocationRequest::new("POOL1", ["p1", "p2"]), &peer_path).unwrap();

        let guarded = reconciler().with_ledger(AllocationLedger::shared());
        adopt_peers(&guarded, &[&peer_path]).unwrap();

        let own = apply(&guarded, &AllocationRequest::new("POOL1", ["mine"]), &own_path).unwrap();
        assert_eq!(own.address_of("mine").unwrap().ip.to_string(), "10.1.1.3");
    }

    #[test]
    fn test_load_state_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let state_path = dir.path().join("state.json");
        fs::write(&state_path, "{ not json").unwrap();
        assert!(load_state(&state_path).is_err());
    }
}
