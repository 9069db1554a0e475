//! SyncEngine implementation
//!
//! Runs the per-item lifecycle: load state, detect local drift, detect
//! remote drift, apply or flag, persist state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn};

use codesync_content::{DiffResult, diff, extract_function, replace_function};
use codesync_fs::NormalizedPath;
use codesync_git::RepositoryClient;

use super::drift::{
    Content, Drift, LocalSnapshot, RemoteSnapshot, detect_local, detect_remote, fetch_content,
    read_local, settle_unbaselined, tracked_fingerprint,
};
use super::report::{ItemFailure, SyncReport, SyncStatus};
use crate::config::{Config, TargetKind, TrackedItem};
use crate::state::{SyncState, SyncStateStore};
use crate::{Error, ErrorKind, Result};

/// Options for sync operations
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// If true, compute drift and diffs without writing targets or state.
    /// Notices will be prefixed with "[dry-run] Would ..."
    pub dry_run: bool,
}

/// How to settle an item whose sides diverged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Adopt the local content as the new baseline
    KeepLocal,
    /// Overwrite the local content with upstream
    TakeRemote,
}

/// Engine for keeping tracked items in sync with their upstream sources
///
/// - **sync**: detect drift on both sides and apply upstream-only changes
/// - **resolve**: settle a conflict in favor of one side
/// - **preview**: diff local content against upstream without side effects
pub struct SyncEngine {
    client: Arc<dyn RepositoryClient>,
    store: SyncStateStore,
    /// Directory relative target paths resolve against
    base_dir: NormalizedPath,
    notify_only: bool,
    cancel: CancellationToken,
}

impl SyncEngine {
    /// Create an engine for the items of `config`, reading upstream through
    /// `client`.
    pub fn new(config: &Config, client: Arc<dyn RepositoryClient>) -> Self {
        Self {
            client,
            store: SyncStateStore::new(config.state_dir_path()),
            base_dir: config.base_dir(),
            notify_only: config.notify_only,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight items once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn store(&self) -> &SyncStateStore {
        &self.store
    }

    /// Sync every enabled item of `config` in order.
    ///
    /// A failed item contributes its partial report and the batch moves on;
    /// only cancellation stops the batch.
    pub fn sync_all(&self, config: &Config, options: &SyncOptions) -> Vec<SyncReport> {
        let mut reports = Vec::new();
        for item in config.enabled_items() {
            match self.sync_item(item, options) {
                Ok(report) => reports.push(report),
                Err(failure) => {
                    let cancelled = failure.error.kind() == ErrorKind::Cancelled;
                    reports.push(failure.into_report());
                    if cancelled {
                        break;
                    }
                }
            }
        }
        reports
    }

    /// Run one item through the sync lifecycle.
    ///
    /// # Errors
    ///
    /// Returns an [`ItemFailure`] on conflict, on a failed apply, and on
    /// cancellation. Except for cancellation, state has been persisted by
    /// then.
    pub fn sync_item(
        &self,
        item: &TrackedItem,
        options: &SyncOptions,
    ) -> std::result::Result<SyncReport, ItemFailure> {
        let span = info_span!("sync_item", item = %item.name);
        let _guard = span.enter();

        let dry_run = options.dry_run || self.notify_only;
        let mut report = SyncReport::new(item.clone());
        let outcome = self.run(item, dry_run, &mut report);
        finish(outcome, report)
    }

    /// Settle `item` in favor of one side and clear its drift flags.
    pub fn resolve(
        &self,
        item: &TrackedItem,
        resolution: Resolution,
    ) -> std::result::Result<SyncReport, ItemFailure> {
        let span = info_span!("resolve_item", item = %item.name, ?resolution);
        let _guard = span.enter();

        let mut report = SyncReport::new(item.clone());
        let outcome = self.run_resolve(item, resolution, &mut report);
        finish(outcome, report)
    }

    /// Diffs between the local target and the upstream content it tracks,
    /// keyed by local path. State is neither read nor written.
    pub fn preview_item(&self, item: &TrackedItem) -> Result<BTreeMap<String, DiffResult>> {
        let target = item.target_path(&self.base_dir);
        let (_, remote) = fetch_content(self.client.as_ref(), item, upstream_reference(item))?;
        let local = read_local(item, &target)?;
        content_diffs(item, &target, local.as_ref(), &remote)
    }

    fn run(&self, item: &TrackedItem, dry_run: bool, report: &mut SyncReport) -> Result<()> {
        self.check_cancelled(item)?;
        let _lock = if dry_run {
            None
        } else {
            Some(self.store.lock(&item.name)?)
        };

        let mut state = self.load_state(item, report);
        let target = item.target_path(&self.base_dir);
        debug!(target = %target, last_commit = %state.last_commit_id, "Loaded state");

        let mut local = detect_local(item, &target, &state, report);
        self.check_cancelled(item)?;
        let mut remote = detect_remote(self.client.as_ref(), item, &state, report);
        self.check_cancelled(item)?;

        settle_unbaselined(item, &state, &mut local, &remote);
        report.commits = std::mem::take(&mut remote.commits);
        report.upstream_patch = remote.upstream_patch.take();

        let local_drift = local.drift;
        let remote_drift = remote.drift();
        if local_drift == Drift::Unknown {
            warn!("Local drift unknown");
        }
        if remote_drift == Drift::Unknown {
            warn!("Remote drift unknown");
        }

        // An unknown side keeps its previous flag
        if local_drift != Drift::Unknown {
            state.has_local_changes = local_drift.is_dirty();
        }
        if remote_drift != Drift::Unknown {
            state.has_remote_changes = remote_drift.is_dirty();
        }
        // A local edit keeps the last synced baseline so it stays flagged
        if local_drift == Drift::Clean
            && let Some(current) = &local.fingerprint
        {
            state.current_local_hash = current.as_str().to_string();
        }
        if let Some(current) = &remote.fingerprint {
            state.current_remote_hash = current.as_str().to_string();
        }

        let outcome = match (local_drift, remote_drift) {
            (Drift::Dirty, Drift::Dirty) => {
                warn!("Local and remote both changed; manual resolution required");
                report.status = SyncStatus::Conflict;
                if let Some(remote_content) = &remote.content {
                    match content_diffs(item, &target, local.content.as_ref(), remote_content) {
                        Ok(diffs) => report.diffs = diffs,
                        Err(e) => report.error(format!("Error computing diff: {e}")),
                    }
                }
                Err(Error::Conflict {
                    item: item.name.clone(),
                })
            }
            (Drift::Clean, Drift::Dirty) => {
                self.apply(item, &target, local, remote, dry_run, &mut state, report)
            }
            (Drift::Unknown, Drift::Dirty) => {
                report.status = SyncStatus::RemoteDirty;
                report.error("Upstream changed but local content could not be checked; not applied");
                Ok(())
            }
            (Drift::Dirty, _) => {
                report.status = SyncStatus::LocalDirty;
                Ok(())
            }
            _ => {
                report.status = SyncStatus::Clean;
                Ok(())
            }
        };

        if let Err(e) = &outcome
            && e.kind() == ErrorKind::Cancelled
        {
            return outcome;
        }

        if !dry_run {
            self.persist(item, &mut state, report);
        }
        report.state = state;
        outcome
    }

    #[allow(clippy::too_many_arguments)]
    fn apply(
        &self,
        item: &TrackedItem,
        target: &NormalizedPath,
        local: LocalSnapshot,
        remote: RemoteSnapshot,
        dry_run: bool,
        state: &mut SyncState,
        report: &mut SyncReport,
    ) -> Result<()> {
        let Some(remote_content) = remote.content else {
            report.status = SyncStatus::RemoteDirty;
            report.error("Upstream content unavailable; not applied");
            return Ok(());
        };

        let remote_text = match remote_content {
            Content::Text(text) => text,
            tree @ Content::Tree(_) => {
                report.diffs = content_diffs(item, target, local.content.as_ref(), &tree)?;
                let differing = report.diffs.len();
                report.notice(format!(
                    "Directory sync is not supported; {differing} file(s) differ upstream and were not applied"
                ));
                report.status = SyncStatus::RemoteDirty;
                return Ok(());
            }
        };

        let local_text = match &local.content {
            Some(Content::Text(text)) => Some(text.as_str()),
            _ => None,
        };
        let updated = updated_text(item, local_text, &remote_text)?;
        let key = target.to_string();
        report
            .diffs
            .insert(key.clone(), diff(local_text.unwrap_or_default(), &updated));

        if dry_run {
            report.notice(format!("[dry-run] Would update {target}"));
            report.status = SyncStatus::RemoteDirty;
            return Ok(());
        }

        self.check_cancelled(item)?;
        codesync_fs::io::write_text(target, &updated)?;
        report.updated_files.push(key);

        state.current_local_hash = tracked_fingerprint(item, &Content::Text(updated))?.into_string();
        if let Some(commit_id) = remote.commit_id {
            state.last_commit_id = commit_id;
        }
        state.has_local_changes = false;
        state.has_remote_changes = false;
        report.status = SyncStatus::Applied;
        info!(target = %target, commit = %state.last_commit_id, "Applied upstream changes");
        Ok(())
    }

    fn run_resolve(
        &self,
        item: &TrackedItem,
        resolution: Resolution,
        report: &mut SyncReport,
    ) -> Result<()> {
        self.check_cancelled(item)?;
        let _lock = self.store.lock(&item.name)?;

        let mut state = self.load_state(item, report);
        let target = item.target_path(&self.base_dir);
        let (commit_id, remote_content) =
            fetch_content(self.client.as_ref(), item, upstream_reference(item))?;
        let local_content = read_local(item, &target)?;
        self.check_cancelled(item)?;

        let mut settled = true;
        match (resolution, &remote_content) {
            (Resolution::KeepLocal, _) => {
                state.current_local_hash = match &local_content {
                    Some(content) => tracked_fingerprint(item, content)?.into_string(),
                    None => String::new(),
                };
                report.status = SyncStatus::Clean;
                info!(commit = %commit_id, "Kept local content; upstream marked as seen");
            }
            (Resolution::TakeRemote, Content::Tree(_)) => {
                report.diffs = content_diffs(item, &target, local_content.as_ref(), &remote_content)?;
                report.notice("Directory sync is not supported; upstream content was not applied");
                report.status = SyncStatus::RemoteDirty;
                settled = false;
            }
            (Resolution::TakeRemote, Content::Text(remote_text)) => {
                let local_text = match &local_content {
                    Some(Content::Text(text)) => Some(text.as_str()),
                    _ => None,
                };
                let updated = updated_text(item, local_text, remote_text)?;
                report
                    .diffs
                    .insert(target.to_string(), diff(local_text.unwrap_or_default(), &updated));

                self.check_cancelled(item)?;
                codesync_fs::io::write_text(&target, &updated)?;
                report.updated_files.push(target.to_string());
                state.current_local_hash =
                    tracked_fingerprint(item, &Content::Text(updated))?.into_string();
                report.status = SyncStatus::Applied;
                info!(target = %target, commit = %commit_id, "Took upstream content");
            }
        }

        if settled {
            state.last_commit_id = commit_id;
            state.has_local_changes = false;
            state.has_remote_changes = false;
        }
        state.current_remote_hash = remote_content.fingerprint().into_string();

        self.persist(item, &mut state, report);
        report.state = state;
        Ok(())
    }

    /// Prior state, or the zero state when none can be used.
    fn load_state(&self, item: &TrackedItem, report: &mut SyncReport) -> SyncState {
        match self.store.load(&item.name) {
            Ok(state) => state,
            Err(Error::StateNotFound { .. }) => {
                debug!("No prior state; starting from zero");
                SyncState::default()
            }
            Err(e) => {
                report.error(format!("Error loading sync state: {e}"));
                SyncState::default()
            }
        }
    }

    /// Stamp and save `state`. A failed save is reported, not raised.
    ///
    /// Cancellation is not consulted here: once a target has been written
    /// its state must follow.
    fn persist(&self, item: &TrackedItem, state: &mut SyncState, report: &mut SyncReport) {
        state.last_sync = Some(Utc::now());
        if let Err(e) = self.store.save(&item.name, state) {
            report.error(format!("Error saving sync state: {e}"));
        }
    }

    fn check_cancelled(&self, item: &TrackedItem) -> Result<()> {
        if self.cancel.is_cancelled() {
            debug!("Cancellation requested");
            return Err(Error::Cancelled {
                item: item.name.clone(),
            });
        }
        Ok(())
    }
}

/// Attach the failure to its report.
fn finish(outcome: Result<()>, mut report: SyncReport) -> std::result::Result<SyncReport, ItemFailure> {
    match outcome {
        Ok(()) => Ok(report),
        Err(error) => {
            report.error(error.to_string());
            Err(ItemFailure { error, report })
        }
    }
}

/// The pinned revision when set, otherwise the tracked branch.
fn upstream_reference(item: &TrackedItem) -> &str {
    item.source
        .pinned_revision()
        .unwrap_or(item.source.branch.as_str())
}

/// Local text after taking upstream: the whole upstream file, or the local
/// file with the upstream function spliced in. A missing local file takes
/// the bare function.
fn updated_text(item: &TrackedItem, local: Option<&str>, remote: &str) -> Result<String> {
    if item.kind() != TargetKind::Function {
        return Ok(remote.to_string());
    }
    let (language, name) = item.function()?;
    let function = extract_function(language, remote, name)?;
    match local {
        Some(local) => Ok(replace_function(language, local, name, &function)?),
        None => Ok(function),
    }
}

/// Non-empty diffs from local to upstream content, keyed by local path.
fn content_diffs(
    item: &TrackedItem,
    target: &NormalizedPath,
    local: Option<&Content>,
    remote: &Content,
) -> Result<BTreeMap<String, DiffResult>> {
    let mut diffs = BTreeMap::new();
    match remote {
        Content::Text(remote) => {
            let local = match local {
                Some(Content::Text(text)) => Some(text.as_str()),
                _ => None,
            };
            let updated = updated_text(item, local, remote)?;
            let result = diff(local.unwrap_or_default(), &updated);
            if !result.is_empty() {
                diffs.insert(target.to_string(), result);
            }
        }
        Content::Tree(remote_files) => {
            let empty = BTreeMap::new();
            let local_files = match local {
                Some(Content::Tree(files)) => files,
                _ => &empty,
            };
            let paths: BTreeSet<&String> = local_files.keys().chain(remote_files.keys()).collect();
            for path in paths {
                let before = local_files.get(path).map(String::as_str).unwrap_or_default();
                let after = remote_files.get(path).map(String::as_str).unwrap_or_default();
                let result = diff(before, after);
                if !result.is_empty() {
                    diffs.insert(target.join(path).to_string(), result);
                }
            }
        }
    }
    Ok(diffs)
}
