//! Form controller: owns the [`FormState`] and runs one backend call per
//! user action.
//!
//! Edits lock the state only for the length of the edit, never across an
//! `.await`, so the table can still be changed while a request is pending.
//! The request itself was built from a snapshot when the action started.

use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

use crate::api::ExportApi;
use crate::downloader::{SaveBytes, SavedFile, file_name};
use crate::error::Result;
use crate::form::{ExportKind, ExportPayload, FormState, RatioRow, RowField, Ticker};

pub struct Controller<A, S> {
    api: A,
    saver: S,
    state: Mutex<FormState>,
}

/// Clears `loading` if an action is dropped before it reports back, so a
/// cancelled future or a panic cannot leave the form stuck in Loading.
struct LoadingGuard<'a> {
    state: &'a Mutex<FormState>,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn new(state: &'a Mutex<FormState>) -> Self {
        LoadingGuard { state, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            log::warn!("action abandoned before completion, clearing loading flag");
            lock(self.state).abandon();
        }
    }
}

fn lock(state: &Mutex<FormState>) -> MutexGuard<'_, FormState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<A: ExportApi, S: SaveBytes> Controller<A, S> {
    pub fn new(api: A, saver: S) -> Self {
        Self::with_state(api, saver, FormState::new())
    }

    pub fn with_state(api: A, saver: S, state: FormState) -> Self {
        Controller {
            api,
            saver,
            state: Mutex::new(state),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn saver(&self) -> &S {
        &self.saver
    }

    /// Copy of the current state, for rendering.
    pub fn snapshot(&self) -> FormState {
        lock(&self.state).clone()
    }

    pub fn add_row(&self) {
        lock(&self.state).add_row();
    }

    pub fn update_row(&self, index: usize, field: RowField, value: &str) -> Result<()> {
        Ok(lock(&self.state).update_row(index, field, value)?)
    }

    pub fn delete_row(&self, index: usize) -> Result<()> {
        lock(&self.state).delete_row(index)?;
        Ok(())
    }

    pub fn set_ticker(&self, input: &str) {
        lock(&self.state).set_ticker(input);
    }

    /// Request a CSV from the backend and save it.
    ///
    /// Validation and busy errors are returned without sending anything. Any
    /// other failure is also recorded in the form's error line. Loading is
    /// false again when this returns, whatever the outcome.
    pub async fn submit_export(&self, kind: ExportKind) -> Result<SavedFile> {
        let payload = lock(&self.state).begin_export(kind)?;

        let guard = LoadingGuard::new(&self.state);
        let outcome = self.run_export(kind, &payload).await;
        guard.disarm();

        if let Err(err) = &outcome {
            log::error!("{} failed: {err}", kind.endpoint());
        }
        lock(&self.state).finish_export(kind, &outcome);
        outcome
    }

    async fn run_export(&self, kind: ExportKind, payload: &ExportPayload) -> Result<SavedFile> {
        let bytes = self.api.export_csv(kind, payload).await?;
        let name = file_name(
            kind.file_prefix(),
            payload.ticker(),
            Utc::now().timestamp_millis(),
        );
        Ok(self.saver.save_bytes(&bytes, &name)?)
    }

    /// Fetch the debt-to-equity ratios for the current ticker.
    ///
    /// On success the returned rows replace the displayed ones; on failure the
    /// previous rows stay and the error line is set.
    pub async fn submit_query(&self) -> Result<Vec<RatioRow>> {
        let ticker = lock(&self.state).begin_query()?;

        let guard = LoadingGuard::new(&self.state);
        let outcome = self.run_query(&ticker).await;
        guard.disarm();

        if let Err(err) = &outcome {
            log::error!("debt-to-equity lookup for {ticker} failed: {err}");
        }
        lock(&self.state).finish_query(ticker, &outcome);
        outcome
    }

    async fn run_query(&self, ticker: &Ticker) -> Result<Vec<RatioRow>> {
        let rows = self.api.debt_to_equity(ticker).await?;
        log::debug!("{} ratio rows for {ticker}", rows.len());
        Ok(rows)
    }

    /// True when the backend answers its health check.
    pub async fn backend_ready(&self) -> bool {
        match self.api.health().await {
            Ok(health) => health.status == "healthy",
            Err(err) => {
                log::warn!("health check failed: {err}");
                false
            }
        }
    }
}
