use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use chrono_tz::Tz;

use crate::bank::{BankApi, SpareBank1Client};
use crate::clock::{Clock, SystemClock};
use crate::config::{BankCredentials, Config, ConfigError, FetchFrom, LedgerCredentials};
use crate::ledger::{Ledger, YnabClient};
use crate::models::{BankTransaction, RawBankTransaction};
use crate::reconcile::reconcile;
use crate::token_store::{SyncState, TokenStore};

use super::{import_statement, ImportReport, SyncReport};

/// Fetch start used when the ledger account has no entries yet.
pub fn earliest_fetch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Run-wide settings that are not credentials.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub time_zone: Tz,
    pub fetch_from: FetchFrom,
    pub lookback_days: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            time_zone: chrono_tz::Europe::Oslo,
            fetch_from: FetchFrom::default(),
            lookback_days: 5,
        }
    }
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            time_zone: config.time_zone()?,
            fetch_from: config.fetch_from,
            lookback_days: config.ledger.lookback_days,
        })
    }
}

/// Which accounts the run reads from and writes to.
#[derive(Debug, Clone)]
pub struct SyncAccounts {
    pub bank_account_key: String,
    pub ledger_account_id: String,
    /// Target of statement uploads.
    pub csv_account_id: String,
}

impl SyncAccounts {
    pub fn from_credentials(bank: &BankCredentials, ledger: &LedgerCredentials) -> Self {
        Self {
            bank_account_key: bank.account_key.clone(),
            ledger_account_id: ledger.account_id.clone(),
            csv_account_id: ledger.csv_account_id.clone(),
        }
    }
}

/// Drives a sync run end to end: token rotation, bank fetch, reconciliation
/// against the ledger, ledger writes and the sync-state update.
pub struct SyncService {
    bank: Arc<dyn BankApi>,
    ledger: Arc<dyn Ledger>,
    token_store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    accounts: SyncAccounts,
    settings: SyncSettings,
}

impl SyncService {
    pub fn new(
        bank: Arc<dyn BankApi>,
        ledger: Arc<dyn Ledger>,
        token_store: Arc<dyn TokenStore>,
        accounts: SyncAccounts,
    ) -> Self {
        Self {
            bank,
            ledger,
            token_store,
            clock: Arc::new(SystemClock),
            accounts,
            settings: SyncSettings::default(),
        }
    }

    /// Wire up the live bank and ledger clients.
    pub fn from_config(
        config: &Config,
        bank: &BankCredentials,
        ledger: &LedgerCredentials,
        token_store: Arc<dyn TokenStore>,
    ) -> Result<Self> {
        let settings = SyncSettings::from_config(config)?;
        Ok(Self::new(
            Arc::new(SpareBank1Client::from_config(&config.bank, bank)),
            Arc::new(YnabClient::from_config(&config.ledger, ledger)),
            token_store,
            SyncAccounts::from_credentials(bank, ledger),
        )
        .with_settings(settings))
    }

    pub fn with_settings(mut self, settings: SyncSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn today(&self) -> NaiveDate {
        self.clock.today_in(self.settings.time_zone)
    }

    async fn fetch_from(&self, state: &SyncState<'_>, today: NaiveDate) -> Result<NaiveDate> {
        match self.settings.fetch_from {
            FetchFrom::LastSyncDate => Ok(state.last_sync_date().await?.unwrap_or(today)),
            FetchFrom::LatestLedgerDate => Ok(self
                .ledger
                .latest_transaction_date(&self.accounts.ledger_account_id)
                .await
                .context("Failed to look up latest ledger transaction date")?
                .unwrap_or_else(earliest_fetch_date)),
        }
    }

    fn validate(&self, raw: Vec<RawBankTransaction>) -> (Vec<BankTransaction>, usize) {
        let mut valid = Vec::with_capacity(raw.len());
        let mut invalid = 0;
        for tx in raw {
            match BankTransaction::from_raw(tx, self.settings.time_zone) {
                Ok(tx) => valid.push(tx),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping invalid bank transaction");
                    invalid += 1;
                }
            }
        }
        (valid, invalid)
    }

    /// Run one sync.
    ///
    /// The rotated refresh token is stored as soon as it is issued. The last
    /// sync date only moves once every ledger write has gone through, and not
    /// at all when the bank had nothing to report.
    pub async fn run(&self) -> Result<SyncReport> {
        let state = SyncState::new(self.token_store.as_ref());
        let today = self.today();

        let refresh_token = state
            .refresh_token()
            .await?
            .context("No refresh token found; seed one with `banksync set-refresh-token`")?;

        tracing::info!("Refreshing bank access token");
        let grant = self.bank.refresh(&refresh_token).await?;
        state.set_refresh_token(&grant.refresh_token).await?;
        tracing::info!("Refresh token saved");

        let from = self.fetch_from(&state, today).await?;
        tracing::info!(from_date = %from, "Fetching bank transactions");
        let raw = self
            .bank
            .fetch_transactions(&grant.access_token, &self.accounts.bank_account_key, from)
            .await?;

        let mut report = SyncReport {
            from_date: Some(from),
            fetched: raw.len(),
            ..SyncReport::default()
        };
        if raw.is_empty() {
            tracing::info!("No new transactions");
            return Ok(report);
        }

        let (bank_transactions, invalid) = self.validate(raw);
        report.invalid = invalid;

        let since = today
            .checked_sub_days(Days::new(u64::from(self.settings.lookback_days)))
            .with_context(|| {
                format!(
                    "Lookback of {} days reaches before the earliest supported date",
                    self.settings.lookback_days
                )
            })?;
        let recent = self
            .ledger
            .transactions(&self.accounts.ledger_account_id, Some(since))
            .await
            .context("Failed to fetch recent ledger transactions")?;
        tracing::debug!(
            bank = bank_transactions.len(),
            ledger = recent.len(),
            since = %since,
            "Reconciling"
        );

        let plan = reconcile(&bank_transactions, &recent, &self.accounts.ledger_account_id);
        for ambiguous in &plan.ambiguous {
            tracing::warn!(
                bank_id = %ambiguous.bank_id,
                chosen = %ambiguous.chosen,
                candidates = ?ambiguous.candidates,
                "Bank transaction matches several ledger entries; using the first"
            );
        }
        report.skipped = plan.skipped.len();
        report.ambiguous = plan.ambiguous.len();

        if !plan.to_clear.is_empty() {
            tracing::info!(count = plan.to_clear.len(), "Clearing existing ledger transactions");
            self.ledger
                .update_transactions(&plan.to_clear)
                .await
                .context("Failed to clear ledger transactions")?;
            report.cleared = plan.to_clear.len();
        }

        if !plan.to_add.is_empty() {
            tracing::info!(count = plan.to_add.len(), "Sending new transactions to the ledger");
            let outcome = self
                .ledger
                .create_transactions(&plan.to_add)
                .await
                .context("Failed to create ledger transactions")?;
            if !outcome.duplicate_import_ids.is_empty() {
                tracing::info!(
                    duplicates = ?outcome.duplicate_import_ids,
                    "Ledger already had some of these transactions"
                );
            }
            report.added = outcome.created.len();
            report.duplicate_import_ids = outcome.duplicate_import_ids;
        }

        state.set_last_sync_date(today).await?;
        report.last_sync_date = Some(today);
        tracing::info!(%report, "Sync complete");
        Ok(report)
    }

    /// Import a card statement into the CSV target account.
    pub async fn import_csv(&self, content: &str) -> Result<ImportReport> {
        import_statement(self.ledger.as_ref(), &self.accounts.csv_account_id, content).await
    }
}
