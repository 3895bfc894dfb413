//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Deciding which accounts still need fetching
//! - Driving each account through fetch, parse, archive, and ledger append
//! - Handling interrupts between accounts
//! - Exporting the ledger when the crawl ends

use crate::config::Config;
use crate::crawler::fetcher::MirrorClient;
use crate::crawler::parser::parse_profile;
use crate::export::export_cosense;
use crate::images::{ArchiveOutcome, ImageArchiver, ImageKind};
use crate::ledger::{source_now, JsonlLedger, Ledger, ProfileRecord};
use crate::source::load_following_archive;
use crate::state::AccountState;
use crate::ArchiverError;
use rand::Rng;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Operating mode for one run; exactly one is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Fetch only accounts without a ledger entry
    Normal,

    /// Same selection as `Normal`; reported as a continuation
    Resume,

    /// Fetch every account, ledgered or not
    Force,

    /// Fetch the first pending account and report its record
    Single,

    /// Only rebuild the export from the ledger
    ExportOnly,
}

impl RunMode {
    /// Returns true if accounts already in the ledger are skipped
    pub fn skips_ledgered(&self) -> bool {
        !matches!(self, Self::Force)
    }
}

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub total_accounts: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub fetch_failed: usize,
    pub parse_failed: usize,
    pub images_stored: usize,
    pub images_unchanged: usize,
    pub image_failures: usize,
    pub interrupted: bool,
    pub exported_pages: Option<usize>,
}

impl CrawlReport {
    /// Number of accounts that went through the fetch pipeline
    pub fn attempted(&self) -> usize {
        self.succeeded + self.fetch_failed + self.parse_failed
    }

    fn record(&mut self, state: AccountState) {
        match state {
            AccountState::Succeeded => self.succeeded += 1,
            AccountState::Skipped => self.skipped += 1,
            AccountState::FetchFailed => self.fetch_failed += 1,
            AccountState::ParseFailed => self.parse_failed += 1,
            _ => {}
        }
    }
}

/// Final state of one account, with its record on success
#[derive(Debug, Clone)]
pub struct AccountResult {
    pub account_id: String,
    pub state: AccountState,
    pub record: Option<ProfileRecord>,
}

/// What a run produced, by mode
#[derive(Debug)]
pub enum RunOutcome {
    /// Normal, resume, or force crawl
    Crawled(CrawlReport),

    /// Single mode; `None` when no account was pending
    Single(Option<AccountResult>),

    /// Export-only; number of pages written
    Exported(usize),
}

/// Main crawler coordinator structure
pub struct Coordinator<L: Ledger = JsonlLedger> {
    config: Config,
    ledger: L,
    mirrors: MirrorClient,
    archiver: ImageArchiver,
    interrupted: Arc<AtomicBool>,
}

impl Coordinator<JsonlLedger> {
    /// Creates a coordinator using the file locations from `config`
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(ArchiverError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, ArchiverError> {
        let ledger = JsonlLedger::new(&config.paths.ledger);
        let mirrors = MirrorClient::from_config(&config)?;
        let archiver = ImageArchiver::new(&config.paths.images);
        Ok(Self::with_parts(config, ledger, mirrors, archiver))
    }
}

impl<L: Ledger> Coordinator<L> {
    /// Creates a coordinator from already constructed components
    pub fn with_parts(
        config: Config,
        ledger: L,
        mirrors: MirrorClient,
        archiver: ImageArchiver,
    ) -> Self {
        Self {
            config,
            ledger,
            mirrors,
            archiver,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn archiver(&self) -> &ImageArchiver {
        &self.archiver
    }

    /// Flag that stops the crawl loop before the next account when set
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    /// Runs one mode end to end
    ///
    /// The account archive is only read for fetching modes. Crawl modes export
    /// the ledger when the loop ends, including after an interrupt.
    pub async fn run(&mut self, mode: RunMode) -> Result<RunOutcome, ArchiverError> {
        if mode == RunMode::ExportOnly {
            tracing::info!("[EXPORT] Cosense output only");
            return Ok(RunOutcome::Exported(self.export()?));
        }

        let accounts = load_following_archive(Path::new(&self.config.paths.source))?;
        tracing::info!("Loaded {} followed accounts", accounts.len());

        if mode == RunMode::Single {
            return Ok(RunOutcome::Single(self.single(&accounts).await?));
        }

        let mut report = self.crawl(mode, &accounts).await?;
        report.exported_pages = Some(self.export()?);
        Ok(RunOutcome::Crawled(report))
    }

    /// Accounts a crawl in `mode` will fetch, in source order
    pub fn pending_accounts(
        &self,
        mode: RunMode,
        accounts: &[String],
    ) -> Result<Vec<String>, ArchiverError> {
        let ledgered = self.ledger.load()?;
        Ok(select_pending(mode, accounts, &ledgered)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Runs the main crawl loop over `accounts`
    ///
    /// Per-account failures are counted and logged; only ledger I/O errors
    /// abort the loop.
    pub async fn crawl(
        &mut self,
        mode: RunMode,
        accounts: &[String],
    ) -> Result<CrawlReport, ArchiverError> {
        let ledgered = self.ledger.load()?;
        tracing::info!("Loaded {} previous entries", ledgered.len());

        let pending = select_pending(mode, accounts, &ledgered).len();
        match mode {
            RunMode::Force => tracing::info!("Force mode: fetching all {} accounts again", pending),
            RunMode::Resume => tracing::info!("Resume: {} remaining", pending),
            _ => tracing::info!("Full mode (only new accounts): {} to fetch", pending),
        }

        let mut report = CrawlReport {
            total_accounts: accounts.len(),
            ..CrawlReport::default()
        };
        let start_time = Instant::now();
        let mut fetched = 0usize;

        for account_id in accounts {
            if self.interrupted.load(Ordering::SeqCst) {
                tracing::warn!("[STOP] Interrupted safely; the next run resumes from here");
                report.interrupted = true;
                break;
            }

            if fetched > 0 && needs_fetch(mode, &ledgered, account_id) {
                self.pause_between_accounts().await;
            }

            let result = self
                .process_account(account_id, &ledgered, mode, &mut report)
                .await?;
            report.record(result.state);

            if result.state != AccountState::Skipped {
                fetched += 1;
                if fetched % 10 == 0 {
                    tracing::info!(
                        "Progress: {} fetched ({} ok, {} failed) in {:?}",
                        fetched,
                        report.succeeded,
                        report.fetch_failed + report.parse_failed,
                        start_time.elapsed()
                    );
                }
            }
        }

        tracing::info!(
            "Crawl finished: {} succeeded, {} skipped, {} fetch failures, {} parse failures, {} new images in {:?}",
            report.succeeded,
            report.skipped,
            report.fetch_failed,
            report.parse_failed,
            report.images_stored,
            start_time.elapsed()
        );

        Ok(report)
    }

    /// Processes the first account without a ledger entry
    pub async fn single(
        &mut self,
        accounts: &[String],
    ) -> Result<Option<AccountResult>, ArchiverError> {
        let ledgered = self.ledger.load()?;
        let first_pending = select_pending(RunMode::Single, accounts, &ledgered)
            .first()
            .copied();
        let account_id = match first_pending {
            Some(id) => id,
            None => {
                tracing::info!("No pending accounts; every account is already in the ledger");
                return Ok(None);
            }
        };

        let mut report = CrawlReport::default();
        let result = self
            .process_account(account_id, &ledgered, RunMode::Single, &mut report)
            .await?;
        Ok(Some(result))
    }

    /// Rebuilds the Cosense export from the ledger
    pub fn export(&self) -> Result<usize, ArchiverError> {
        export_cosense(
            &self.ledger,
            &self.config.export,
            Path::new(&self.config.paths.export),
        )
    }

    /// Drives one account through the pipeline
    ///
    /// ```text
    /// Pending -> Skipped
    /// Pending -> Fetching -> FetchFailed
    /// Pending -> Fetching -> Parsing -> ParseFailed
    /// Pending -> Fetching -> Parsing -> Archiving -> Succeeded
    /// ```
    ///
    /// The ledger entry is written last, so an account interrupted before
    /// that point stays pending.
    async fn process_account(
        &mut self,
        account_id: &str,
        ledgered: &HashSet<String>,
        mode: RunMode,
        report: &mut CrawlReport,
    ) -> Result<AccountResult, ArchiverError> {
        let mut state = AccountState::Pending;

        if !needs_fetch(mode, ledgered, account_id) {
            state = state.advance(AccountState::Skipped)?;
            tracing::debug!("{} already in ledger, skipping", account_id);
            return Ok(Self::finished(account_id, state, None));
        }

        state = state.advance(AccountState::Fetching)?;
        let page = match self.mirrors.fetch(account_id).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("✘ {} ({})", account_id, e);
                state = state.advance(AccountState::FetchFailed)?;
                return Ok(Self::finished(account_id, state, None));
            }
        };

        state = state.advance(AccountState::Parsing)?;
        let parsed = match parse_profile(&page.body, &page.host, account_id) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("✘ {} from {} ({})", account_id, page.host, e);
                state = state.advance(AccountState::ParseFailed)?;
                return Ok(Self::finished(account_id, state, None));
            }
        };

        state = state.advance(AccountState::Archiving)?;
        let record = parsed.into_record(account_id, &page.host, source_now());

        for (kind, source_url, mirror_url) in [
            (
                ImageKind::Profile,
                record.profile_image_url.as_deref(),
                record.profile_image_mirror_url.as_deref(),
            ),
            (
                ImageKind::Banner,
                record.banner_image_url.as_deref(),
                record.banner_image_mirror_url.as_deref(),
            ),
        ] {
            match self
                .archiver
                .archive(&self.mirrors, account_id, kind, source_url, mirror_url)
                .await
            {
                ArchiveOutcome::Stored(_) => report.images_stored += 1,
                ArchiveOutcome::Unchanged => report.images_unchanged += 1,
                ArchiveOutcome::NoUrl => {}
                ArchiveOutcome::Failed(e) => {
                    report.image_failures += 1;
                    tracing::warn!("[IMG ERROR] {} {}: {}", account_id, kind, e);
                }
            }
        }

        self.ledger.append(&record)?;
        state = state.advance(AccountState::Succeeded)?;
        tracing::info!(
            "✔ {} @{} (from {})",
            account_id,
            record.screen_name,
            record.fetched_from
        );

        Ok(Self::finished(account_id, state, Some(record)))
    }

    fn finished(
        account_id: &str,
        state: AccountState,
        record: Option<ProfileRecord>,
    ) -> AccountResult {
        AccountResult {
            account_id: account_id.to_string(),
            state,
            record,
        }
    }

    /// Sleeps a random interval between the configured pause bounds
    async fn pause_between_accounts(&self) {
        let min = self.config.crawler.pause_min_ms;
        let max = self.config.crawler.pause_max_ms.max(min);
        if max == 0 {
            return;
        }
        let ms = rand::rng().random_range(min..=max);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

fn needs_fetch(mode: RunMode, ledgered: &HashSet<String>, account_id: &str) -> bool {
    !(mode.skips_ledgered() && ledgered.contains(account_id))
}

/// Accounts `mode` will fetch, in source order
fn select_pending<'a>(
    mode: RunMode,
    accounts: &'a [String],
    ledgered: &HashSet<String>,
) -> Vec<&'a String> {
    accounts
        .iter()
        .filter(|id| needs_fetch(mode, ledgered, id))
        .collect()
}

/// Runs one mode with a coordinator built from `config`
///
/// Ctrl-C stops the crawl after the account in progress; the ledger is then
/// exported as usual and the next run resumes where this one stopped.
///
/// # Example
///
/// ```no_run
/// use followings_archiver::config::Config;
/// use followings_archiver::crawler::{run_crawl, RunMode};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// run_crawl(Config::default(), RunMode::Resume).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, mode: RunMode) -> Result<RunOutcome, ArchiverError> {
    let mut coordinator = Coordinator::new(config)?;

    let flag = coordinator.interrupt_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("[CTRL-C] Interrupt requested. Stopping after the current account...");
            flag.store(true, Ordering::SeqCst);
        }
    });

    coordinator.run(mode).await
}
