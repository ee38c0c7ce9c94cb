use crate::config::Config;
use crate::models::{
    is_path_safe, AvailabilityRecord, HostelDetails, HostelListing, Room, Session, SessionWindow,
};
use crate::scrapers::provider::{
    parse_availability, parse_catalog, parse_details, parse_rooms, parse_session,
};
use crate::scrapers::{Provider, Transport};
use crate::storage::{RawStore, ResultTable};
use anyhow::{bail, Context, Result};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Pipeline step at which a hostel was given up on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Listing,
    Detail,
    Session,
    Rooms,
    /// The hostel's task panicked or was cancelled
    Task,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Listing => "listing",
            Stage::Detail => "detail",
            Stage::Session => "session",
            Stage::Rooms => "rooms",
            Stage::Task => "task",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkipReason {
    pub stage: Stage,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostelOutcome {
    Completed {
        slug: String,
        hostel_name: String,
        rooms: usize,
        rooms_failed: usize,
        records: usize,
    },
    Skipped {
        slug: String,
        reason: SkipReason,
    },
}

impl HostelOutcome {
    fn skipped(slug: &str, stage: Stage, message: String) -> Self {
        warn!(slug, %stage, reason = %message, "Skipping hostel");
        HostelOutcome::Skipped {
            slug: slug.to_string(),
            reason: SkipReason { stage, message },
        }
    }

    #[cfg(test)]
    pub fn slug(&self) -> &str {
        match self {
            HostelOutcome::Completed { slug, .. } | HostelOutcome::Skipped { slug, .. } => slug,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub outcomes: Vec<HostelOutcome>,
    pub rows_written: usize,
}

impl RunSummary {
    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, HostelOutcome::Completed { .. }))
            .count()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &SkipReason)> {
        self.outcomes.iter().filter_map(|o| match o {
            HostelOutcome::Skipped { slug, reason } => Some((slug.as_str(), reason)),
            HostelOutcome::Completed { .. } => None,
        })
    }

    #[cfg(test)]
    pub fn outcome(&self, slug: &str) -> Option<&HostelOutcome> {
        self.outcomes.iter().find(|o| o.slug() == slug)
    }
}

/// Catalog -> detail -> session -> rooms -> availability, one task per hostel
pub struct Crawler<T> {
    provider: Provider<T>,
    raw: RawStore,
    table: ResultTable,
    output_path: PathBuf,
    max_workers: usize,
}

impl<T: Transport + 'static> Crawler<T> {
    pub fn new(provider: Provider<T>, raw: RawStore, config: &Config) -> Self {
        Self {
            provider,
            raw,
            table: ResultTable::new(),
            output_path: config.output_path.clone(),
            max_workers: config.max_workers.max(1),
        }
    }

    #[cfg(test)]
    pub fn table(&self) -> &ResultTable {
        &self.table
    }

    #[cfg(test)]
    pub fn provider(&self) -> &Provider<T> {
        &self.provider
    }

    /// Crawl every hostel and write the CSV. Only a catalog or CSV failure is
    /// an error; everything below the catalog is reported in the summary.
    pub async fn run(self: Arc<Self>) -> Result<RunSummary> {
        let records = self.list_hostels().await?;
        info!(
            run_id = self.raw.run_id(),
            hostels = records.len(),
            max_workers = self.max_workers,
            "Fetched hostel catalog"
        );

        let outcomes: Vec<HostelOutcome> = stream::iter(records)
            .map(|record| {
                let crawler = Arc::clone(&self);
                let label = HostelListing::label(&record);
                async move {
                    match tokio::spawn(async move { crawler.crawl_hostel(record).await }).await {
                        Ok(outcome) => outcome,
                        Err(e) => HostelOutcome::skipped(&label, Stage::Task, e.to_string()),
                    }
                }
            })
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        let writer = Arc::clone(&self);
        let rows_written =
            tokio::task::spawn_blocking(move || writer.table.write_csv(&writer.output_path))
                .await
                .context("CSV writer task failed")??;

        let summary = RunSummary {
            run_id: self.raw.run_id().to_string(),
            outcomes,
            rows_written,
        };
        info!(
            run_id = %summary.run_id,
            hostels = summary.outcomes.len(),
            completed = summary.completed(),
            skipped = summary.skipped().count(),
            rows = rows_written,
            output = %self.output_path.display(),
            "Run finished"
        );
        Ok(summary)
    }

    async fn list_hostels(&self) -> Result<Vec<Value>> {
        let body = self
            .provider
            .hostel_catalog()
            .await
            .context("Failed to fetch hostel catalog")?;
        self.raw.write(&self.raw.catalog_path(), &body).await?;
        Ok(parse_catalog(&body)?)
    }

    async fn crawl_hostel(&self, record: Value) -> HostelOutcome {
        let label = HostelListing::label(&record);
        let listing = match HostelListing::from_record(record) {
            Ok(listing) => listing,
            Err(message) => return HostelOutcome::skipped(&label, Stage::Listing, message),
        };
        let slug = listing.slug.as_str();
        debug!(slug, listing = %listing.record, "Crawling hostel");

        let details = match self.hostel_details(slug).await {
            Ok(details) => details,
            Err(e) => return HostelOutcome::skipped(slug, Stage::Detail, format!("{:#}", e)),
        };
        let session = match self.open_session(slug, &details.hostel_id).await {
            Ok(session) => session,
            Err(e) => return HostelOutcome::skipped(slug, Stage::Session, format!("{:#}", e)),
        };
        info!(slug, hostel = %details.hostel_name, session_id = %session.session_id, "Opened session");

        let rooms = match self.list_rooms(slug, &session).await {
            Ok(rooms) => rooms,
            Err(e) => return HostelOutcome::skipped(slug, Stage::Rooms, format!("{:#}", e)),
        };

        let mut records = 0;
        let mut rooms_failed = 0;
        for room in &rooms {
            match self.room_availability(slug, &details, &session, room).await {
                Ok(rows) => {
                    records += rows.len();
                    self.table.append(&details.hostel_name, rows);
                }
                Err(e) => {
                    rooms_failed += 1;
                    warn!(slug, room = %room.room_name, error = %format!("{:#}", e), "Skipping room availability");
                }
            }
        }

        info!(slug, hostel = %details.hostel_name, rooms = rooms.len(), rooms_failed, records, "Hostel done");
        HostelOutcome::Completed {
            slug: listing.slug.clone(),
            hostel_name: details.hostel_name,
            rooms: rooms.len(),
            rooms_failed,
            records,
        }
    }

    async fn hostel_details(&self, slug: &str) -> Result<HostelDetails> {
        let body = self
            .provider
            .hostel_details(slug)
            .await
            .context("Failed to fetch hostel details")?;
        self.raw.write(&self.raw.detail_path(slug), &body).await?;
        Ok(parse_details(&body)?)
    }

    async fn open_session(&self, slug: &str, hostel_id: &str) -> Result<Session> {
        let body = self
            .provider
            .open_session(hostel_id, SessionWindow::tonight())
            .await
            .context("Failed to open search session")?;
        self.raw.write(&self.raw.session_path(slug), &body).await?;
        Ok(parse_session(&body)?)
    }

    async fn list_rooms(&self, slug: &str, session: &Session) -> Result<Vec<Room>> {
        let body = self
            .provider
            .search_rooms(&session.session_id)
            .await
            .context("Failed to fetch room list")?;
        self.raw.write(&self.raw.rooms_path(slug), &body).await?;
        Ok(parse_rooms(&body)?)
    }

    /// All of one room's nights, or an error and nothing
    async fn room_availability(
        &self,
        slug: &str,
        details: &HostelDetails,
        session: &Session,
        room: &Room,
    ) -> Result<Vec<AvailabilityRecord>> {
        if !is_path_safe(&room.room_id) {
            bail!("room id {:?} cannot be used as a file name", room.room_id);
        }
        let body = self
            .provider
            .availability(&session.session_id, &room.room_id)
            .await
            .context("Failed to fetch availability")?;
        self.raw
            .write(&self.raw.availability_path(slug, &room.room_id), &body)
            .await?;
        let days = parse_availability(&body)?;
        Ok(days
            .into_iter()
            .map(|day| AvailabilityRecord::new(&details.hostel_name, &room.room_name, day))
            .collect())
    }
}
