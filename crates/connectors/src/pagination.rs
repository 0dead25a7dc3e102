//! Paginated fetchers
//!
//! Two cursor strategies over [`TicketingClient`]:
//!
//! - **offset pages** for groups and companies: walk `page=1..n` until a
//!   short page
//! - **time window** for tickets: walk pages of `updated_since`, sliding
//!   the window forward whenever the server's page limit is reached
//!
//! Every walk starts from page 1 and is sequential. A failed page aborts
//! the whole fetch; nothing partial is returned.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use deskpulse_protocol::{CompanyRecord, GroupRecord, TicketPriority, TicketRecord};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::client::TicketingClient;
use crate::error::{ConnectorError, Result};

/// Records per page
pub const PAGE_SIZE: usize = 100;

/// Highest page the server serves for one query
pub const MAX_PAGES: u32 = 300;

/// Walk an offset-paginated list endpoint until a short page
///
/// A list that still has full pages at [`MAX_PAGES`] cannot be read in
/// full and fails with `Pagination` rather than returning a truncated list.
pub async fn fetch_all_pages<T: DeserializeOwned>(
    client: &TicketingClient,
    endpoint: &str,
    page_delay: Duration,
) -> Result<Vec<T>> {
    let mut items = Vec::new();

    for page in 1..=MAX_PAGES {
        if page > 1 && !page_delay.is_zero() {
            tokio::time::sleep(page_delay).await;
        }

        let url = format!("{}?per_page={}&page={}", endpoint, PAGE_SIZE, page);
        let batch: Vec<T> = parse_page(client.execute(&url).await?, &url)?;
        let len = batch.len();
        items.extend(batch);

        if len < PAGE_SIZE {
            debug!(endpoint, pages = page, count = items.len(), "pagination complete");
            return Ok(items);
        }
    }

    warn!(endpoint, pages = MAX_PAGES, count = items.len(), "page limit reached");
    Err(ConnectorError::Pagination(format!(
        "{} has more than {} records",
        endpoint,
        MAX_PAGES as usize * PAGE_SIZE
    )))
}

/// All agent groups
pub async fn fetch_groups(client: &TicketingClient) -> Result<Vec<GroupRecord>> {
    fetch_all_pages(client, "groups", Duration::ZERO).await
}

/// All customer companies
pub async fn fetch_companies(client: &TicketingClient) -> Result<Vec<CompanyRecord>> {
    fetch_all_pages(client, "companies", Duration::ZERO).await
}

/// Every ticket updated at or after `since`, oldest update first
///
/// Tickets seen more than once (a window slide re-reads the boundary
/// timestamp) are de-duplicated by id: the latest version wins and the
/// first-seen position is kept.
pub async fn fetch_tickets_updated_since(
    client: &TicketingClient,
    since: DateTime<Utc>,
    page_delay: Duration,
) -> Result<Vec<TicketRecord>> {
    let mut collector = TicketCollector::default();
    let mut window_start = since;
    let mut windows = 0u32;

    loop {
        windows += 1;
        let mut newest = window_start;
        let mut reached_end = false;

        for page in 1..=MAX_PAGES {
            if (page > 1 || windows > 1) && !page_delay.is_zero() {
                tokio::time::sleep(page_delay).await;
            }

            let url = tickets_endpoint(window_start, page);
            let batch: Vec<TicketRecord> = parse_page(client.execute(&url).await?, &url)?;
            let len = batch.len();

            for ticket in batch {
                newest = newest.max(ticket.updated_at);
                collector.insert(ticket);
            }

            if len < PAGE_SIZE {
                reached_end = true;
                break;
            }
        }

        if reached_end {
            break;
        }

        if newest <= window_start {
            return Err(ConnectorError::Pagination(format!(
                "more than {} tickets share updated_at {}",
                MAX_PAGES as usize * PAGE_SIZE,
                window_start.to_rfc3339()
            )));
        }

        info!(
            connector = "freshdesk",
            from = %window_start,
            to = %newest,
            fetched = collector.len(),
            "page limit reached, sliding ticket window"
        );
        window_start = newest;
    }

    debug!(
        connector = "freshdesk",
        since = %since,
        windows,
        count = collector.len(),
        "ticket fetch complete"
    );
    Ok(collector.into_tickets())
}

/// Urgent tickets created on or after `created_on` (day granularity)
pub async fn search_urgent_tickets(
    client: &TicketingClient,
    created_on: NaiveDate,
) -> Result<Vec<TicketRecord>> {
    let query = format!(
        "\"priority:{} AND created_at:>'{}'\"",
        TicketPriority::Urgent.code(),
        created_on.format("%Y-%m-%d")
    );
    let url = format!("search/tickets?query={}", urlencoding::encode(&query));

    let response = client.execute(&url).await?;
    let results = match response {
        Value::Object(mut map) => map.remove("results").unwrap_or(Value::Array(Vec::new())),
        other => {
            return Err(ConnectorError::Pagination(format!(
                "search response for {} is not an object: {}",
                url, other
            )));
        }
    };
    parse_page(results, &url)
}

fn tickets_endpoint(updated_since: DateTime<Utc>, page: u32) -> String {
    let since = updated_since.to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        "tickets?updated_since={}&order_by=updated_at&order_type=asc&per_page={}&page={}",
        urlencoding::encode(&since),
        PAGE_SIZE,
        page
    )
}

fn parse_page<T: DeserializeOwned>(value: Value, url: &str) -> Result<Vec<T>> {
    if !value.is_array() {
        return Err(ConnectorError::Pagination(format!(
            "expected a JSON array from {}",
            url
        )));
    }
    Ok(serde_json::from_value(value)?)
}

/// Ordered, id-unique ticket accumulator
#[derive(Default)]
struct TicketCollector {
    tickets: Vec<TicketRecord>,
    index: HashMap<u64, usize>,
}

impl TicketCollector {
    fn insert(&mut self, ticket: TicketRecord) {
        match self.index.get(&ticket.id) {
            Some(&pos) => {
                if ticket.updated_at >= self.tickets[pos].updated_at {
                    self.tickets[pos] = ticket;
                }
            }
            None => {
                self.index.insert(ticket.id, self.tickets.len());
                self.tickets.push(ticket);
            }
        }
    }

    fn len(&self) -> usize {
        self.tickets.len()
    }

    fn into_tickets(self) -> Vec<TicketRecord> {
        self.tickets
    }
}
