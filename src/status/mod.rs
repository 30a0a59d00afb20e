//! Status facade
//!
//! [`OtServ`] answers status questions about one game server. Each call to
//! [`OtServ::get`] runs one query cycle:
//!
//! ```text
//! CheckingCache -> Fresh -------------------------------> Ready
//!       |            | (unreadable cache)
//!       v            v
//!    Fetching <------+
//!       | reply      | empty reply: rewrite cached record -> Ready
//!       v            | unreachable / timeout -> Degraded
//!    Parsing -> store in cache -------------------------> Ready
//!       | malformed
//!       v
//!    Degraded (serve whatever the cache holds, else nothing)
//! ```
//!
//! No failure escapes a cycle; the worst outcome is an empty record whose
//! accessors all return `None`.

pub mod attributes;
pub mod record;

use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::cache::CacheStore;
use crate::config::StatusConfig;
use crate::error::{CacheError, NetworkError, StatusError};
use crate::net::client::StatusClient;
use crate::net::Target;
use crate::protocol::parse_status;

pub use attributes::Attributes;
pub use record::{AttributeGroup, AttributeMap, FieldValue, StatusRecord};

/// Consecutive unreachable fetches after which failures are logged as errors
const REPEATED_FAILURE_THRESHOLD: u32 = 3;

/// State of a query cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryState {
    /// Asking the cache whether the snapshot is fresh
    CheckingCache,
    /// Loading a fresh snapshot
    Fresh,
    /// Querying the game server
    Fetching,
    /// Parsing the server's reply
    Parsing,
    /// Finished without a new snapshot
    Degraded,
    /// Finished with a usable snapshot
    Ready,
}

impl QueryState {
    /// Whether the cycle ends in this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryState::Degraded | QueryState::Ready)
    }

    pub fn name(&self) -> &'static str {
        match self {
            QueryState::CheckingCache => "CheckingCache",
            QueryState::Fresh => "Fresh",
            QueryState::Fetching => "Fetching",
            QueryState::Parsing => "Parsing",
            QueryState::Degraded => "Degraded",
            QueryState::Ready => "Ready",
        }
    }
}

/// Where the record of a finished cycle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    /// The cached snapshot (fresh, or rewritten after an empty reply)
    Cache,
    /// A reply fetched during this cycle
    Live,
    /// An expired snapshot served because the fetch failed
    StaleCache,
    /// Nothing usable was available
    Empty,
}

/// Result of one query cycle
#[derive(Debug)]
pub struct QueryOutcome {
    /// Terminal state (`Ready` or `Degraded`)
    pub state: QueryState,
    pub source: RecordSource,
    pub record: StatusRecord,
    /// The failure that led to `Degraded`, if any
    pub error: Option<StatusError>,
}

impl QueryOutcome {
    pub fn is_degraded(&self) -> bool {
        self.state == QueryState::Degraded
    }
}

impl Attributes for QueryOutcome {
    fn record(&self) -> &StatusRecord {
        &self.record
    }
}

/// Cached status view of one game server
#[derive(Debug)]
pub struct OtServ {
    target: Target,
    cache: CacheStore,
    client: StatusClient,
    /// Record of the last finished cycle
    record: StatusRecord,
    /// Unreachable fetches since the last successful one
    connect_failures: u32,
}

impl OtServ {
    /// Create a facade for `host`, on `port` or the configured default port
    pub fn new(host: impl Into<String>, port: Option<u16>, config: &StatusConfig) -> Self {
        let target = Target::with_port(host, port.unwrap_or(config.default_port));
        Self::with_parts(
            target,
            CacheStore::from_config(config),
            StatusClient::from_config(config),
        )
    }

    /// Create a facade from explicit components
    pub fn with_parts(target: Target, cache: CacheStore, client: StatusClient) -> Self {
        Self {
            target,
            cache,
            client,
            record: StatusRecord::new(),
            connect_failures: 0,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Unreachable fetches since the last successful one
    pub fn connect_failures(&self) -> u32 {
        self.connect_failures
    }

    /// Run one query cycle and make its record current
    pub async fn get(&mut self) -> QueryOutcome {
        let outcome = self.run_cycle().await;
        debug!(
            server = %self.target,
            state = outcome.state.name(),
            source = ?outcome.source,
            "Status query finished"
        );
        self.record = outcome.record.clone();
        outcome
    }

    async fn run_cycle(&mut self) -> QueryOutcome {
        let mut state = QueryState::CheckingCache;
        let mut reply = Bytes::new();
        let mut ready: Option<(RecordSource, StatusRecord)> = None;
        let mut failure: Option<StatusError> = None;

        loop {
            debug!(server = %self.target, state = state.name(), "Status query step");

            state = match state {
                QueryState::CheckingCache => {
                    if self.cache.is_fresh(&self.target).await {
                        QueryState::Fresh
                    } else {
                        QueryState::Fetching
                    }
                }

                QueryState::Fresh => match self.cache.read(&self.target).await {
                    Ok(record) => {
                        ready = Some((RecordSource::Cache, record));
                        QueryState::Ready
                    }
                    Err(e) => {
                        warn!(server = %self.target, error = %e, "Cached status unreadable, refetching");
                        QueryState::Fetching
                    }
                },

                QueryState::Fetching => match self.client.fetch(&self.target).await {
                    Ok(bytes) => {
                        self.connect_failures = 0;
                        reply = bytes;
                        QueryState::Parsing
                    }
                    Err(NetworkError::EmptyResponse) => {
                        self.connect_failures = 0;
                        ready = Some(self.reuse_cached().await);
                        QueryState::Ready
                    }
                    Err(e) => {
                        self.record_fetch_failure(&e);
                        failure = Some(e.into());
                        QueryState::Degraded
                    }
                },

                QueryState::Parsing => match parse_status(&reply) {
                    Ok(record) => {
                        if let Err(e) = self.cache.write(&self.target, &record).await {
                            warn!(server = %self.target, error = %e, "Failed to cache status");
                        }
                        info!(server = %self.target, "Status refreshed");
                        ready = Some((RecordSource::Live, record));
                        QueryState::Ready
                    }
                    Err(e) => {
                        warn!(server = %self.target, error = %e, "Discarding malformed status reply");
                        failure = Some(e.into());
                        QueryState::Degraded
                    }
                },

                QueryState::Degraded => {
                    let (source, record) = match self.cache.read(&self.target).await {
                        Ok(record) => (RecordSource::StaleCache, record),
                        Err(_) => (RecordSource::Empty, StatusRecord::new()),
                    };
                    return QueryOutcome {
                        state: QueryState::Degraded,
                        source,
                        record,
                        error: failure,
                    };
                }

                QueryState::Ready => {
                    let (source, record) =
                        ready.unwrap_or((RecordSource::Empty, StatusRecord::new()));
                    return QueryOutcome {
                        state: QueryState::Ready,
                        source,
                        record,
                        error: None,
                    };
                }
            };
        }
    }

    /// Handle a connected-but-empty reply: rewrite whatever is cached so its
    /// age restarts, without ever replacing it by an empty record
    async fn reuse_cached(&self) -> (RecordSource, StatusRecord) {
        match self.cache.touch(&self.target).await {
            Ok(record) => {
                debug!(server = %self.target, "Empty status reply, kept cached status");
                (RecordSource::Cache, record)
            }
            Err(StatusError::Cache(CacheError::NotFound(_))) => {
                debug!(server = %self.target, "Empty status reply and nothing cached");
                (RecordSource::Empty, StatusRecord::new())
            }
            Err(e) => {
                warn!(server = %self.target, error = %e, "Empty status reply and cached status unusable");
                (RecordSource::Empty, StatusRecord::new())
            }
        }
    }

    fn record_fetch_failure(&mut self, err: &NetworkError) {
        if !err.is_unreachable() {
            warn!(server = %self.target, error = %err, "Status fetch failed");
            return;
        }

        self.connect_failures = self.connect_failures.saturating_add(1);
        if self.connect_failures >= REPEATED_FAILURE_THRESHOLD {
            error!(
                server = %self.target,
                failures = self.connect_failures,
                error = %err,
                "Status server repeatedly unreachable"
            );
        } else {
            warn!(
                server = %self.target,
                failures = self.connect_failures,
                error = %err,
                "Status server unreachable"
            );
        }
    }
}

impl Attributes for OtServ {
    fn record(&self) -> &StatusRecord {
        &self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(QueryState::Ready.is_terminal());
        assert!(QueryState::Degraded.is_terminal());
        assert!(!QueryState::CheckingCache.is_terminal());
        assert!(!QueryState::Fresh.is_terminal());
        assert!(!QueryState::Fetching.is_terminal());
        assert!(!QueryState::Parsing.is_terminal());
    }

    #[test]
    fn test_new_uses_default_port() {
        let config = StatusConfig::default();
        let server = OtServ::new("example.test", None, &config);
        assert_eq!(server.target(), &Target::with_port("example.test", 7171));

        let server = OtServ::new("example.test", Some(7172), &config);
        assert_eq!(server.target().port(), 7172);
    }

    #[test]
    fn test_accessors_before_first_cycle() {
        let server = OtServ::new("example.test", None, &StatusConfig::default());
        assert_eq!(server.servername(), None);
        assert_eq!(server.players_online(), None);
        assert_eq!(server.motd(), None);
        assert_eq!(server.connect_failures(), 0);
    }
}
