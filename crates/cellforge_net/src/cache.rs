//! Process-wide rule cache with request coalescing.
//!
//! [`RuleCache`] maps exact rule names to decoded table/tree data. Entries
//! are created on first successful fetch and live for the process lifetime;
//! there is no eviction and no retry. Concurrent requests for the same name
//! share one in-flight fetch: later callers join a FIFO waiter list and are
//! resumed in registration order when the fetch resolves.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cellforge_rules::table::TableNeighborhood;
use cellforge_rules::tokens::TextTokenizer;
use cellforge_rules::{
    decode_table, decode_tree, CountSet, DecisionTree, LookupTable, Neighbourhood, RuleFamily,
    RulePredicate, RuleSpec,
};

use crate::fetch::RuleFetcher;
use crate::scan::scan_sections;

/// Decoded rule data held by a cache entry.
#[derive(Debug, Clone)]
pub enum RuleData {
    Table(LookupTable),
    Tree(DecisionTree),
}

/// One cached rule definition.
#[derive(Debug, Clone)]
pub struct RuleCacheEntry {
    pub rule_name: String,
    pub data: RuleData,
    /// `@COLORS` section text, verbatim, for downstream renderers.
    pub colours: Option<String>,
    /// `@ICONS` section text, verbatim.
    pub icons: Option<String>,
}

impl RuleCacheEntry {
    #[must_use]
    pub fn is_tree(&self) -> bool {
        matches!(self.data, RuleData::Tree(_))
    }

    /// Lifts the decoded definition into a [`RuleSpec`] so cached rules enter
    /// the engine through the same front door as grammar rules.
    ///
    /// The transition function stays in the decoded table/tree; the count
    /// predicates are empty because these families never consult them.
    #[must_use]
    pub fn rule_spec(&self) -> RuleSpec {
        let (family, neighbourhood, state_count) = match &self.data {
            RuleData::Table(table) => (
                RuleFamily::RuleTable,
                match table.neighborhood {
                    TableNeighborhood::VonNeumann => Neighbourhood::VonNeumann,
                    TableNeighborhood::Hexagonal => Neighbourhood::Hexagonal,
                    TableNeighborhood::Moore | TableNeighborhood::OneDimensional => {
                        Neighbourhood::Moore
                    }
                },
                u32::from(table.n_states),
            ),
            RuleData::Tree(tree) => (
                RuleFamily::RuleTree,
                if tree.n_neighbors == 4 {
                    Neighbourhood::VonNeumann
                } else {
                    Neighbourhood::Moore
                },
                u32::from(tree.n_states),
            ),
        };
        RuleSpec {
            family,
            neighbourhood,
            range: 1,
            state_count,
            birth: RulePredicate::Counts(CountSet::new(0)),
            survival: RulePredicate::Counts(CountSet::new(0)),
            middle_included: false,
            block_transitions: None,
            wolfram_code: None,
            canonical_name: self.rule_name.clone(),
            overlay: None,
            alternate: None,
            bounded_grid: None,
        }
    }
}

/// Success continuation: receives the cache entry.
pub type SuccessFn = Box<dyn FnOnce(Arc<RuleCacheEntry>) + Send>;
/// Failure continuation: receives the reason the rule is not executable.
pub type FailureFn = Box<dyn FnOnce(&str) + Send>;

struct Waiter {
    on_success: SuccessFn,
    on_failure: FailureFn,
}

pub struct RuleCache {
    fetcher: Arc<dyn RuleFetcher>,
    entries: Mutex<HashMap<String, Arc<RuleCacheEntry>>>,
    pending: Mutex<HashMap<String, Vec<Waiter>>>,
}

impl RuleCache {
    #[must_use]
    pub fn new(fetcher: Arc<dyn RuleFetcher>) -> Self {
        Self {
            fetcher,
            entries: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Synchronous exact-name lookup.
    #[must_use]
    pub fn resolve(&self, rule_name: &str) -> Option<Arc<RuleCacheEntry>> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(rule_name).cloned())
    }

    /// Requests a rule by name.
    ///
    /// A cache hit runs `on_success` immediately. A miss with a fetch already
    /// in flight appends the waiter and returns without fetching. Otherwise
    /// this call owns the fetch: it awaits the fetcher, decodes the first
    /// `@TABLE`/`@TREE` section, stores the entry, and resumes every waiter
    /// in registration order. On failure each waiter's failure continuation
    /// receives the reason instead; nothing is stored.
    pub async fn request(&self, rule_name: &str, on_success: SuccessFn, on_failure: FailureFn) {
        if let Some(entry) = self.resolve(rule_name) {
            on_success(entry);
            return;
        }

        let waiter = Waiter {
            on_success,
            on_failure,
        };
        match self.pending.lock() {
            Ok(mut pending) => {
                if let Some(waiters) = pending.get_mut(rule_name) {
                    waiters.push(waiter);
                    return;
                }
                pending.insert(rule_name.to_string(), vec![waiter]);
            }
            Err(_) => {
                (waiter.on_failure)("rule cache lock poisoned");
                return;
            }
        }

        let outcome = self.fetch_and_decode(rule_name).await;
        let waiters = self
            .pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.remove(rule_name))
            .unwrap_or_default();

        match outcome {
            Ok(entry) => {
                let entry = Arc::new(entry);
                if let Ok(mut entries) = self.entries.lock() {
                    entries.insert(rule_name.to_string(), Arc::clone(&entry));
                }
                tracing::info!(
                    rule = rule_name,
                    waiters = waiters.len(),
                    tree = entry.is_tree(),
                    "rule definition cached"
                );
                for waiter in waiters {
                    (waiter.on_success)(Arc::clone(&entry));
                }
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(rule = rule_name, reason = %reason, "rule fetch failed");
                for waiter in waiters {
                    (waiter.on_failure)(&reason);
                }
            }
        }
    }

    async fn fetch_and_decode(&self, rule_name: &str) -> anyhow::Result<RuleCacheEntry> {
        let text = self.fetcher.fetch(rule_name).await?;
        decode_definition(rule_name, &text)
    }
}

/// Decodes a rule definition carried inside pattern text.
///
/// Embedded definitions are decoded locally and never stored in the cache.
pub fn decode_embedded(text: &str) -> anyhow::Result<RuleCacheEntry> {
    let name = scan_sections(text)
        .and_then(|s| s.declared_name)
        .unwrap_or_default();
    decode_definition(&name, text)
}

fn decode_definition(rule_name: &str, text: &str) -> anyhow::Result<RuleCacheEntry> {
    let sections = scan_sections(text).ok_or_else(|| {
        anyhow::anyhow!("no @TABLE or @TREE section in definition of {rule_name}")
    })?;

    let data = if sections.is_tree {
        RuleData::Tree(decode_tree(&mut TextTokenizer::new(&sections.body))?)
    } else {
        RuleData::Table(decode_table(&mut TextTokenizer::new(&sections.body))?)
    };

    Ok(RuleCacheEntry {
        rule_name: rule_name.to_string(),
        data,
        colours: sections.colours,
        icons: sections.icons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use async_trait::async_trait;
    use tokio::sync::oneshot;

    const FOO_DEFINITION: &str = "@RULE Foo\n\
                                  @TABLE\n\
                                  n_states:2\n\
                                  neighborhood:vonNeumann\n\
                                  symmetries:none\n\
                                  0,1,0,0,0,1\n\
                                  @COLORS\n\
                                  1 255 0 0\n";

    /// Fetcher that blocks until the test releases it, counting calls.
    struct GatedFetcher {
        calls: AtomicUsize,
        gate: tokio::sync::Mutex<Option<oneshot::Receiver<anyhow::Result<String>>>>,
    }

    impl GatedFetcher {
        fn new(rx: oneshot::Receiver<anyhow::Result<String>>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                gate: tokio::sync::Mutex::new(Some(rx)),
            }
        }
    }

    #[async_trait]
    impl RuleFetcher for GatedFetcher {
        async fn fetch(&self, _rule_name: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rx = self
                .gate
                .lock()
                .await
                .take()
                .ok_or_else(|| anyhow::anyhow!("second fetch issued"))?;
            rx.await?
        }
    }

    #[tokio::test]
    async fn coalesces_concurrent_requests_into_one_fetch() {
        let (tx, rx) = oneshot::channel();
        let fetcher = Arc::new(GatedFetcher::new(rx));
        let cache = Arc::new(RuleCache::new(fetcher.clone()));
        let fired = Arc::new(AtomicUsize::new(0));

        let first = {
            let cache = Arc::clone(&cache);
            let fired = Arc::clone(&fired);
            tokio::spawn(async move {
                cache
                    .request(
                        "Foo",
                        Box::new(move |entry| {
                            assert!(!entry.is_tree());
                            fired.fetch_add(1, Ordering::SeqCst);
                        }),
                        Box::new(|reason| panic!("fetch failed: {reason}")),
                    )
                    .await;
            })
        };
        // Let the first request reach the gated fetch.
        tokio::task::yield_now().await;

        let fired_second = Arc::clone(&fired);
        cache
            .request(
                "Foo",
                Box::new(move |entry| {
                    assert_eq!(entry.rule_name, "Foo");
                    fired_second.fetch_add(1, Ordering::SeqCst);
                }),
                Box::new(|reason| panic!("fetch failed: {reason}")),
            )
            .await;
        // The second caller joined the waiter list without fetching.
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tx.send(Ok(FOO_DEFINITION.to_string())).ok();
        first.await.unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 2);
        let entry = cache.resolve("Foo").unwrap();
        assert_eq!(entry.colours.as_deref(), Some("1 255 0 0\n"));
    }

    #[tokio::test]
    async fn cache_hit_skips_the_fetcher() {
        let (tx, rx) = oneshot::channel();
        let fetcher = Arc::new(GatedFetcher::new(rx));
        let cache = RuleCache::new(fetcher.clone());

        tx.send(Ok(FOO_DEFINITION.to_string())).ok();
        cache
            .request("Foo", Box::new(|_| {}), Box::new(|r| panic!("{r}")))
            .await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        let fired = Arc::new(AtomicUsize::new(0));
        let fired_hit = Arc::clone(&fired);
        cache
            .request(
                "Foo",
                Box::new(move |_| {
                    fired_hit.fetch_add(1, Ordering::SeqCst);
                }),
                Box::new(|r| panic!("{r}")),
            )
            .await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_resumes_waiters_and_caches_nothing() {
        let (tx, rx) = oneshot::channel();
        let fetcher = Arc::new(GatedFetcher::new(rx));
        let cache = RuleCache::new(fetcher);

        tx.send(Err(anyhow::anyhow!("connection refused"))).ok();
        let failures = Arc::new(AtomicUsize::new(0));
        let failures_cb = Arc::clone(&failures);
        cache
            .request(
                "Missing",
                Box::new(|_| panic!("unexpected success")),
                Box::new(move |reason| {
                    assert!(reason.contains("connection refused"));
                    failures_cb.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        assert!(cache.resolve("Missing").is_none());
    }

    #[tokio::test]
    async fn undecodable_response_is_a_failure() {
        let (tx, rx) = oneshot::channel();
        let fetcher = Arc::new(GatedFetcher::new(rx));
        let cache = RuleCache::new(fetcher);

        tx.send(Ok("<html>404 not found</html>".to_string())).ok();
        let failed = Arc::new(AtomicUsize::new(0));
        let failed_cb = Arc::clone(&failed);
        cache
            .request(
                "Bogus",
                Box::new(|_| panic!("unexpected success")),
                Box::new(move |_| {
                    failed_cb.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .await;
        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn decode_embedded_never_touches_the_cache() {
        let entry = decode_embedded(FOO_DEFINITION).unwrap();
        assert_eq!(entry.rule_name, "Foo");
        assert!(!entry.is_tree());
        assert_eq!(entry.colours.as_deref(), Some("1 255 0 0\n"));
    }

    const BAR_TREE_DEFINITION: &str = "@RULE Bar\n\
                                       @TREE\n\
                                       num_states=2\n\
                                       num_neighbors=4\n\
                                       num_nodes=9\n\
                                       1 0 1\n\
                                       1 1 1\n\
                                       2 0 0\n\
                                       2 1 1\n\
                                       3 2 2\n\
                                       3 3 3\n\
                                       4 4 4\n\
                                       4 5 5\n\
                                       5 6 7\n";

    #[test]
    fn cached_table_lifts_into_a_rule_spec() {
        let entry = decode_embedded(FOO_DEFINITION).unwrap();
        let spec = entry.rule_spec();
        assert_eq!(spec.family, RuleFamily::RuleTable);
        assert_eq!(spec.neighbourhood, Neighbourhood::VonNeumann);
        assert_eq!(spec.state_count, 2);
        assert_eq!(spec.range, 1);
        assert_eq!(spec.canonical_name, "Foo");
    }

    #[test]
    fn cached_tree_lifts_into_a_rule_spec() {
        let entry = decode_embedded(BAR_TREE_DEFINITION).unwrap();
        assert!(entry.is_tree());
        let spec = entry.rule_spec();
        assert_eq!(spec.family, RuleFamily::RuleTree);
        assert_eq!(spec.neighbourhood, Neighbourhood::VonNeumann);
        assert_eq!(spec.state_count, 2);
        assert_eq!(spec.canonical_name, "Bar");
    }
}
