//! Cache-first, AI-fallback interaction resolution.
//!
//! Every item/object pairing goes through the same funnel: query the
//! SQLite rule cache, and on a miss ask the model and cache whatever
//! survives validation. Cache failures on the write side are logged and
//! swallowed; a resolve must never fail because the cache is sick.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use overseer_core::events::{EventHub, EventKind, GameplayEvent};
use overseer_core::ratelimit::{RateLimitConfig, RateLimiter};
use overseer_core::rules::{best_match, InteractionRule, RuleSource, RuleStore};
use overseer_core::vocab::{sorted_tag_names, MaterialTag, ObjectCondition};
use overseer_llm::sanitize::sanitize;
use overseer_llm::types::ResolveContext;
use overseer_llm::Director;

use crate::validate::{validate_resolve, ResolvedFields};

/// Resolution failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The caller exceeded the resolve budget; no AI call was made.
    #[error("resolve rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited {
        /// Whole seconds until the window resets.
        retry_after_secs: u64,
    },
}

/// One interaction to resolve.
#[derive(Debug, Clone)]
pub struct ResolveQuery {
    /// Stable item identifier, or `None` for bare hands.
    pub item_id: Option<String>,
    /// Stable object identifier.
    pub object_id: String,
    /// Item display name, or `None` for bare hands.
    pub item_name: Option<String>,
    /// Object display name.
    pub object_name: String,
    /// Item material tags.
    pub item_tags: Vec<MaterialTag>,
    /// Object material tags.
    pub object_tags: Vec<MaterialTag>,
    /// Object condition at query time, if any.
    pub object_state: Option<ObjectCondition>,
}

/// The resolved outcome handed back to the world layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionOutcome {
    /// New object condition, if it changes.
    pub result_state: Option<ObjectCondition>,
    /// Item produced, if any.
    pub output_item: Option<String>,
    /// Tags on the produced item.
    pub output_item_tags: Option<Vec<MaterialTag>>,
    /// Player-facing description.
    pub description: String,
    /// Whether the outcome came from the cache.
    pub cached: bool,
}

/// The interaction resolver.
pub struct InteractionResolver {
    rules: Mutex<RuleStore>,
    limiter: Mutex<RateLimiter>,
    limit: RateLimitConfig,
    director: Arc<dyn Director>,
    hub: Arc<EventHub>,
}

impl InteractionResolver {
    /// Create a resolver over an opened rule cache.
    pub fn new(
        rules: RuleStore,
        limit: RateLimitConfig,
        director: Arc<dyn Director>,
        hub: Arc<EventHub>,
    ) -> Self {
        Self {
            rules: Mutex::new(rules),
            limiter: Mutex::new(RateLimiter::new()),
            limit,
            director,
            hub,
        }
    }

    /// Resolve one interaction for `caller` (the rate-limit identity).
    ///
    /// Cache hits short-circuit before the rate limiter; only AI-bound
    /// misses consume budget.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::RateLimited`] when the caller is over
    /// budget on a cache miss.
    pub async fn resolve(
        &self,
        query: &ResolveQuery,
        caller: &str,
        now_ms: u64,
    ) -> Result<InteractionOutcome, ResolveError> {
        if let Some(hit) = self.cache_lookup(query) {
            self.record_event(query, &hit.description, true, now_ms);
            return Ok(hit);
        }

        let decision = self.limiter.lock().check(
            &format!("resolve:{caller}"),
            &self.limit,
            now_ms,
        );
        if !decision.allowed {
            return Err(ResolveError::RateLimited {
                retry_after_secs: decision.retry_after_secs(now_ms),
            });
        }

        // Only real model output is cached; a fallback outcome must not
        // shadow future attempts for this pair.
        let fields = match self.director.resolve_interaction(&self.context(query)).await {
            Ok(raw) => {
                let fields = validate_resolve(raw);
                self.cache_insert(query, &fields);
                fields
            }
            Err(error) => {
                warn!(%error, object = %query.object_name, "Resolve call failed, using fallback");
                ResolvedFields::fallback()
            }
        };

        self.record_event(query, &fields.description, false, now_ms);

        Ok(InteractionOutcome {
            result_state: fields.result_state,
            output_item: fields.output_item,
            output_item_tags: fields.output_item_tags,
            description: fields.description,
            cached: false,
        })
    }

    fn cache_lookup(&self, query: &ResolveQuery) -> Option<InteractionOutcome> {
        let rules = match self
            .rules
            .lock()
            .find_matching(query.item_id.as_deref(), &query.object_id)
        {
            Ok(rules) => rules,
            Err(error) => {
                // A broken cache read degrades to a miss.
                warn!(%error, object = %query.object_id, "Rule cache read failed");
                return None;
            }
        };

        let hit = best_match(&rules, query.object_state)?;
        debug!(
            object = %query.object_id,
            item = query.item_id.as_deref().unwrap_or("<hands>"),
            "Rule cache hit"
        );

        let output_item_tags = if hit.output_item.is_some() && !hit.output_item_tags.is_empty() {
            let tags: Vec<MaterialTag> = hit
                .output_item_tags
                .iter()
                .filter_map(|t| MaterialTag::from_name(t))
                .collect();
            (!tags.is_empty()).then_some(tags)
        } else {
            None
        };

        Some(InteractionOutcome {
            result_state: hit.result_state,
            output_item: hit.output_item.clone(),
            output_item_tags,
            description: hit.description.clone(),
            cached: true,
        })
    }

    fn cache_insert(&self, query: &ResolveQuery, fields: &ResolvedFields) {
        let rule = InteractionRule {
            item_id: query.item_id.clone(),
            object_id: query.object_id.clone(),
            required_state: query.object_state,
            item_tags: sorted_tag_names(&query.item_tags),
            object_tags: sorted_tag_names(&query.object_tags),
            result_state: fields.result_state,
            output_item: fields.output_item.clone(),
            output_item_tags: fields
                .output_item_tags
                .as_deref()
                .map(sorted_tag_names)
                .unwrap_or_default(),
            description: fields.description.clone(),
            source: RuleSource::Ai,
        };

        if let Err(error) = self.rules.lock().insert(&rule) {
            warn!(%error, object = %query.object_id, "Failed to cache resolved rule");
        }
    }

    fn context(&self, query: &ResolveQuery) -> ResolveContext {
        ResolveContext {
            item_name: query.item_name.as_deref().map(sanitize),
            object_name: sanitize(&query.object_name),
            item_tags: sorted_tag_names(&query.item_tags),
            object_tags: sorted_tag_names(&query.object_tags),
            object_state: query.object_state.map(|s| s.as_str().to_string()),
        }
    }

    fn record_event(&self, query: &ResolveQuery, description: &str, cached: bool, now_ms: u64) {
        let mut event = GameplayEvent::new(EventKind::Interaction, "player", now_ms)
            .with_detail("object", query.object_name.clone())
            .with_detail("outcome", description.to_string())
            .with_detail("cached", cached);
        if let Some(item) = &query.item_name {
            event = event.with_detail("item", item.clone());
        }
        self.hub.record(event);
    }
}

impl std::fmt::Debug for InteractionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionResolver")
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}
