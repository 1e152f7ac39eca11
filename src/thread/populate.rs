use std::collections::{HashMap, HashSet};

use log::warn;
use mongodb::bson::oid::ObjectId;

use crate::community::model::CommunitySummary;
use crate::database::DocumentStore;
use crate::thread::model::{Thread, ThreadView};
use crate::user::model::AuthorSummary;
use crate::utils::error::CustomError;

/// How far to resolve references below the given threads.
#[derive(Debug, Clone, Copy)]
pub struct Populate {
    /// Levels of `children` to resolve. 0 leaves replies as a count only.
    pub reply_depth: usize,
    /// Resolve `community` on the top-level threads.
    pub community: bool,
}

impl Populate {
    pub const AUTHOR_ONLY: Populate = Populate {
        reply_depth: 0,
        community: false,
    };
}

fn dedup(ids: impl Iterator<Item = ObjectId>) -> Vec<ObjectId> {
    let mut seen = HashSet::new();
    ids.filter(|id| seen.insert(*id)).collect()
}

/// Resolve authors, communities and replies into [`ThreadView`]s.
///
/// Output order follows `threads`; populated children follow each parent's
/// `children` order. References to documents that no longer exist become
/// `None` (author, community) or are dropped (children).
pub async fn populate_threads(
    store: &dyn DocumentStore,
    threads: Vec<Thread>,
    options: Populate,
) -> Result<Vec<ThreadView>, CustomError> {
    let mut levels = vec![threads];
    for _ in 0..options.reply_depth {
        let child_ids = dedup(
            levels[levels.len() - 1]
                .iter()
                .flat_map(|t| t.children.iter().copied()),
        );
        if child_ids.is_empty() {
            break;
        }
        levels.push(store.find_threads_by_ids(&child_ids).await?);
    }

    let author_ids = dedup(levels.iter().flatten().map(|t| t.author));
    let authors: HashMap<ObjectId, AuthorSummary> = store
        .find_users_by_ids(&author_ids)
        .await?
        .iter()
        .map(|u| (u.id, AuthorSummary::from(u)))
        .collect();

    let communities: HashMap<ObjectId, CommunitySummary> = if options.community {
        let ids = dedup(levels[0].iter().filter_map(|t| t.community));
        store
            .find_communities_by_ids(&ids)
            .await?
            .iter()
            .map(|c| (c.id, CommunitySummary::from(c)))
            .collect()
    } else {
        HashMap::new()
    };

    // Build from the deepest level up so each parent can pick its children.
    let mut below: HashMap<ObjectId, ThreadView> = HashMap::new();
    for (depth, level) in levels.iter().enumerate().rev() {
        let mut current = HashMap::with_capacity(level.len());
        for thread in level {
            let author = authors.get(&thread.author).cloned();
            if author.is_none() {
                warn!("Thread {} references missing author {}", thread.id, thread.author);
            }

            let community = match (depth, thread.community) {
                (0, Some(id)) => communities.get(&id).cloned(),
                _ => None,
            };

            let children = thread
                .children
                .iter()
                .filter_map(|id| below.get(id).cloned())
                .collect();

            current.insert(
                thread.id,
                ThreadView {
                    id: thread.id.to_hex(),
                    text: thread.text.clone(),
                    author,
                    community,
                    parent_id: thread.parent_id.map(|id| id.to_hex()),
                    children,
                    reply_count: thread.children.len(),
                    created_at: thread.created_at,
                },
            );
        }
        below = current;
    }

    Ok(levels[0]
        .iter()
        .filter_map(|t| below.get(&t.id).cloned())
        .collect())
}
