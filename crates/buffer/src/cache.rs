//! In-memory page cache sitting in front of the page manager (§4.6).
//! Tracks hit/miss/eviction counters and a bounded eviction log the way
//! the reference cache manager does, with three pluggable replacement
//! policies.

use common::EvictionPolicy;
use std::collections::HashMap;
use std::time::Instant;
use storage::{Page, PageManager};

use common::DbResult;

#[derive(Debug, Clone)]
struct CacheEntry {
    page: Page,
    access_time: Instant,
    access_count: u64,
    is_dirty: bool,
    score: f64,
    /// Monotonic insertion tick, used to break ties for FIFO eviction.
    inserted_at: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub total_requests: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_requests as f64
        }
    }

    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }
}

#[derive(Debug, Clone)]
pub struct EvictionLogEntry {
    pub page_id: u32,
    pub access_count: u64,
    pub score: f64,
    pub was_dirty: bool,
}

/// LRU/FIFO/LRFU page cache. Owns the `PageManager` so it can transparently
/// fault pages in on miss and flush dirty pages on eviction.
pub struct BufferCache {
    page_manager: PageManager,
    max_size: usize,
    policy: EvictionPolicy,
    decay: f64,
    entries: HashMap<u32, CacheEntry>,
    /// LRU/FIFO ordering, most-recently-used at the back. LRFU does not use
    /// this list; it scans `entries` for the minimum score instead.
    order: Vec<u32>,
    stats: CacheStats,
    eviction_log: Vec<EvictionLogEntry>,
    tick: u64,
}

const EVICTION_LOG_CAP: usize = 256;

impl BufferCache {
    pub fn new(page_manager: PageManager, max_size: usize, policy: EvictionPolicy, decay: f64) -> Self {
        assert!(max_size > 0, "buffer pool must hold at least one page");
        Self {
            page_manager,
            max_size,
            policy,
            decay,
            entries: HashMap::new(),
            order: Vec::new(),
            stats: CacheStats::default(),
            eviction_log: Vec::new(),
            tick: 0,
        }
    }

    pub fn page_manager_mut(&mut self) -> &mut PageManager {
        &mut self.page_manager
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn eviction_log(&self, limit: usize) -> &[EvictionLogEntry] {
        let start = self.eviction_log.len().saturating_sub(limit);
        &self.eviction_log[start..]
    }

    pub fn allocate_page(&mut self, page_type: storage::PageType, table_name: &str) -> DbResult<u32> {
        let id = self.page_manager.allocate(page_type, table_name)?;
        let page = self.page_manager.read(id)?;
        self.insert_entry(id, page, false)?;
        Ok(id)
    }

    pub fn get_page(&mut self, page_id: u32) -> DbResult<&Page> {
        self.stats.total_requests += 1;
        if self.entries.contains_key(&page_id) {
            self.stats.hits += 1;
            self.touch(page_id);
            tracing::trace!(page_id, hit = true, "buffer cache read");
        } else {
            self.stats.misses += 1;
            let page = self.page_manager.read(page_id)?;
            self.insert_entry(page_id, page, false)?;
            tracing::trace!(page_id, hit = false, "buffer cache read");
        }
        Ok(&self.entries[&page_id].page)
    }

    pub fn put_page(&mut self, page_id: u32, page: Page, is_dirty: bool) -> DbResult<()> {
        if let Some(entry) = self.entries.get_mut(&page_id) {
            entry.page = page;
            entry.is_dirty = is_dirty || entry.is_dirty;
            entry.access_time = Instant::now();
            entry.access_count += 1;
            if self.policy == EvictionPolicy::Lru {
                self.move_to_back(page_id);
            }
            Ok(())
        } else {
            self.insert_entry(page_id, page, is_dirty)
        }
    }

    pub fn mark_dirty(&mut self, page_id: u32) {
        if let Some(entry) = self.entries.get_mut(&page_id) {
            entry.is_dirty = true;
        }
    }

    pub fn flush_page(&mut self, page_id: u32) -> DbResult<()> {
        if let Some(entry) = self.entries.get_mut(&page_id) {
            if entry.is_dirty {
                self.page_manager.write(page_id, &entry.page)?;
                entry.is_dirty = false;
            }
        }
        Ok(())
    }

    pub fn flush_all(&mut self) -> DbResult<()> {
        let dirty: Vec<u32> = self
            .entries
            .iter()
            .filter(|(_, e)| e.is_dirty)
            .map(|(id, _)| *id)
            .collect();
        for id in dirty {
            self.flush_page(id)?;
        }
        self.page_manager.sync()
    }

    pub fn remove_page(&mut self, page_id: u32) -> DbResult<()> {
        if let Some(entry) = self.entries.remove(&page_id) {
            if entry.is_dirty {
                self.page_manager.write(page_id, &entry.page)?;
            }
            self.order.retain(|id| *id != page_id);
        }
        Ok(())
    }

    pub fn clear_cache(&mut self) -> DbResult<()> {
        self.flush_all()?;
        self.entries.clear();
        self.order.clear();
        Ok(())
    }

    fn insert_entry(&mut self, page_id: u32, page: Page, is_dirty: bool) -> DbResult<()> {
        if self.entries.len() >= self.max_size && !self.entries.contains_key(&page_id) {
            self.evict_one()?;
        }
        self.tick += 1;
        self.entries.insert(
            page_id,
            CacheEntry {
                page,
                access_time: Instant::now(),
                access_count: 1,
                is_dirty,
                score: 1.0,
                inserted_at: self.tick,
            },
        );
        self.order.push(page_id);
        Ok(())
    }

    fn touch(&mut self, page_id: u32) {
        let entry = self.entries.get_mut(&page_id).expect("entry must exist");
        entry.access_time = Instant::now();
        entry.access_count += 1;
        if self.policy == EvictionPolicy::Lrfu {
            entry.score = self.decay * entry.score + 1.0;
        }
        if self.policy == EvictionPolicy::Lru {
            self.move_to_back(page_id);
        }
    }

    fn move_to_back(&mut self, page_id: u32) {
        self.order.retain(|id| *id != page_id);
        self.order.push(page_id);
    }

    fn evict_one(&mut self) -> DbResult<()> {
        let victim = match self.policy {
            EvictionPolicy::Lru | EvictionPolicy::Fifo => self.order.first().copied(),
            EvictionPolicy::Lrfu => self
                .entries
                .iter()
                .min_by(|a, b| a.1.score.partial_cmp(&b.1.score).unwrap())
                .map(|(id, _)| *id),
        };
        let Some(victim) = victim else { return Ok(()) };
        let entry = self.entries.remove(&victim).expect("victim must be cached");
        self.order.retain(|id| *id != victim);

        if entry.is_dirty {
            self.page_manager.write(victim, &entry.page)?;
        }

        self.stats.evictions += 1;
        self.eviction_log.push(EvictionLogEntry {
            page_id: victim,
            access_count: entry.access_count,
            score: entry.score,
            was_dirty: entry.is_dirty,
        });
        if self.eviction_log.len() > EVICTION_LOG_CAP {
            let drop = self.eviction_log.len() - EVICTION_LOG_CAP;
            self.eviction_log.drain(0..drop);
        }
        tracing::debug!(page_id = victim, policy = ?self.policy, "evicted page from buffer cache");
        Ok(())
    }
}
