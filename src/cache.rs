//! Windowed texture cache: slot table + cursor + prefetch/evict policy.
//!
//! Flow per navigation step:
//!   1. `CacheEngine::navigate(dir)` → move cursor ±1 (wraps) → blocking load
//!      of the new current slot unless prefetch already made it resident
//!   2. `CacheEngine::maintain()` once per frame → prefetch the next slot,
//!      then release every resident slot outside the allowed window
//!   3. `CacheEngine::current()` → handle + dimensions for the renderer
//!
//! Decoding and GPU uploads sit behind the `Decoder` / `TextureBackend`
//! traits so the engine runs in tests without a GL context.

use std::collections::HashSet;

// ── Boundary traits ─────────────────────────────────────────────────────

/// Decoded image: raw RGBA pixels ready for upload.
pub struct DecodedImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Texture filtering, fixed at startup and applied to every upload.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FilterMode {
    /// Nearest-neighbour min/mag (pixel art).
    Nearest,
    /// Trilinear with mipmaps.
    LinearMipmap,
}

/// Turns a file path into RGBA pixels.
pub trait Decoder {
    fn decode(&self, path: &str) -> Result<DecodedImage, LoadError>;
}

/// Owns GPU texture handles: upload pixels, release handles.
pub trait TextureBackend {
    type Handle;

    fn upload(
        &mut self,
        path: &str,
        img: &DecodedImage,
        filter: FilterMode,
    ) -> Result<Self::Handle, LoadError>;

    fn release(&mut self, handle: Self::Handle);
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to decode {path}: {reason}")]
    DecodeFailed { path: String, reason: String },
    #[error("texture allocation failed for {path}")]
    AllocationFailed { path: String },
}

// ── Config ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug)]
pub struct CacheConfig {
    /// How many images the cache is budgeted to keep resident (≥ 1).
    pub max_load: usize,
    pub preload: bool,
    pub filter: FilterMode,
}

impl CacheConfig {
    /// Resolve the startup configuration. Without an explicit budget the
    /// cache holds one image, or two when preloading needs the head room.
    pub fn resolve(max_load: Option<usize>, preload: bool, filter: FilterMode) -> Self {
        let max_load = max_load.unwrap_or(if preload { 2 } else { 1 });
        CacheConfig {
            max_load: max_load.max(1),
            preload,
            filter,
        }
    }
}

// ── Window policy ───────────────────────────────────────────────────────

/// Indices allowed to stay resident for a given cursor position.
///
/// With a budget of one only the cursor itself may stay. Otherwise the
/// window spans `k = ceil(max_load / 2)` neighbours on each side of the
/// cursor, wrapping at the collection ends. The span can therefore hold up
/// to `2k + 1` entries, which for odd budgets admits more slots than
/// `max_load` itself; wrap-around duplicates collapse into the set.
pub fn allowed_window(cursor: usize, len: usize, max_load: usize) -> HashSet<usize> {
    let mut allowed = HashSet::new();
    allowed.insert(cursor);
    if max_load > 1 {
        let k = max_load.div_ceil(2);
        for i in 1..=k {
            allowed.insert((cursor + i) % len);
            allowed.insert((cursor + len - (i % len)) % len);
        }
    }
    allowed
}

// ── Slot table ──────────────────────────────────────────────────────────

/// One slot per collection index: nothing, or one uploaded texture.
pub enum Slot<H> {
    Empty,
    Resident { handle: H, width: u32, height: u32 },
}

/// Per-index texture storage. Loads and releases go through here and
/// nowhere else; the table itself knows nothing about the cursor.
struct SlotTable<H> {
    slots: Vec<Slot<H>>,
}

impl<H> SlotTable<H> {
    fn new(len: usize) -> Self {
        SlotTable {
            slots: (0..len).map(|_| Slot::Empty).collect(),
        }
    }

    fn get(&self, index: usize) -> &Slot<H> {
        &self.slots[index]
    }

    fn is_resident(&self, index: usize) -> bool {
        matches!(self.slots[index], Slot::Resident { .. })
    }

    fn resident_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, Slot::Resident { .. }))
            .map(|(i, _)| i)
            .collect()
    }

    /// Decode + upload the image at `index` unless it is already resident.
    /// Returns the pixel dimensions. On failure the slot stays empty.
    fn ensure_loaded<D, B>(
        &mut self,
        index: usize,
        path: &str,
        filter: FilterMode,
        decoder: &D,
        backend: &mut B,
    ) -> Result<(u32, u32), LoadError>
    where
        D: Decoder,
        B: TextureBackend<Handle = H>,
    {
        if let Slot::Resident { width, height, .. } = self.slots[index] {
            return Ok((width, height));
        }
        let img = decoder.decode(path)?;
        let handle = backend.upload(path, &img, filter)?;
        self.slots[index] = Slot::Resident {
            handle,
            width: img.width,
            height: img.height,
        };
        Ok((img.width, img.height))
    }

    /// Release the texture at `index`. No-op if the slot is already empty.
    fn release<B>(&mut self, index: usize, backend: &mut B)
    where
        B: TextureBackend<Handle = H>,
    {
        if let Slot::Resident { handle, .. } = std::mem::replace(&mut self.slots[index], Slot::Empty)
        {
            backend.release(handle);
        }
    }
}

// ── Engine ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Forward,
    Backward,
}

/// Owns the slot table and the cursor, and drives loads, prefetch and
/// eviction. The slot under the cursor is always resident between frames.
pub struct CacheEngine<D: Decoder, B: TextureBackend> {
    paths: Vec<String>,
    table: SlotTable<B::Handle>,
    cursor: usize,
    max_load: usize,
    preload: bool,
    filter: FilterMode,
    /// Indices whose speculative load failed. Not prefetched again; the
    /// synchronous load when one becomes current clears it on success.
    prefetch_failed: HashSet<usize>,
    decoder: D,
    backend: B,
}

impl<D: Decoder, B: TextureBackend> CacheEngine<D, B> {
    /// Build the engine and synchronously load the first image. A failure
    /// here is fatal: the caller prints the error and exits.
    pub fn new(
        paths: Vec<String>,
        config: CacheConfig,
        decoder: D,
        mut backend: B,
    ) -> Result<Self, LoadError> {
        assert!(!paths.is_empty(), "image collection must not be empty");
        let mut table = SlotTable::new(paths.len());
        table.ensure_loaded(0, &paths[0], config.filter, &decoder, &mut backend)?;
        Ok(CacheEngine {
            paths,
            table,
            cursor: 0,
            max_load: config.max_load,
            preload: config.preload,
            filter: config.filter,
            prefetch_failed: HashSet::new(),
            decoder,
            backend,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_path(&self) -> &str {
        &self.paths[self.cursor]
    }

    /// The active render resource: handle + pixel dimensions of the slot
    /// under the cursor.
    pub fn current(&self) -> Option<(&B::Handle, u32, u32)> {
        match self.table.get(self.cursor) {
            Slot::Resident {
                handle,
                width,
                height,
            } => Some((handle, *width, *height)),
            Slot::Empty => None,
        }
    }

    /// Step the cursor one position (wrapping) and block until the new
    /// current image is resident. A load failure here is fatal to the
    /// caller; there is nothing sensible to display instead.
    pub fn navigate(&mut self, dir: Direction) -> Result<(), LoadError> {
        let len = self.len();
        let old = self.cursor;
        self.cursor = match dir {
            Direction::Forward => (self.cursor + 1) % len,
            Direction::Backward => (self.cursor + len - 1) % len,
        };

        self.table.ensure_loaded(
            self.cursor,
            &self.paths[self.cursor],
            self.filter,
            &self.decoder,
            &mut self.backend,
        )?;
        self.prefetch_failed.remove(&self.cursor);

        // With a budget of one the windowed sweep never runs; drop the
        // previous image right away. The current slot is never released,
        // so a single-image collection keeps its texture.
        if self.max_load <= 1 && old != self.cursor {
            self.table.release(old, &mut self.backend);
        }
        Ok(())
    }

    /// Once-per-frame upkeep: prefetch the next slot, then evict everything
    /// outside the allowed window. Runs whether or not the cursor moved, so
    /// the resident set converges after navigation bursts.
    pub fn maintain(&mut self) {
        if self.max_load <= 1 {
            // No head room for a second resident image: prefetch stays off
            // even when enabled, and navigate() already released the rest.
            return;
        }

        if self.preload {
            let next = (self.cursor + 1) % self.len();
            if !self.table.is_resident(next) && !self.prefetch_failed.contains(&next) {
                let res = self.table.ensure_loaded(
                    next,
                    &self.paths[next],
                    self.filter,
                    &self.decoder,
                    &mut self.backend,
                );
                if let Err(e) = res {
                    // Speculative only: the slot stays empty and the load is
                    // retried when the image actually becomes current.
                    eprintln!("preload failed: {}", e);
                    self.prefetch_failed.insert(next);
                }
            }
        }

        let allowed = allowed_window(self.cursor, self.len(), self.max_load);
        for i in 0..self.len() {
            if !allowed.contains(&i) {
                self.table.release(i, &mut self.backend);
            }
        }
    }

    /// Resident slot indices, for the debug log and for tests.
    pub fn resident_indices(&self) -> Vec<usize> {
        self.table.resident_indices()
    }
}

impl<D: Decoder, B: TextureBackend> Drop for CacheEngine<D, B> {
    fn drop(&mut self) {
        for i in 0..self.paths.len() {
            self.table.release(i, &mut self.backend);
        }
    }
}
