use super::{GraphTileProvider, TileProviderError};
use crate::GraphId;
use crate::graph_tile::GraphTileHandle;
use flate2::read::GzDecoder;
use lru::LruCache;
use std::fs::File;
use std::io::Read;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// Target number of resident tiles. Chosen so a routine query's working
/// set (the handful of tiles near the origin, destination, and the
/// search frontier in between) stays cached for the life of a request
/// without holding the whole extract in memory.
const DEFAULT_CACHE_CAPACITY: usize = 200;

/// Loads tiles from a directory tree laid out as
/// `<tiles_root>/2/<AAA>/<BBB>/<CCC>.gph.gz`, falling back to the same
/// path without the `.gz` suffix for tiles stored uncompressed.
///
/// Tiles are cached by tile (not by individual node/edge graph ID) in a
/// fixed-capacity, FIFO-evicted cache: the first tile referenced is the
/// first evicted once the cache is full, regardless of how often it was
/// subsequently reused. [`lru::LruCache`] is used purely as a bounded
/// map here; only [`LruCache::peek`] and [`LruCache::push`] are called,
/// so its internal recency order (which this provider never consults)
/// degenerates to insertion order.
pub struct DirectoryTileProvider {
    tiles_root: PathBuf,
    cache: Mutex<LruCache<u64, Arc<GraphTileHandle>>>,
}

impl DirectoryTileProvider {
    /// Creates a new provider rooted at `tiles_root`, with the default
    /// cache capacity.
    #[must_use]
    pub fn new(tiles_root: impl Into<PathBuf>) -> Self {
        Self::with_capacity(tiles_root, DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a new provider with an explicit cache capacity, mostly
    /// useful for tests that want to exercise eviction without loading
    /// hundreds of tiles.
    #[must_use]
    pub fn with_capacity(tiles_root: impl Into<PathBuf>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            tiles_root: tiles_root.into(),
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn load_from_disk(&self, base_id: GraphId) -> Result<GraphTileHandle, TileProviderError> {
        let relative = base_id.file_path("gph")?;
        let gz_path = gzip_path(&self.tiles_root, &relative);
        let plain_path = self.tiles_root.join(&relative);

        let bytes = if gz_path.is_file() {
            debug!(tile = %base_id, path = %gz_path.display(), "loading gzip tile from disk");
            let mut decoder = GzDecoder::new(File::open(&gz_path)?);
            let mut bytes = Vec::new();
            decoder.read_to_end(&mut bytes)?;
            bytes
        } else if plain_path.is_file() {
            debug!(tile = %base_id, path = %plain_path.display(), "loading uncompressed tile from disk");
            std::fs::read(&plain_path)?
        } else {
            return Err(TileProviderError::TileNotFound(base_id));
        };

        Ok(GraphTileHandle::try_new(bytes)?)
    }
}

fn gzip_path(tiles_root: &Path, relative: &Path) -> PathBuf {
    let mut name = relative.as_os_str().to_os_string();
    name.push(".gz");
    tiles_root.join(name)
}

impl GraphTileProvider for DirectoryTileProvider {
    fn get_tile_containing(
        &self,
        graph_id: GraphId,
    ) -> Result<Arc<GraphTileHandle>, TileProviderError> {
        let base_id = graph_id.tile_base_id();
        let key = base_id.value();

        {
            let mut cache = self
                .cache
                .lock()
                .map_err(|e| TileProviderError::PoisonedCacheLock(e.to_string()))?;
            if let Some(handle) = cache.peek(&key) {
                trace!(tile = %base_id, "cache hit");
                return Ok(Arc::clone(handle));
            }
        }

        trace!(tile = %base_id, "cache miss");
        let handle = Arc::new(self.load_from_disk(base_id)?);

        let mut cache = self
            .cache
            .lock()
            .map_err(|e| TileProviderError::PoisonedCacheLock(e.to_string()))?;
        if let Some((evicted, _)) = cache.push(key, Arc::clone(&handle))
            && evicted != key
        {
            debug!(tile = %evicted, "evicted tile from cache");
        }
        Ok(handle)
    }
}
