//! Texture Cache
//!
//! Finds samplers by texture name, constructing each at most once and
//! substituting a dummy when the file can't be used.

use crate::dummy::*;
use crate::environment::*;
use crate::occlusion::*;
use crate::shadow::*;
use crate::texture::*;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use texcore::error::*;
use texcore::geometry::*;
use texcore::memory::*;
use texcore::search_path::resolve;
use texcore::texfile::*;

/// Samplers of one kind keyed by name. Each entry is a slot that is filled
/// exactly once; concurrent misses on the same name wait for the first
/// construction instead of repeating it.
struct SamplerMap<S: ?Sized> {
    /// Label used in log messages.
    kind: &'static str,

    /// Slots keyed by texture name.
    entries: RwLock<HashMap<String, Arc<OnceLock<Arc<S>>>>>,
}

impl<S: ?Sized> SamplerMap<S> {
    /// Creates an empty map.
    ///
    /// * `kind` - Label used in log messages.
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the sampler for a name, constructing it on first use. The map
    /// lock is released before `create` runs.
    ///
    /// * `name`   - Texture name.
    /// * `create` - Constructs the sampler.
    fn get_or_create<F>(&self, name: &str, create: F) -> Arc<S>
    where
        F: FnOnce() -> Arc<S>,
    {
        let existing = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        let slot = match existing {
            Some(slot) => slot,
            None => self
                .entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(name.to_string())
                .or_default()
                .clone(),
        };

        let mut created = false;
        let sampler = slot
            .get_or_init(|| {
                created = true;
                create()
            })
            .clone();
        if created {
            debug!("{} cache miss: {name}", self.kind);
        } else {
            trace!("{} cache hit: {name}", self.kind);
        }
        sampler
    }

    /// Returns the constructed samplers.
    fn values(&self) -> Vec<Arc<S>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter_map(|slot| slot.get().cloned())
            .collect()
    }

    /// Returns the number of entries.
    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drops every entry.
    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Callback returning the current texture search path.
pub type SearchPathFn = Box<dyn Fn() -> String + Send + Sync>;

/// Cache of texture, environment, shadow and occlusion samplers for one
/// render session.
///
/// Lookups never fail: a texture that can't be opened or used is logged once
/// and replaced by a dummy sampler, which stays cached until `flush()`.
pub struct TextureCache {
    /// Opens resolved paths.
    opener: Arc<dyn TextureFileOpener>,

    /// Returns the search path.
    search_path: SearchPathFn,

    /// Memory budget shared by every sampler's tiles.
    sentry: Arc<MemorySentry>,

    /// Plain texture samplers.
    textures: SamplerMap<dyn TextureSampler>,

    /// Environment samplers.
    environments: SamplerMap<dyn EnvironmentSampler>,

    /// Shadow samplers.
    shadows: SamplerMap<dyn ShadowSampler>,

    /// Occlusion samplers.
    occlusions: SamplerMap<dyn OcclusionSampler>,

    /// Current to world transform given to shadow and occlusion samplers.
    curr_to_world: RwLock<Matrix4x4>,
}

impl TextureCache {
    /// Creates an empty cache.
    ///
    /// * `opener`      - Opens texture files.
    /// * `search_path` - Returns the search path used to resolve names.
    /// * `sentry`      - Memory budget for tiles.
    pub fn new(opener: Arc<dyn TextureFileOpener>, search_path: SearchPathFn, sentry: Arc<MemorySentry>) -> Self {
        Self {
            opener,
            search_path,
            sentry,
            textures: SamplerMap::new("texture"),
            environments: SamplerMap::new("environment"),
            shadows: SamplerMap::new("shadow"),
            occlusions: SamplerMap::new("occlusion"),
            curr_to_world: RwLock::new(Matrix4x4::default()),
        }
    }

    /// Returns the memory sentry.
    pub fn sentry(&self) -> &Arc<MemorySentry> {
        &self.sentry
    }

    /// Resolves a texture name against the search path.
    ///
    /// * `name` - Texture name.
    pub fn resolve(&self, name: &str) -> String {
        let search_path = (self.search_path)();
        resolve(name, &search_path, |p| self.opener.exists(p))
    }

    /// Resolves and opens a texture file.
    ///
    /// * `name` - Texture name.
    fn open(&self, name: &str) -> TexResult<ArcTextureFile> {
        let path = self.resolve(name);
        self.opener.open(&path)
    }

    /// Returns the current to world transform.
    fn curr_to_world(&self) -> Matrix4x4 {
        *self.curr_to_world.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the plain texture sampler for a name.
    ///
    /// * `name` - Texture name.
    pub fn find_texture_sampler(&self, name: &str) -> ArcTextureSampler {
        self.textures.get_or_create(name, || {
            match self
                .open(name)
                .and_then(|f| PlainTextureSampler::create(f, Some(&self.sentry)))
            {
                Ok(s) => Arc::new(s) as ArcTextureSampler,
                Err(err) => {
                    warn!("Cannot use texture \"{name}\": {err}; substituting a dummy");
                    Arc::new(DummyTextureSampler)
                }
            }
        })
    }

    /// Returns the environment sampler for a name.
    ///
    /// * `name` - Texture name.
    pub fn find_environment_sampler(&self, name: &str) -> ArcEnvironmentSampler {
        self.environments.get_or_create(name, || {
            match self
                .open(name)
                .and_then(|f| EnvironmentMapSampler::create(f, Some(&self.sentry)))
            {
                Ok(s) => Arc::new(s) as ArcEnvironmentSampler,
                Err(err) => {
                    warn!("Cannot use environment map \"{name}\": {err}; substituting a dummy");
                    Arc::new(DummyEnvironmentSampler)
                }
            }
        })
    }

    /// Returns the shadow sampler for a name.
    ///
    /// * `name` - Texture name.
    pub fn find_shadow_sampler(&self, name: &str) -> ArcShadowSampler {
        self.shadows.get_or_create(name, || {
            let curr_to_world = self.curr_to_world();
            match self
                .open(name)
                .and_then(|f| ShadowMapSampler::create(f, Some(&self.sentry), &curr_to_world))
            {
                Ok(s) => Arc::new(s) as ArcShadowSampler,
                Err(err) => {
                    warn!("Cannot use shadow map \"{name}\": {err}; substituting a dummy");
                    Arc::new(DummyShadowSampler)
                }
            }
        })
    }

    /// Returns the occlusion sampler for a name.
    ///
    /// * `name` - Texture name.
    pub fn find_occlusion_sampler(&self, name: &str) -> ArcOcclusionSampler {
        self.occlusions.get_or_create(name, || {
            let curr_to_world = self.curr_to_world();
            match self
                .open(name)
                .and_then(|f| OcclusionMapSampler::create(f, Some(&self.sentry), &curr_to_world))
            {
                Ok(s) => Arc::new(s) as ArcOcclusionSampler,
                Err(err) => {
                    warn!("Cannot use occlusion map \"{name}\": {err}; substituting a dummy");
                    Arc::new(DummyOcclusionSampler)
                }
            }
        })
    }

    /// Returns the header of a texture without caching a sampler for it, or
    /// `None` if it can't be opened.
    ///
    /// * `name` - Texture name.
    pub fn texture_info(&self, name: &str) -> Option<TextureFileHeader> {
        match self.open(name) {
            Ok(file) if file.num_subimages() > 0 => Some(file.header(0).clone()),
            Ok(_) => None,
            Err(err) => {
                debug!("No texture info for \"{name}\": {err}");
                None
            }
        }
    }

    /// Returns the number of cached samplers of all kinds, dummies included.
    pub fn num_samplers(&self) -> usize {
        self.textures.len() + self.environments.len() + self.shadows.len() + self.occlusions.len()
    }

    /// Drops every cached sampler. Samplers still held by callers stay
    /// usable; later lookups construct new ones.
    pub fn flush(&self) {
        info!("Flushing {} cached samplers", self.num_samplers());
        self.textures.clear();
        self.environments.clear();
        self.shadows.clear();
        self.occlusions.clear();
    }

    /// Sets the current to world transform for shadow and occlusion samplers
    /// created afterwards and for those already cached.
    ///
    /// Live samplers switch transforms without synchronizing with lookups in
    /// flight, so this must be called between frames rather than while
    /// shading.
    ///
    /// * `curr_to_world` - The transform.
    pub fn set_curr_to_world_matrix(&self, curr_to_world: &Matrix4x4) {
        *self
            .curr_to_world
            .write()
            .unwrap_or_else(PoisonError::into_inner) = *curr_to_world;
        for s in self.shadows.values() {
            s.set_curr_to_world(curr_to_world);
        }
        for s in self.occlusions.values() {
            s.set_curr_to_world(curr_to_world);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::footprint::*;
    use crate::options::*;
    use texcore::channel::*;
    use texcore::filter::*;
    use texcore::math::Float;

    fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
        Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
    }

    fn opener() -> Arc<MemoryFileOpener> {
        let opener = Arc::new(MemoryFileOpener::new());
        let header = TextureFileHeader::new(2, 2, ChannelList::uniform(&["y"], ChannelType::Float32));
        let file = MemoryTextureFile::from_floats("/maps/grid.tex", header, &[1.0, 2.0, 3.0, 4.0]).unwrap();
        opener.insert("/maps/grid.tex", Arc::new(file));

        let header = shadow_map_header(4, 4, Matrix4x4::default(), Matrix4x4::default());
        let file = MemoryTextureFile::from_floats("/maps/light.shd", header, &[1.0; 16]).unwrap();
        opener.insert("/maps/light.shd", Arc::new(file));
        opener
    }

    fn cache(opener: Arc<MemoryFileOpener>) -> TextureCache {
        TextureCache::new(
            opener,
            Box::new(|| "/other:/maps".to_string()),
            Arc::new(MemorySentry::new(1 << 20)),
        )
    }

    fn box_lookup(s: &ArcTextureSampler, x: Float, y: Float, num_channels: usize) -> Vec<Float> {
        let opts = TextureSampleOptions {
            filter_type: FilterType::Box,
            num_channels,
            ..s.default_sample_options()
        };
        let mut out = vec![0.0; num_channels];
        s.sample_pllgram(&SamplePllgram::from_extents(Point2f::new(x, y), 0.0, 0.0), &opts, &mut out)
            .unwrap();
        out
    }

    #[test]
    fn same_sampler_until_flush() {
        let c = cache(opener());
        let a = c.find_texture_sampler("grid.tex");
        let b = c.find_texture_sampler("grid.tex");
        assert!(same(&a, &b));
        c.flush();
        assert_eq!(c.num_samplers(), 0);
        let d = c.find_texture_sampler("grid.tex");
        assert!(!same(&a, &d));
    }

    #[test]
    fn box_lookup_through_the_cache() {
        let c = cache(opener());
        let s = c.find_texture_sampler("grid.tex");
        assert_eq!(box_lookup(&s, 0.25, 0.25, 1), vec![1.0]);
        assert_eq!(box_lookup(&s, 0.75, 0.25, 1), vec![2.0]);
    }

    #[test]
    fn missing_texture_is_cached_as_dummy() {
        let o = opener();
        let c = cache(o.clone());
        let s = c.find_texture_sampler("missing.tex");
        assert_eq!(box_lookup(&s, 0.5, 0.5, 4), vec![0.0, 0.0, 0.0, 1.0]);
        let again = c.find_texture_sampler("missing.tex");
        assert!(same(&s, &again));
        assert_eq!(o.open_count(), 1);
    }

    #[test]
    fn wrong_kind_gives_dummy() {
        let c = cache(opener());
        // A colour texture has no shadow transforms.
        let s = c.find_shadow_sampler("grid.tex");
        let mut out = [0.5];
        s.sample_pllgram(
            &Sample3dPllgram::point(Vector3f::new(0.0, 0.0, 1.0)),
            &ShadowSampleOptions::default(),
            &mut out,
        )
        .unwrap();
        assert_eq!(out, [0.0]);
    }

    #[test]
    fn concurrent_misses_open_once() {
        let o = opener();
        let c = cache(o.clone());
        let found: Vec<ArcTextureSampler> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| c.find_texture_sampler("grid.tex")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(o.open_count(), 1);
        assert!(found.iter().all(|s| same(s, &found[0])));
    }

    #[test]
    fn texture_info_does_not_cache() {
        let c = cache(opener());
        let header = c.texture_info("grid.tex").unwrap();
        assert_eq!((header.width, header.height), (2, 2));
        assert!(c.texture_info("missing.tex").is_none());
        assert_eq!(c.num_samplers(), 0);
    }

    #[test]
    fn curr_to_world_reaches_live_shadow_samplers() {
        let c = cache(opener());
        let s = c.find_shadow_sampler("light.shd");
        let p = Sample3dPllgram::point(Vector3f::new(0.0, 0.0, 5.0));
        let opts = ShadowSampleOptions {
            num_samples: 1,
            ..s.default_sample_options()
        };
        let mut out = [0.0];
        s.sample_pllgram(&p, &opts, &mut out).unwrap();
        assert_eq!(out, [1.0]);

        // Moves the lookup off the map.
        c.set_curr_to_world_matrix(&Matrix4x4::translate(Vector3f::new(5.0, 0.0, 0.0)));
        s.sample_pllgram(&p, &opts, &mut out).unwrap();
        assert_eq!(out, [0.0]);
    }

    #[test]
    fn tiles_are_evicted_over_budget() {
        let o = opener();
        let c = TextureCache::new(o, Box::new(String::new), Arc::new(MemorySentry::new(1)));
        let s = c.find_texture_sampler("/maps/grid.tex");
        assert_eq!(box_lookup(&s, 0.25, 0.75, 1), vec![3.0]);
        assert_eq!(box_lookup(&s, 0.75, 0.75, 1), vec![4.0]);
        assert!(c.sentry().total_memory() <= 1);
    }
}
