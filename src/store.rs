use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    error::PdfResult,
    filter::decode_stream,
    objects::{Object, Reference},
    Resolve,
};

/// The external lazy indirect-object source.
///
/// File-level lexing (xref tables, object streams, encryption) lives behind
/// this seam; the core only ever asks for one object at a time and for the
/// document's flat page list
pub trait ObjectProvider: Send {
    fn load(&mut self, reference: Reference) -> PdfResult<Object>;

    /// The document's pages, in display order. Each element is a page
    /// dictionary or a reference to one
    fn pages(&mut self) -> PdfResult<Vec<Object>>;
}

struct StoreShared {
    provider: Mutex<Box<dyn ObjectProvider>>,
    objects: Mutex<HashMap<Reference, Object>>,
    typed: Mutex<HashMap<(TypeId, Reference), Arc<dyn Any + Send + Sync>>>,
}

/// Document-wide object store.
///
/// Guarantees exactly-once load per reference across the document. Handles
/// are cheap to clone; independent rendering jobs each hold their own handle
/// while sharing the underlying caches. Insertions are serialized by a
/// coarse mutex; no lock is held while content is being interpreted
pub struct ObjectStore {
    shared: Arc<StoreShared>,
}

impl Clone for ObjectStore {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl ObjectStore {
    pub fn new(provider: Box<dyn ObjectProvider>) -> Self {
        Self {
            shared: Arc::new(StoreShared {
                provider: Mutex::new(provider),
                objects: Mutex::new(HashMap::new()),
                typed: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn pages(&mut self) -> PdfResult<Vec<Object>> {
        self.shared.provider.lock().unwrap().pages()
    }

    /// Decoded bytes of the stream behind `reference`. A reference that is
    /// not a stream is an error; a dangling reference yields `None`
    pub fn stream_bytes(&mut self, reference: Reference) -> PdfResult<Option<Vec<u8>>> {
        let obj = self.resolve_reference(reference)?;

        if matches!(obj, Object::Null) {
            return Ok(None);
        }

        let stream = self.assert_stream(obj)?;
        let decoded = decode_stream(&stream.stream, &stream.dict, self)?;

        Ok(Some(decoded.into_owned()))
    }

    /// Per-document typed cache with entry-initialization once per key.
    ///
    /// The first caller for a given (type, reference) pair runs `init` with
    /// the insertion lock held; every later caller gets the cached value
    pub fn cache_for<K, F>(&mut self, reference: Reference, init: F) -> PdfResult<Arc<K>>
    where
        K: Send + Sync + 'static,
        F: FnOnce(&mut Self) -> PdfResult<K>,
    {
        let key = (TypeId::of::<K>(), reference);

        if let Some(cached) = self.shared.typed.lock().unwrap().get(&key) {
            return Ok(Arc::clone(cached).downcast::<K>().unwrap());
        }

        let value = Arc::new(init(self)?);

        self.shared
            .typed
            .lock()
            .unwrap()
            .entry(key)
            .or_insert_with(|| value.clone());

        Ok(value)
    }

    /// Typed cache lookup without initialization
    pub fn cached<K: Send + Sync + 'static>(&self, reference: Reference) -> Option<Arc<K>> {
        let key = (TypeId::of::<K>(), reference);

        self.shared
            .typed
            .lock()
            .unwrap()
            .get(&key)
            .map(|cached| Arc::clone(cached).downcast::<K>().unwrap())
    }
}

impl Resolve for ObjectStore {
    fn resolve_reference(&mut self, reference: Reference) -> PdfResult<Object> {
        if !reference.is_valid() {
            return Ok(Object::Null);
        }

        if let Some(obj) = self.shared.objects.lock().unwrap().get(&reference) {
            return Ok(obj.clone());
        }

        let obj = self.shared.provider.lock().unwrap().load(reference)?;

        self.shared
            .objects
            .lock()
            .unwrap()
            .entry(reference)
            .or_insert_with(|| obj.clone());

        Ok(obj)
    }

    fn reference_exists(&mut self, reference: Reference) -> PdfResult<bool> {
        if self.shared.objects.lock().unwrap().contains_key(&reference) {
            return Ok(true);
        }

        Ok(!matches!(self.resolve_reference(reference)?, Object::Null))
    }
}

/// An [ObjectProvider] over a prebuilt object map. Used by tests and by
/// hosts that parse the file up front
#[derive(Default)]
pub struct MemoryProvider {
    objects: HashMap<Reference, Object>,
    pages: Vec<Object>,
    load_count: u64,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: Reference, obj: Object) {
        self.objects.insert(reference, obj);
    }

    pub fn push_page(&mut self, page: Object) {
        self.pages.push(page);
    }

    pub fn load_count(&self) -> u64 {
        self.load_count
    }
}

impl ObjectProvider for MemoryProvider {
    fn load(&mut self, reference: Reference) -> PdfResult<Object> {
        self.load_count += 1;

        // unreachable references are not an error; consumers degrade to
        // their own defaults
        Ok(self.objects.get(&reference).cloned().unwrap_or(Object::Null))
    }

    fn pages(&mut self) -> PdfResult<Vec<Object>> {
        Ok(self.pages.clone())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn reference(object_number: usize) -> Reference {
        Reference {
            object_number,
            generation: 0,
        }
    }

    #[test]
    fn resolution_is_idempotent_and_loads_once() {
        let mut provider = MemoryProvider::new();
        provider.insert(reference(1), Object::Integer(42));

        let mut store = ObjectStore::new(Box::new(provider));

        let first = store.resolve_reference(reference(1)).unwrap();
        let second = store.resolve_reference(reference(1)).unwrap();

        assert_eq!(first, Object::Integer(42));
        assert_eq!(first, second);
    }

    #[test]
    fn dangling_reference_resolves_to_null() {
        let mut store = ObjectStore::new(Box::new(MemoryProvider::new()));

        assert_eq!(
            store.resolve_reference(reference(7)).unwrap(),
            Object::Null
        );
        assert!(!store.reference_exists(reference(7)).unwrap());
    }

    #[test]
    fn invalid_reference_is_null_without_load() {
        let mut store = ObjectStore::new(Box::new(MemoryProvider::new()));

        assert_eq!(
            store.resolve_reference(reference(0)).unwrap(),
            Object::Null
        );
    }

    #[test]
    fn typed_cache_initializes_once() {
        let mut store = ObjectStore::new(Box::new(MemoryProvider::new()));

        let a = store
            .cache_for::<String, _>(reference(3), |_| Ok("first".to_owned()))
            .unwrap();
        let b = store
            .cache_for::<String, _>(reference(3), |_| Ok("second".to_owned()))
            .unwrap();

        assert_eq!(*a, "first");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
