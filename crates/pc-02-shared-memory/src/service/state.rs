use crate::domain::{DbElement, Element};
use crate::errors::SharedMemoryError;
use pc_01_keyed_store::{KeyedStore, PrefixStore};
use shared_types::Codec;
use std::collections::HashSet;
use std::sync::Arc;

/// One direction of a chain pair: a value namespace plus its trait index.
pub(crate) struct NamespaceState<'a> {
    value_db: PrefixStore,
    index_db: PrefixStore,
    codec: &'a Codec,
}

impl<'a> NamespaceState<'a> {
    pub fn open(shared_db: &PrefixStore, prefixes: (u8, u8), codec: &'a Codec) -> Self {
        let shared: Arc<dyn KeyedStore> = Arc::new(shared_db.clone());
        Self {
            value_db: PrefixStore::new(&[prefixes.0], shared.clone()),
            index_db: PrefixStore::new(&[prefixes.1], shared),
            codec,
        }
    }

    fn load(&self, key: &[u8]) -> Result<Option<DbElement>, SharedMemoryError> {
        match self.value_db.get(key)? {
            Some(bytes) => Ok(Some(self.codec.unmarshal(&bytes)?)),
            None => Ok(None),
        }
    }

    fn store(&self, key: &[u8], element: &DbElement) -> Result<(), SharedMemoryError> {
        let bytes = self.codec.marshal(element)?;
        self.value_db.put(key, &bytes)?;
        Ok(())
    }

    /// Present value under `key`. Tombstones read as not found.
    pub fn value(&self, key: &[u8]) -> Result<Vec<u8>, SharedMemoryError> {
        match self.load(key)? {
            Some(elem) if elem.present => Ok(elem.value),
            _ => Err(SharedMemoryError::not_found(key)),
        }
    }

    pub fn set_value(&self, element: &Element) -> Result<(), SharedMemoryError> {
        match self.load(&element.key)? {
            // The remove arrived first; the put cancels the tombstone.
            Some(existing) if !existing.present => {
                self.value_db.delete(&element.key)?;
                Ok(())
            }
            Some(_) => Err(SharedMemoryError::DuplicatePut {
                key: hex::encode(&element.key),
            }),
            None => {
                self.store(
                    &element.key,
                    &DbElement {
                        present: true,
                        value: element.value.clone(),
                        traits: element.traits.clone(),
                    },
                )?;
                for t in &element.traits {
                    self.index_db.nested(t).put(&element.key, &[])?;
                }
                Ok(())
            }
        }
    }

    pub fn remove_value(&self, key: &[u8]) -> Result<(), SharedMemoryError> {
        match self.load(key)? {
            None => self.store(
                key,
                &DbElement {
                    present: false,
                    value: Vec::new(),
                    traits: Vec::new(),
                },
            ),
            Some(existing) if !existing.present => Err(SharedMemoryError::DuplicateRemove {
                key: hex::encode(key),
            }),
            Some(existing) => {
                for t in &existing.traits {
                    self.index_db.nested(t).delete(key)?;
                }
                self.value_db.delete(key)?;
                Ok(())
            }
        }
    }

    /// Up to `limit` distinct keys carrying any of `traits`, resuming at
    /// `(start_trait, start_key)`. Returns the keys and the cursor reached.
    /// The cursor is inclusive: the next page starts with `last_key`.
    pub fn keys_by_traits(
        &self,
        traits: &[Vec<u8>],
        start_trait: &[u8],
        start_key: &[u8],
        mut limit: usize,
    ) -> Result<(Vec<Vec<u8>>, Vec<u8>, Vec<u8>), SharedMemoryError> {
        let mut sorted: Vec<&Vec<u8>> = traits.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut tracked = HashSet::new();
        let mut keys = Vec::new();
        let mut last_trait = start_trait.to_vec();
        let mut last_key = start_key.to_vec();
        if limit == 0 {
            return Ok((keys, last_trait, last_key));
        }

        for t in sorted {
            let from: &[u8] = match t.as_slice().cmp(start_trait) {
                std::cmp::Ordering::Less => continue,
                std::cmp::Ordering::Equal => start_key,
                std::cmp::Ordering::Greater => &[],
            };
            last_trait = t.clone();
            last_key = from.to_vec();

            for (key, _) in self.index_db.nested(t).scan_from(&[], from)? {
                if limit == 0 {
                    break;
                }
                last_key = key.clone();
                if tracked.insert(key.clone()) {
                    keys.push(key);
                    limit -= 1;
                }
            }
            if limit == 0 {
                break;
            }
        }
        Ok((keys, last_trait, last_key))
    }
}
