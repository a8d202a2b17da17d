use crate::api::ApiError;

/// Records that can be identified inside a [`Collection`].
pub trait Keyed {
    type Key: PartialEq + Clone;

    fn key(&self) -> Self::Key;
}

/// Local, possibly stale copy of a fetched list. Mutations are applied from
/// the result of the backend call: success patches the list, failure leaves
/// it exactly as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed + Clone> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, key: &T::Key) -> Option<&T> {
        self.items.iter().find(|item| &item.key() == key)
    }

    /// Appends the created record, or replaces the entry with the same key.
    pub fn apply_created(&mut self, result: Result<T, ApiError>) -> Result<(), ApiError> {
        if let Some(item) = self.replace(result?) {
            self.items.push(item);
        }
        Ok(())
    }

    /// Replaces the updated record in place, keeping its position. A record
    /// missing from the local copy is not added.
    pub fn apply_updated(&mut self, result: Result<T, ApiError>) -> Result<(), ApiError> {
        self.replace(result?);
        Ok(())
    }

    pub fn apply_removed(&mut self, key: &T::Key, result: Result<(), ApiError>) -> Result<(), ApiError> {
        result?;
        self.items.retain(|item| &item.key() != key);
        Ok(())
    }

    /// Swaps `item` in for the entry with its key. Hands `item` back when
    /// there is no such entry.
    fn replace(&mut self, item: T) -> Option<T> {
        let key = item.key();
        match self.items.iter().position(|existing| existing.key() == key) {
            Some(index) => {
                self.items[index] = item;
                // A stale copy may already hold duplicates of the key.
                let mut seen = false;
                self.items.retain(|existing| {
                    if existing.key() != key {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
                None
            }
            None => Some(item),
        }
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
