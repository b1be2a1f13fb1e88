use std::{
    marker::PhantomData,
    ops::{Index, IndexMut},
};

/// Append-only storage addressed by typed ids. Nodes are never removed while
/// a scene lives, so an id stays valid for the arena's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena<Id: IdLike, T> {
    inner: Vec<T>,
    _phantom: PhantomData<Id>,
}

impl<Id: IdLike, T> Arena<Id, T> {
    pub fn new() -> Self {
        Self { inner: Vec::new(), _phantom: PhantomData }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn push(&mut self, x: T) -> Id {
        let id = Id::from_raw(self.inner.len());
        self.inner.push(x);
        id
    }

    pub fn get(&self, id: Id) -> Option<&T> {
        self.inner.get(id.into_raw())
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut T> {
        self.inner.get_mut(id.into_raw())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id, &T)> {
        self.inner.iter().enumerate().map(|(i, v)| (Id::from_raw(i), v))
    }
}

impl<Id: IdLike, T> Default for Arena<Id, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: IdLike, T> Index<Id> for Arena<Id, T> {
    type Output = T;

    fn index(&self, index: Id) -> &Self::Output {
        &self.inner[index.into_raw()]
    }
}

impl<Id: IdLike, T> IndexMut<Id> for Arena<Id, T> {
    fn index_mut(&mut self, index: Id) -> &mut Self::Output {
        &mut self.inner[index.into_raw()]
    }
}

pub trait IdLike: Copy {
    fn from_raw(index: usize) -> Self;
    fn into_raw(self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct TestId(usize);

    impl IdLike for TestId {
        fn from_raw(index: usize) -> Self {
            Self(index)
        }

        fn into_raw(self) -> usize {
            self.0
        }
    }

    #[test]
    fn ids_are_stable_and_sequential() {
        let mut arena: Arena<TestId, &str> = Arena::new();
        let a = arena.push("a");
        let b = arena.push("b");
        assert_eq!((a, b), (TestId(0), TestId(1)));
        arena[a] = "A";
        assert_eq!(arena.get(a), Some(&"A"));
        assert_eq!(arena.get(TestId(5)), None);
        assert_eq!(arena.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![a, b]);
    }
}
