use crate::ast::Chain;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone)]
struct Slot {
    name: Rc<str>,
    value: i64,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Variables in first-assignment order.
///
/// Entries live in an arena of slots linked into a doubly linked list, with
/// a name index on the side for O(1) lookup, update and removal. Freed
/// slots are recycled. The list and the index are always updated together.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    slots: Vec<Slot>,
    vacant: Vec<usize>,
    index: HashMap<Rc<str>, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.index.get(name).map(|&idx| self.slots[idx].value)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut i64> {
        let idx = *self.index.get(name)?;
        Some(&mut self.slots[idx].value)
    }

    /// Overwrite an existing variable in place, or append a new one.
    pub fn assign(&mut self, name: Rc<str>, value: i64) {
        if let Some(slot) = self.get_mut(&name) {
            *slot = value;
            return;
        }

        let slot = Slot {
            name: Rc::clone(&name),
            value,
            prev: self.tail,
            next: None,
        };
        let idx = match self.vacant.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.slots[tail].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.index.insert(name, idx);
    }

    /// Unlink a variable, returning its last value.
    pub fn remove(&mut self, name: &str) -> Option<i64> {
        let idx = self.index.remove(name)?;
        let Slot { prev, next, value, .. } = self.slots[idx];

        match prev {
            Some(prev) => self.slots[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.slots[next].prev = prev,
            None => self.tail = prev,
        }

        self.vacant.push(idx);
        Some(value)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            next: self.head,
        }
    }
}

pub struct Iter<'a> {
    store: &'a VariableStore,
    next: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, i64);

    fn next(&mut self) -> Option<Self::Item> {
        let slot = &self.store.slots[self.next?];
        self.next = slot.next;
        Some((&*slot.name, slot.value))
    }
}

/// Function bodies, borrowed from the program being run.
#[derive(Debug, Default)]
pub struct FunctionTable<'ast> {
    bodies: HashMap<Rc<str>, &'ast Chain>,
}

impl<'ast> FunctionTable<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `body` under `name`. Returns `true` if an earlier body was
    /// replaced.
    pub fn declare(&mut self, name: Rc<str>, body: &'ast Chain) -> bool {
        self.bodies.insert(name, body).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&'ast Chain> {
        self.bodies.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

/// Everything a running program can name.
#[derive(Debug, Default)]
pub struct Environment<'ast> {
    pub variables: VariableStore,
    pub functions: FunctionTable<'ast>,
}

impl<'ast> Environment<'ast> {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Stmt;

    fn names(store: &VariableStore) -> Vec<String> {
        store.iter().map(|(name, _)| name.to_string()).collect()
    }

    #[test]
    fn test_assign_preserves_first_assignment_order() {
        let mut store = VariableStore::new();
        store.assign(Rc::from("x"), 1);
        store.assign(Rc::from("y"), 2);
        store.assign(Rc::from("x"), 9);
        let entries: Vec<_> = store.iter().collect();
        assert_eq!(entries, vec![("x", 9), ("y", 2)]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut store = VariableStore::new();
        store.assign(Rc::from("x"), 4);
        if let Some(value) = store.get_mut("x") {
            *value *= 3;
        }
        assert_eq!(store.get("x"), Some(12));
        assert_eq!(store.get_mut("nope"), None);
    }

    #[test]
    fn test_remove_head_middle_and_tail() {
        let mut store = VariableStore::new();
        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            store.assign(Rc::from(*name), i as i64);
        }

        assert_eq!(store.remove("b"), Some(1));
        assert_eq!(names(&store), vec!["a", "c", "d"]);
        assert_eq!(store.remove("a"), Some(0));
        assert_eq!(names(&store), vec!["c", "d"]);
        assert_eq!(store.remove("d"), Some(3));
        assert_eq!(names(&store), vec!["c"]);
        assert_eq!(store.remove("d"), None);
        assert_eq!(store.remove("c"), Some(2));
        assert!(store.is_empty());
        assert_eq!(store.iter().count(), 0);
    }

    #[test]
    fn test_reassign_after_remove_moves_to_end() {
        let mut store = VariableStore::new();
        store.assign(Rc::from("x"), 1);
        store.assign(Rc::from("y"), 2);
        store.remove("x");
        store.assign(Rc::from("x"), 3);
        assert_eq!(store.iter().collect::<Vec<_>>(), vec![("y", 2), ("x", 3)]);
        assert!(!store.contains("z"));
    }

    #[test]
    fn test_vacant_slots_are_reused() {
        let mut store = VariableStore::new();
        store.assign(Rc::from("x"), 1);
        store.assign(Rc::from("y"), 2);
        store.remove("x");
        store.assign(Rc::from("z"), 3);
        assert_eq!(store.slots.len(), 2);
        assert_eq!(names(&store), vec!["y", "z"]);
    }

    #[test]
    fn test_function_redeclaration_replaces_body() {
        let first = Chain::new(vec![Stmt::Print]);
        let second = Chain::default();
        let mut functions = FunctionTable::new();
        assert!(!functions.declare(Rc::from("f"), &first));
        assert!(functions.declare(Rc::from("f"), &second));
        assert_eq!(functions.get("f"), Some(&second));
        assert_eq!(functions.len(), 1);
        assert_eq!(functions.get("g"), None);
    }
}
