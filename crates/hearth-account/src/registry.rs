use hearth_types::{Forum, ForumId};

/// The boards an account can point its cursor at.
///
/// The first board is the root: new accounts start there, and accounts whose
/// stored board has since disappeared fall back to it.
#[derive(Debug, Clone)]
pub struct ForumRegistry {
    forums: Vec<Forum>,
}

impl ForumRegistry {
    pub fn new(root: Forum) -> Self {
        Self { forums: vec![root] }
    }

    /// Register a board. Returns false if the id is already taken.
    pub fn insert(&mut self, forum: Forum) -> bool {
        if self.contains(forum.id) {
            return false;
        }
        self.forums.push(forum);
        true
    }

    pub fn root(&self) -> &Forum {
        &self.forums[0]
    }

    pub fn get(&self, id: ForumId) -> Option<&Forum> {
        self.forums.iter().find(|f| f.id == id)
    }

    pub fn contains(&self, id: ForumId) -> bool {
        self.get(id).is_some()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Forum> {
        self.forums.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Forum> {
        self.forums.iter()
    }
}

impl Default for ForumRegistry {
    fn default() -> Self {
        Self::new(Forum::new(ForumId::new(1), "general"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_first_and_ids_are_unique() {
        let mut registry = ForumRegistry::default();
        assert!(registry.insert(Forum::new(ForumId::new(2), "help")));
        assert!(!registry.insert(Forum::new(ForumId::new(2), "duplicate")));

        assert_eq!(registry.root().name, "general");
        assert_eq!(registry.find_by_name("HELP").map(|f| f.id), Some(ForumId::new(2)));
        assert!(registry.get(ForumId::new(3)).is_none());
        assert_eq!(registry.iter().count(), 2);
    }
}
