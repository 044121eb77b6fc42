use std::collections::BTreeSet;

use sous::Recipe;

/// Local saved-membership tracking, de-duplicated by recipe id.
///
/// Recipe identity is the only internal the chat core relies on; the rest
/// of the recipe document is the persistence service's concern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavedRecipes {
    ids: BTreeSet<i64>,
}

impl SavedRecipes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds membership from a fetched recipe list.
    pub fn from_recipes<'a>(recipes: impl IntoIterator<Item = &'a Recipe>) -> Self {
        Self {
            ids: recipes.into_iter().map(|recipe| recipe.id).collect(),
        }
    }

    /// Returns true when the id was newly added.
    pub fn mark_saved(&mut self, id: i64) -> bool {
        self.ids.insert(id)
    }

    /// Returns true when the id was present.
    pub fn mark_removed(&mut self, id: i64) -> bool {
        self.ids.remove(&id)
    }

    #[must_use]
    pub fn is_saved(&self, id: i64) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.ids.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
