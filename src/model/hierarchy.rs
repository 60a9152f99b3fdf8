use serde::{Deserialize, Serialize};

/// The id the API assigns to an archdeaconry, parish or congregation.
pub type HierarchyId = u64;

pub const ALL_ARCHDEACONRIES: &str = "All Archdeaconries";
pub const ALL_PARISHES: &str = "All Parishes";
pub const ALL_CONGREGATIONS: &str = "All Congregations";

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Archdeaconry {
    pub id: HierarchyId,
    pub name: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Parish {
    pub id: HierarchyId,
    pub name: String,
    pub archdeaconry: HierarchyId,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Congregation {
    pub id: HierarchyId,
    pub name: String,
    pub parish: HierarchyId,
}

/// The three levels of the church administration as served by the `archdeaconries/`, `parishes/`
/// and `congregations/` endpoints. Used to turn filter ids into the display names that label
/// exports.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub archdeaconries: Vec<Archdeaconry>,
    pub parishes: Vec<Parish>,
    pub congregations: Vec<Congregation>,
}

impl Hierarchy {
    pub fn archdeaconry(&self, id: HierarchyId) -> Option<&Archdeaconry> {
        self.archdeaconries.iter().find(|a| a.id == id)
    }

    pub fn parish(&self, id: HierarchyId) -> Option<&Parish> {
        self.parishes.iter().find(|p| p.id == id)
    }

    pub fn congregation(&self, id: HierarchyId) -> Option<&Congregation> {
        self.congregations.iter().find(|c| c.id == id)
    }

    pub fn parishes_in(&self, archdeaconry: HierarchyId) -> impl Iterator<Item = &Parish> {
        self.parishes
            .iter()
            .filter(move |p| p.archdeaconry == archdeaconry)
    }

    pub fn congregations_in(&self, parish: HierarchyId) -> impl Iterator<Item = &Congregation> {
        self.congregations.iter().filter(move |c| c.parish == parish)
    }

    /// The display label for an archdeaconry filter selection. An unset or unknown selection gets
    /// the "all" placeholder.
    pub fn archdeaconry_label(&self, id: Option<HierarchyId>) -> String {
        id.and_then(|id| self.archdeaconry(id))
            .map(|a| a.name.clone())
            .unwrap_or_else(|| ALL_ARCHDEACONRIES.to_string())
    }

    pub fn parish_label(&self, id: Option<HierarchyId>) -> String {
        id.and_then(|id| self.parish(id))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| ALL_PARISHES.to_string())
    }

    pub fn congregation_label(&self, id: Option<HierarchyId>) -> String {
        id.and_then(|id| self.congregation(id))
            .map(|c| c.name.clone())
            .unwrap_or_else(|| ALL_CONGREGATIONS.to_string())
    }
}
