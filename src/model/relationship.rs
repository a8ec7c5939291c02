use super::element::ElementId;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationshipId(pub(crate) u32);

impl RelationshipId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct RelationshipRecord {
    pub id: RelationshipId,
    pub source: ElementId,
    pub destination: ElementId,
    pub description: String,
    pub technology: String,
    pub tags: Vec<String>,
    pub properties: FxHashMap<String, String>,
    pub perspectives: FxHashMap<String, String>,
}

impl RelationshipRecord {
    pub fn new(id: RelationshipId, source: ElementId, destination: ElementId) -> Self {
        Self {
            id,
            source,
            destination,
            description: String::new(),
            technology: String::new(),
            tags: Vec::new(),
            properties: FxHashMap::default(),
            perspectives: FxHashMap::default(),
        }
    }
}
