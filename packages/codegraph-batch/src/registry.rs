use crate::domain::{IssueProvider, ParserService, ProviderRegistry, UnitParser};
use std::collections::HashMap;
use std::sync::Arc;

/// Content-type keyed provider registry.
///
/// Providers registered under `"*"` apply to every content type.
pub struct InspectorRegistry {
    providers: HashMap<String, Vec<Arc<dyn IssueProvider>>>,
}

pub const ANY_CONTENT_TYPE: &str = "*";

impl InspectorRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    pub fn register<P: IssueProvider + 'static>(&mut self, content_type: &str, provider: P) {
        self.register_shared(content_type, Arc::new(provider));
    }

    pub fn register_shared(&mut self, content_type: &str, provider: Arc<dyn IssueProvider>) {
        self.providers
            .entry(content_type.to_string())
            .or_default()
            .push(provider);
    }

    pub fn with_provider<P: IssueProvider + 'static>(
        mut self,
        content_type: &str,
        provider: P,
    ) -> Self {
        self.register(content_type, provider);
        self
    }

    pub fn content_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.providers.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.providers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InspectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry for InspectorRegistry {
    fn providers_for(&self, content_type: &str) -> Vec<Arc<dyn IssueProvider>> {
        let specific = self.providers.get(content_type).into_iter().flatten();
        let wildcard = if content_type == ANY_CONTENT_TYPE {
            None
        } else {
            self.providers.get(ANY_CONTENT_TYPE)
        };
        specific
            .chain(wildcard.into_iter().flatten())
            .cloned()
            .collect()
    }
}

/// Content-type keyed parser lookup
#[derive(Default)]
pub struct ParserTable {
    parsers: HashMap<String, Arc<dyn UnitParser>>,
}

impl ParserTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parser<P: UnitParser + 'static>(mut self, content_type: &str, parser: P) -> Self {
        self.parsers
            .insert(content_type.to_string(), Arc::new(parser));
        self
    }

    pub fn insert(&mut self, content_type: &str, parser: Arc<dyn UnitParser>) {
        self.parsers.insert(content_type.to_string(), parser);
    }
}

impl ParserService for ParserTable {
    fn parser_for(&self, content_type: &str) -> Option<Arc<dyn UnitParser>> {
        self.parsers.get(content_type).cloned()
    }
}
