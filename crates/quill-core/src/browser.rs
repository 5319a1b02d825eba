use crate::error::{CoreError, Result};
use crate::reflect::{ReflectionProvider, SymbolDescriptor};
use std::sync::Arc;
use tracing::warn;

/// Namespace and symbol listings shaped for the browsing pages.
#[derive(Clone)]
pub struct NamespaceBrowser {
    provider: Arc<dyn ReflectionProvider>,
}

impl NamespaceBrowser {
    pub fn new(provider: Arc<dyn ReflectionProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn ReflectionProvider> {
        &self.provider
    }

    /// Loaded namespace names, ascending.
    pub fn list_namespaces(&self) -> Vec<String> {
        let mut names = self.provider.namespaces();
        names.sort();
        names
    }

    /// Every symbol interned in `namespace`, ordered by name.
    pub fn list_symbols(&self, namespace: &str) -> Result<Vec<SymbolDescriptor>> {
        let mut symbols = self.provider.symbols(namespace).ok_or_else(|| {
            warn!(namespace, "Namespace not found");
            CoreError::namespace_not_found(namespace)
        })?;
        symbols.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(symbols)
    }

    pub fn describe_symbol(&self, namespace: &str, symbol: &str) -> Result<SymbolDescriptor> {
        self.provider.describe(namespace, symbol).ok_or_else(|| {
            warn!(namespace, symbol, "Symbol not found");
            CoreError::symbol_not_found(namespace, symbol)
        })
    }
}
