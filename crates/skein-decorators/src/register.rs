//! Registration of builtin capabilities and node kinds

use crate::file::{FileCapability, FILE_NODE_KIND};
use crate::folder::{FolderCapability, FOLDER_NODE_KIND};
use crate::text::TextContentCapability;
use once_cell::sync::OnceCell;
use skein_memento::FactoryRegistry;

/// Register every builtin capability and node kind
pub fn register_builtin(registry: &FactoryRegistry) {
    registry.register_restorable::<FolderCapability>();
    registry.register_restorable::<FileCapability>();
    registry.register_restorable::<TextContentCapability>();
    registry.register_node_kind(FOLDER_NODE_KIND);
    registry.register_node_kind(FILE_NODE_KIND);
    tracing::debug!("registered builtin decorators");
}

/// Fresh registry with the builtins
#[must_use]
pub fn builtin_registry() -> FactoryRegistry {
    let registry = FactoryRegistry::new();
    register_builtin(&registry);
    registry
}

/// Process-wide registry with the builtins installed
///
/// Builtins go into [`FactoryRegistry::global`] on the first call only, so
/// plugin types registered there before or after stay visible. A plugin
/// replacing a builtin discriminator must register after this first call.
#[must_use]
pub fn global_registry() -> &'static FactoryRegistry {
    static INSTALLED: OnceCell<()> = OnceCell::new();
    let registry = FactoryRegistry::global();
    INSTALLED.get_or_init(|| register_builtin(registry));
    registry
}
