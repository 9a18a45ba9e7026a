//! Built-in knowledge points served when the remote fetch fails.

use crate::models::{KnowledgePoint, Level};

/// Module whose defaults are used for unknown modules.
pub const FALLBACK_MODULE: &str = "javascript";

/// Default points for `module`, or the `javascript` set if the module has
/// no table of its own.
pub fn default_knowledge_points(module: &str) -> Vec<KnowledgePoint> {
    match module {
        "html-css" => vec![
            KnowledgePoint::new("hc1", "Box model", Level::Easy, "Standard versus quirks-mode box model"),
            KnowledgePoint::new("hc2", "Flex layout", Level::Medium, "Flex container and item properties"),
            KnowledgePoint::new("hc3", "Grid layout", Level::Hard, "Advanced features of grid layout"),
        ],
        _ => vec![
            KnowledgePoint::new("js1", "Variable declarations", Level::Easy, "Differences between let, const and var"),
            KnowledgePoint::new("js2", "Scope chain", Level::Medium, "How the scope chain forms and is searched"),
            KnowledgePoint::new("js3", "Closures", Level::Hard, "How closures work and where to use them"),
        ],
    }
}
