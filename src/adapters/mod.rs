//! 适配器层：思维 / 记忆 / 能力的开箱实现

#[cfg(feature = "redb-memory")]
pub mod memory_redb;
pub mod memory_simple;
pub mod mind_openai;
pub mod mind_script;
pub mod toolkit;

#[cfg(feature = "redb-memory")]
pub use memory_redb::RedbMemory;
pub use memory_simple::SimpleMemory;
pub use mind_openai::OpenAiMind;
pub use mind_script::ScriptMind;
pub use toolkit::{Toolkit, ToolkitTool};
