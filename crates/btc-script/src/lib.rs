/// Bitcoin toolkit - Script parsing, execution, and address handling.
///
/// Provides the Bitcoin Script type, opcode definitions, instruction
/// parsing, address encoding, the standard script templates, and the
/// script interpreter engine.

pub mod address;
pub mod instruction;
pub mod interpreter;
pub mod opcodes;
pub mod script;
pub mod template;

mod error;
pub use address::{Address, AddressKind, Network};
pub use error::ScriptError;
pub use instruction::Instruction;
pub use script::Script;
pub use template::{PubKeySign, ScriptTemplate, ScriptVersion};
