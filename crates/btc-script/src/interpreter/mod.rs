//! Bitcoin script interpreter.
//!
//! Executes locking and unlocking scripts to verify transaction inputs. The
//! machine covers the opcodes used by standard pay-to-pubkey-hash,
//! pay-to-script-hash multisig and witness v0 spends. All other opcodes are
//! known to the catalog, so they parse and disassemble, but executing them
//! fails with [`InterpreterErrorCode::UnsupportedOpcode`].
//!
//! # Architecture
//!
//! The interpreter does not depend on the transaction crate. Callers install
//! a signature hasher and a signature verifier closure on the [`Engine`]
//! before running any script that contains a CHECKSIG family opcode.
//!
//! # Example
//!
//! ```ignore
//! use btc_script::interpreter::Engine;
//!
//! let mut engine = Engine::new();
//! engine.set_hasher(|hash_type| tx.signature_hash(idx, hash_type));
//! engine.set_verifier(|hash, der, pub_key| check(hash, der, pub_key));
//! engine.verify(&unlocking_script, &locking_script)?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod opcode;
pub mod scriptnum;
pub mod stack;

mod ops_arithmetic;
mod ops_crypto;
mod ops_data;
mod ops_flow;
mod ops_stack;

pub use config::Config;
pub use engine::{Condition, Engine, SigHasher, SigVerifier, TraceStep};
pub use error::{InterpreterError, InterpreterErrorCode};
pub use opcode::{lookup, Opcode, OperandLength};
pub use scriptnum::ScriptNum;
pub use stack::Stack;
