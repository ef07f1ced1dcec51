//! The script execution engine.

use tracing::trace;

use super::config::Config;
use super::error::{InterpreterError, InterpreterErrorCode};
use super::opcode::lookup;
use super::stack::{as_bool, Stack};
use crate::instruction::{disassemble, parse_instructions, Instruction};
use crate::opcodes::{is_conditional, OP_16};
use crate::Script;

/// Computes the signature hash for a given sighash type byte.
pub type SigHasher<'a> = Box<dyn Fn(u32) -> Result<[u8; 32], InterpreterError> + 'a>;

/// Checks a DER signature (without sighash byte) over a hash against a
/// serialized public key.
pub type SigVerifier<'a> =
    Box<dyn Fn(&[u8; 32], &[u8], &[u8]) -> Result<(), InterpreterError> + 'a>;

/// State of one IF/NOTIF level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    True,
    False,
    /// Opened inside a branch that is not executing.
    Skip,
}

/// One executed instruction, recorded when tracing is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceStep {
    pub step: usize,
    pub opcode: String,
    /// Data stack after the instruction ran.
    pub stack: String,
    /// Disassembly of what is left of the program.
    pub remaining: String,
}

/// A stack machine evaluating one script chain.
///
/// The engine owns its stacks. Signature checks call back into the
/// transaction through the hasher and verifier closures.
pub struct Engine<'a> {
    pub(super) dstack: Stack,
    pub(super) cond_stack: Vec<Condition>,
    pub(super) num_ops: usize,
    pub(super) cfg: Config,
    program: Vec<Instruction>,
    pc: usize,
    step_count: usize,
    hasher: Option<SigHasher<'a>>,
    verifier: Option<SigVerifier<'a>>,
    trace: Option<Vec<TraceStep>>,
}

impl Default for Engine<'_> {
    fn default() -> Self {
        Engine::new()
    }
}

impl<'a> Engine<'a> {
    pub fn new() -> Self {
        Engine::with_config(Config::default())
    }

    pub fn with_config(cfg: Config) -> Self {
        Engine {
            dstack: Stack::new(cfg.max_script_number_length),
            cond_stack: Vec::new(),
            num_ops: 0,
            cfg,
            program: Vec::new(),
            pc: 0,
            step_count: 0,
            hasher: None,
            verifier: None,
            trace: None,
        }
    }

    /// Install the signature hash callback used by CHECKSIG and CHECKMULTISIG.
    pub fn set_hasher<F>(&mut self, hasher: F)
    where
        F: Fn(u32) -> Result<[u8; 32], InterpreterError> + 'a,
    {
        self.hasher = Some(Box::new(hasher));
    }

    /// Install the signature verification callback.
    pub fn set_verifier<F>(&mut self, verifier: F)
    where
        F: Fn(&[u8; 32], &[u8], &[u8]) -> Result<(), InterpreterError> + 'a,
    {
        self.verifier = Some(Box::new(verifier));
    }

    /// Start recording a [`TraceStep`] for every executed instruction.
    pub fn enable_trace(&mut self) {
        self.trace.get_or_insert_with(Vec::new);
    }

    pub fn trace(&self) -> &[TraceStep] {
        self.trace.as_deref().unwrap_or(&[])
    }

    pub fn stack(&self) -> &Stack {
        &self.dstack
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Clear program and stacks. Callbacks, limits and the trace are kept.
    pub fn reset(&mut self) {
        self.dstack.clear();
        self.cond_stack.clear();
        self.program.clear();
        self.pc = 0;
        self.num_ops = 0;
    }

    /// Whether the innermost conditional branch is executing.
    pub fn is_branch_executing(&self) -> bool {
        matches!(self.cond_stack.last(), None | Some(Condition::True))
    }

    /// Run `script` to completion without P2SH chaining or a final truth check.
    pub fn execute(&mut self, script: &Script) -> Result<(), InterpreterError> {
        self.check_script_size(script)?;
        let program = parse_instructions(script.to_bytes())?;
        self.run(program, false)
    }

    /// Verify `unlocking` against `locking`.
    ///
    /// The unlocking script is run alone first and its stack kept aside.
    /// Then the concatenation is run and must leave a true top item. If the
    /// locking script is pay-to-script-hash, or more than one item remains,
    /// the saved stack's top item is taken as a redeem script and run on the
    /// rest of that stack.
    ///
    /// A pay-to-script-hash locking script always evaluates its redeem
    /// script, even when the combined run leaves a single item, as BIP16
    /// requires. Depth alone only triggers it for other locking scripts.
    pub fn verify(&mut self, unlocking: &Script, locking: &Script) -> Result<(), InterpreterError> {
        self.check_script_size(unlocking)?;
        self.check_script_size(locking)?;

        self.reset();
        self.run(parse_instructions(unlocking.to_bytes())?, false)?;
        let snapshot = self.dstack.items().to_vec();

        self.reset();
        let mut program = parse_instructions(unlocking.to_bytes())?;
        program.extend(parse_instructions(locking.to_bytes())?);
        self.run(program, true)?;

        let p2sh = locking.is_p2sh();
        if !p2sh && self.dstack.depth() <= 1 {
            return Ok(());
        }
        if p2sh && !unlocking.is_push_only() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::NotPushOnly,
                "pay to script hash unlocking script is not push only",
            ));
        }

        self.reset();
        self.dstack.set_items(snapshot);
        let redeem = Script::from_bytes(&self.dstack.pop()?);
        trace!(redeem = %redeem, "evaluating redeem script");
        self.check_script_size(&redeem)?;
        self.run(parse_instructions(redeem.to_bytes())?, true)
    }

    /// Execute the next instruction.
    ///
    /// # Returns
    /// `true` once the program is exhausted.
    pub fn step(&mut self) -> Result<bool, InterpreterError> {
        let Some(ins) = self.program.get(self.pc).cloned() else {
            return Ok(true);
        };
        self.pc += 1;
        let opcode = lookup(ins.opcode);

        if ins.opcode > OP_16 {
            self.num_ops += 1;
            self.check_op_count()?;
        }

        let data_len = ins.data().len();
        if data_len > self.cfg.max_script_element_size {
            return Err(InterpreterError::new(
                InterpreterErrorCode::ElementTooBig,
                format!(
                    "element size {} exceeds max allowed size {}",
                    data_len, self.cfg.max_script_element_size
                ),
            ));
        }

        if self.is_branch_executing() || is_conditional(ins.opcode) {
            (opcode.exec)(self, &ins)?;

            self.step_count += 1;
            trace!(step = self.step_count, opcode = opcode.name(), stack = %self.dstack);
            if let Some(steps) = self.trace.as_mut() {
                steps.push(TraceStep {
                    step: self.step_count,
                    opcode: opcode.name().to_string(),
                    stack: self.dstack.to_string(),
                    remaining: disassemble(&self.program[self.pc..]),
                });
            }
        }

        if self.dstack.depth() > self.cfg.max_stack_size {
            return Err(InterpreterError::new(
                InterpreterErrorCode::StackOverflow,
                format!(
                    "combined stack size {} > max allowed {}",
                    self.dstack.depth(),
                    self.cfg.max_stack_size
                ),
            ));
        }

        Ok(self.pc >= self.program.len())
    }

    /// Check a signature with the sighash byte appended against a public key.
    ///
    /// An empty signature or a verifier rejection is `false`. A missing
    /// callback or a hasher failure is an error.
    pub(super) fn check_signature(&self, sig: &[u8], pub_key: &[u8]) -> Result<bool, InterpreterError> {
        let hasher = self.hasher.as_ref().ok_or_else(|| {
            InterpreterError::new(InterpreterErrorCode::MissingHasher, "no signature hasher configured")
        })?;
        let verifier = self.verifier.as_ref().ok_or_else(|| {
            InterpreterError::new(
                InterpreterErrorCode::MissingVerifier,
                "no signature verifier configured",
            )
        })?;

        let Some((&hash_type, der)) = sig.split_last() else {
            return Ok(false);
        };
        let hash = hasher(hash_type as u32)?;
        Ok(verifier(&hash, der, pub_key).is_ok())
    }

    pub(super) fn check_op_count(&self) -> Result<(), InterpreterError> {
        if self.num_ops > self.cfg.max_ops {
            return Err(InterpreterError::new(
                InterpreterErrorCode::TooManyOperations,
                format!("exceeded max operation limit of {}", self.cfg.max_ops),
            ));
        }
        Ok(())
    }

    fn check_script_size(&self, script: &Script) -> Result<(), InterpreterError> {
        if script.len() > self.cfg.max_script_size {
            return Err(InterpreterError::new(
                InterpreterErrorCode::ScriptTooBig,
                format!(
                    "script size {} is larger than max allowed size {}",
                    script.len(),
                    self.cfg.max_script_size
                ),
            ));
        }
        Ok(())
    }

    fn run(&mut self, program: Vec<Instruction>, final_script: bool) -> Result<(), InterpreterError> {
        self.program = program;
        self.pc = 0;
        self.num_ops = 0;

        while !self.step()? {}

        if !self.cond_stack.is_empty() {
            return Err(InterpreterError::new(
                InterpreterErrorCode::UnbalancedConditional,
                "end of script reached in conditional execution",
            ));
        }

        if final_script {
            let top = self.dstack.peek(0).map_err(|_| {
                InterpreterError::new(
                    InterpreterErrorCode::EmptyStack,
                    "stack empty at end of script execution",
                )
            })?;
            if !as_bool(top) {
                return Err(InterpreterError::new(
                    InterpreterErrorCode::EvalFalse,
                    "false stack entry at end of script execution",
                ));
            }
        }
        Ok(())
    }
}
