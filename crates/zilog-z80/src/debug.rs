//! Debugger hooks.
//!
//! The CPU holds at most one observer per event kind. Event records are built
//! only when an observer is registered and are never retained by the core.

/// A jump, call, return or restart was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BranchEvent {
    /// Address of the branching instruction.
    pub address: u16,
    /// Disassembly, e.g. `jp nz,8000H`.
    pub mnemonic: String,
    /// Where execution continues: the target if taken, the next
    /// instruction otherwise.
    pub target: u16,
    /// False when a conditional branch fell through.
    pub taken: bool,
    /// Tact counter when the branch resolved.
    pub tacts: u64,
}

/// SP was assigned, incremented or decremented directly.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackPointerEvent {
    pub address: u16,
    pub mnemonic: String,
    pub old_sp: u16,
    pub new_sp: u16,
    pub tacts: u64,
}

/// Direction of a stack content transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackAccess {
    Push,
    Pop,
    /// `EX (SP),rr`: `content` is the word written, the old word went to rr.
    Exchange,
}

/// A word was pushed to, popped from or exchanged with the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackContentEvent {
    pub address: u16,
    pub mnemonic: String,
    pub access: StackAccess,
    /// SP before the instruction.
    pub sp: u16,
    /// The word transferred.
    pub content: u16,
    pub tacts: u64,
}

/// Receives branch events.
pub trait BranchObserver {
    fn on_branch(&mut self, event: &BranchEvent);
}

/// Receives stack pointer and stack content events.
pub trait StackObserver {
    fn on_stack_pointer(&mut self, event: &StackPointerEvent);

    fn on_stack_content(&mut self, event: &StackContentEvent);
}

/// Collects every event it sees. Handy for tests and trace dumps.
#[derive(Debug, Default)]
pub struct EventLog {
    pub branches: Vec<BranchEvent>,
    pub stack_pointer: Vec<StackPointerEvent>,
    pub stack_content: Vec<StackContentEvent>,
}

impl BranchObserver for EventLog {
    fn on_branch(&mut self, event: &BranchEvent) {
        self.branches.push(event.clone());
    }
}

impl StackObserver for EventLog {
    fn on_stack_pointer(&mut self, event: &StackPointerEvent) {
        self.stack_pointer.push(event.clone());
    }

    fn on_stack_content(&mut self, event: &StackContentEvent) {
        self.stack_content.push(event.clone());
    }
}

/// Shared handle so a host can keep reading a log the CPU is writing to.
impl<T: BranchObserver> BranchObserver for std::rc::Rc<std::cell::RefCell<T>> {
    fn on_branch(&mut self, event: &BranchEvent) {
        self.borrow_mut().on_branch(event);
    }
}

impl<T: StackObserver> StackObserver for std::rc::Rc<std::cell::RefCell<T>> {
    fn on_stack_pointer(&mut self, event: &StackPointerEvent) {
        self.borrow_mut().on_stack_pointer(event);
    }

    fn on_stack_content(&mut self, event: &StackContentEvent) {
        self.borrow_mut().on_stack_content(event);
    }
}
