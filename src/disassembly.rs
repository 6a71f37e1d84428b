use std::collections::HashMap;

use crate::snapshot::Snapshot;

/// One instruction (or data directive) of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub address: u16,
    /// The address as written in the source, e.g. `$8000` or `32768`.
    pub addr_str: String,
    pub label: Option<String>,
    /// Address this instruction refers to (jump, call or load target).
    pub reference: Option<u16>,
}

impl Instruction {
    pub fn new(address: u16) -> Self {
        Self {
            address,
            addr_str: address.to_string(),
            label: None,
            reference: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_owned());
        self
    }

    pub fn with_reference(mut self, address: u16) -> Self {
        self.reference = Some(address);
        self
    }
}

/// The kind of a documentation entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::EnumString, strum_macros::Display)]
pub enum EntryKind {
    #[strum(serialize = "c")]
    Code,
    #[strum(serialize = "b")]
    Data,
    #[strum(serialize = "t")]
    Text,
    #[strum(serialize = "u")]
    Unused,
    #[strum(serialize = "g")]
    GameStatus,
}

/// A routine or data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub address: u16,
    pub kind: EntryKind,
    pub description: Vec<String>,
    pub instructions: Vec<Instruction>,
}

impl Entry {
    /// An entry holding a single instruction at its own address.
    pub fn new(address: u16, kind: EntryKind) -> Self {
        Self {
            address,
            kind,
            description: vec![],
            instructions: vec![Instruction::new(address)],
        }
    }

    pub fn with_description(mut self, paragraph: &str) -> Self {
        self.description.push(paragraph.to_owned());
        self
    }

    pub fn with_instructions(mut self, instructions: Vec<Instruction>) -> Self {
        self.instructions = instructions;
        self
    }

    pub fn contains(&self, address: u16) -> bool {
        self.instructions.iter().any(|i| i.address == address)
    }

    fn instruction(&self, address: u16) -> Option<&Instruction> {
        self.instructions.iter().find(|i| i.address == address)
    }
}

/// The annotated program the macros refer to.
pub trait Disassembly {
    /// The memory snapshot the disassembly was built from.
    fn snapshot(&self) -> &Snapshot;

    /// The entry that starts at `address`.
    fn entry(&self, address: u16) -> Option<&Entry>;

    /// The entry containing an instruction at `address`, in this disassembly
    /// or in the one identified by `code_id`.
    fn container(&self, address: u16, code_id: Option<&str>) -> Option<&Entry>;

    /// The label of the instruction at `address`.
    fn asm_label(&self, address: u16) -> Option<&str>;

    /// The address string of the instruction at `address`.
    fn instruction_addr_str(&self, address: u16, code_id: Option<&str>) -> Option<&str>;

    /// Addresses of the entries with instructions that refer to `address`,
    /// in ascending order.
    fn entry_point_refs(&self, address: u16) -> Vec<u16>;

    /// Addresses of the other entries that refer to any instruction in the
    /// entry at `address`, in ascending order.
    fn referrers(&self, address: u16) -> Vec<u16>;
}

/// An in-memory disassembly: a snapshot, its entries and any other
/// disassemblies they link to.
#[derive(Debug, Default)]
pub struct EntryMap {
    snapshot: Snapshot,
    entries: Vec<Entry>,
    others: HashMap<String, EntryMap>,
}

impl EntryMap {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            entries: vec![],
            others: HashMap::new(),
        }
    }

    /// Add an entry, keeping entries in address order.
    pub fn add_entry(&mut self, entry: Entry) {
        let ix = self.entries.partition_point(|e| e.address < entry.address);
        self.entries.insert(ix, entry);
    }

    pub fn add_other(&mut self, code_id: &str, other: EntryMap) {
        self.others.insert(code_id.to_owned(), other);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    fn code(&self, code_id: Option<&str>) -> Option<&EntryMap> {
        match code_id {
            None => Some(self),
            Some(id) => self.others.get(id),
        }
    }
}

impl Disassembly for EntryMap {
    fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn entry(&self, address: u16) -> Option<&Entry> {
        self.entries.iter().find(|e| e.address == address)
    }

    #[tracing::instrument(skip(self))]
    fn container(&self, address: u16, code_id: Option<&str>) -> Option<&Entry> {
        self.code(code_id)?
            .entries
            .iter()
            .find(|e| e.contains(address))
    }

    fn asm_label(&self, address: u16) -> Option<&str> {
        self.entries
            .iter()
            .find_map(|e| e.instruction(address))
            .and_then(|i| i.label.as_deref())
    }

    fn instruction_addr_str(&self, address: u16, code_id: Option<&str>) -> Option<&str> {
        self.code(code_id)?
            .entries
            .iter()
            .find_map(|e| e.instruction(address))
            .map(|i| i.addr_str.as_str())
    }

    fn entry_point_refs(&self, address: u16) -> Vec<u16> {
        self.entries
            .iter()
            .filter(|e| e.instructions.iter().any(|i| i.reference == Some(address)))
            .map(|e| e.address)
            .collect()
    }

    fn referrers(&self, address: u16) -> Vec<u16> {
        let Some(entry) = self.entry(address) else {
            return vec![];
        };
        self.entries
            .iter()
            .filter(|e| e.address != address)
            .filter(|e| {
                e.instructions
                    .iter()
                    .filter_map(|i| i.reference)
                    .any(|r| entry.contains(r))
            })
            .map(|e| e.address)
            .collect()
    }
}
