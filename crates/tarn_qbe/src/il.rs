//! The IL object model and its builders.
//!
//! A small QBE-shaped intermediate language: definitions are functions and
//! data items; functions hold basic blocks of instructions over typed
//! temporaries, globals, and constants.

use indexmap::IndexMap;
use std::fmt;

/// An IL type: the QBE base types plus void for valueless positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IlType {
    Void,
    /// 32-bit word.
    Word,
    /// 64-bit long; also the type of pointers and globals.
    Long,
    Single,
    Double,
}

impl IlType {
    pub fn letter(self) -> &'static str {
        match self {
            IlType::Void => "",
            IlType::Word => "w",
            IlType::Long => "l",
            IlType::Single => "s",
            IlType::Double => "d",
        }
    }
}

impl fmt::Display for IlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// Definition linkage bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Linkage {
    pub export: bool,
    pub thread: bool,
}

/// A lowered module: an ordered list of definitions.
#[derive(Debug, Default)]
pub struct IlModule {
    pub definitions: Vec<Def>,
}

/// A top-level definition.
#[derive(Debug)]
pub enum Def {
    Function(Function),
    Data(Data),
}

#[derive(Debug)]
pub struct Function {
    pub linkage: Linkage,
    pub return_type: IlType,
    pub name: String,
    pub params: Vec<Param>,
    pub blocks: Vec<Block>,
}

#[derive(Debug)]
pub struct Param {
    pub ty: IlType,
    pub temp: Temp,
}

/// A typed temporary, printed as `%name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Temp {
    pub name: String,
    pub ty: IlType,
}

#[derive(Debug)]
pub struct Data {
    pub linkage: Linkage,
    pub name: String,
    pub items: Vec<DataItem>,
}

#[derive(Debug)]
pub enum DataItem {
    Str(Vec<u8>),
    Byte(u8),
}

#[derive(Debug)]
pub struct Block {
    pub name: String,
    pub instructions: Vec<Inst>,
}

/// An instruction.
#[derive(Debug)]
pub enum Inst {
    Ret(Option<IlValue>),
    Call {
        out: Option<Temp>,
        ty: IlType,
        base: IlValue,
        args: Vec<IlValue>,
    },
    Bin {
        op: BinOp,
        out: Temp,
        ty: IlType,
        a: IlValue,
        b: IlValue,
    },
    Jmp {
        target: String,
    },
    Jnz {
        cond: IlValue,
        then_block: String,
        else_block: String,
    },
}

impl Inst {
    /// True for instructions that end a block.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Inst::Ret(_) | Inst::Jmp { .. } | Inst::Jnz { .. })
    }
}

/// Three-address operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    /// Signed less-than.
    Slt,
    /// Unsigned less-than.
    Ult,
}

impl BinOp {
    pub fn name(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Slt => "csltw",
            BinOp::Ult => "cultw",
        }
    }
}

/// An operand.
#[derive(Clone, Debug)]
pub enum IlValue {
    Temp(Temp),
    Global { name: String, ty: IlType },
    Const(i64),
}

impl IlValue {
    pub fn ty(&self) -> IlType {
        match self {
            IlValue::Temp(t) => t.ty,
            IlValue::Global { ty, .. } => *ty,
            IlValue::Const(_) => IlType::Long,
        }
    }
}

/// Accumulates definitions and deduplicates string literal data per
/// module.
#[derive(Default)]
pub struct ModuleBuilder {
    strings: IndexMap<Vec<u8>, String>,
    definitions: Vec<Def>,
}

impl ModuleBuilder {
    /// Interns a string literal, emitting its data definition on first
    /// use, and returns the global that refers to it.
    pub fn string_literal(&mut self, bytes: &[u8]) -> IlValue {
        if let Some(name) = self.strings.get(bytes) {
            return IlValue::Global {
                name: name.clone(),
                ty: IlType::Long,
            };
        }
        let name = format!("str{}", self.strings.len());
        self.strings.insert(bytes.to_vec(), name.clone());
        self.definitions.push(Def::Data(Data {
            linkage: Linkage::default(),
            name: name.clone(),
            items: vec![DataItem::Str(bytes.to_vec()), DataItem::Byte(0)],
        }));
        IlValue::Global {
            name,
            ty: IlType::Long,
        }
    }

    pub fn add(&mut self, def: Def) {
        self.definitions.push(def);
    }

    pub fn finish(self) -> IlModule {
        IlModule {
            definitions: self.definitions,
        }
    }
}

/// Builds one function: owns the temporary and label counters.
pub struct FunctionBuilder {
    temporaries: u32,
    labels: u32,
    linkage: Linkage,
    return_type: IlType,
    name: String,
    params: Vec<Param>,
    blocks: Vec<Block>,
}

impl FunctionBuilder {
    pub fn new(name: impl Into<String>, linkage: Linkage) -> Self {
        Self {
            temporaries: 0,
            labels: 0,
            linkage,
            return_type: IlType::Void,
            name: name.into(),
            params: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn returns(&mut self, ty: IlType) {
        self.return_type = ty;
    }

    pub fn param(&mut self, name: impl Into<String>, ty: IlType) -> Temp {
        let temp = Temp {
            name: name.into(),
            ty,
        };
        self.params.push(Param {
            ty,
            temp: temp.clone(),
        });
        temp
    }

    pub fn temporary(&mut self, ty: IlType) -> Temp {
        let temp = Temp {
            name: format!("t{}", self.temporaries),
            ty,
        };
        self.temporaries += 1;
        temp
    }

    /// A fresh block label, `<prefix>.<n>`.
    pub fn fresh_label(&mut self, prefix: &str) -> String {
        let label = format!("{prefix}.{}", self.labels);
        self.labels += 1;
        label
    }

    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    pub fn finish(self) -> Function {
        Function {
            linkage: self.linkage,
            return_type: self.return_type,
            name: self.name,
            params: self.params,
            blocks: self.blocks,
        }
    }
}

/// Builds one basic block.
pub struct BlockBuilder {
    name: String,
    instructions: Vec<Inst>,
}

impl BlockBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, inst: Inst) {
        self.instructions.push(inst);
    }

    /// True once a terminator has been pushed.
    pub fn is_terminated(&self) -> bool {
        self.instructions
            .last()
            .is_some_and(Inst::is_terminator)
    }

    pub fn finish(self) -> Block {
        Block {
            name: self.name,
            instructions: self.instructions,
        }
    }
}
