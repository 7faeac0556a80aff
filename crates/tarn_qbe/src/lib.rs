//! QBE-style IL backend for the Tarn compiler.
//!
//! Takes a checked module plus its side tables, orders the module-level
//! bindings by use, lowers them to an SSA-style IL, and renders the result
//! as text.

mod error;
mod il;
mod lower;
mod order;
mod write;

pub use error::TranslateError;
pub use il::{
    BinOp, Block, BlockBuilder, Data, DataItem, Def, Function, FunctionBuilder, IlModule, IlType,
    IlValue, Inst, Linkage, ModuleBuilder, Param, Temp,
};
pub use lower::translate;
pub use order::declaration_order;
pub use write::write_module;
